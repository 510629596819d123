use crate::protocol::ClientId;

/// Clients currently looking for a partner, oldest first.
///
/// A client appears at most once. Order only matters as the tie-break when
/// several candidates score equally.
#[derive(Debug, Default, Clone)]
pub struct WaitingPool {
    queue: Vec<ClientId>,
}

impl WaitingPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a client. Returns `false` if it was already waiting.
    pub fn enqueue(&mut self, client_id: ClientId) -> bool {
        if self.contains(&client_id) {
            return false;
        }
        self.queue.push(client_id);
        true
    }

    /// Remove a client wherever it sits. Returns `false` if it was absent.
    pub fn remove(&mut self, client_id: &ClientId) -> bool {
        match self.queue.iter().position(|waiting| waiting == client_id) {
            Some(index) => {
                self.queue.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, client_id: &ClientId) -> bool {
        self.queue.contains(client_id)
    }

    /// Waiting clients in enqueue order.
    pub fn iter(&self) -> impl Iterator<Item = &ClientId> {
        self.queue.iter()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

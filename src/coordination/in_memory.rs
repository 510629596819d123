use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, RwLock};

use super::MessageCoordinator;
use crate::metrics::ServerMetrics;
use crate::protocol::{ClientId, ServerMessage};

/// Delivers messages through the bounded per-connection queues of this process.
pub struct InMemoryMessageCoordinator {
    local_clients: RwLock<HashMap<ClientId, mpsc::Sender<Arc<ServerMessage>>>>,
    metrics: Arc<ServerMetrics>,
}

impl InMemoryMessageCoordinator {
    pub fn new(metrics: Arc<ServerMetrics>) -> Self {
        Self {
            local_clients: RwLock::new(HashMap::new()),
            metrics,
        }
    }

    fn enqueue(
        &self,
        client_id: &ClientId,
        sender: &mpsc::Sender<Arc<ServerMessage>>,
        message: Arc<ServerMessage>,
    ) {
        match sender.try_send(message) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.metrics.increment_messages_dropped();
                tracing::warn!(%client_id, "Outbound queue full, message dropped");
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(%client_id, "Outbound queue closed, message dropped");
            }
        }
    }
}

#[async_trait::async_trait]
impl MessageCoordinator for InMemoryMessageCoordinator {
    async fn send_to_client(
        &self,
        client_id: &ClientId,
        message: Arc<ServerMessage>,
    ) -> anyhow::Result<()> {
        let clients = self.local_clients.read().await;
        if let Some(sender) = clients.get(client_id) {
            self.enqueue(client_id, sender, message);
        } else {
            tracing::debug!(%client_id, ?message, "Client not connected, message not sent");
        }
        Ok(())
    }

    async fn broadcast_all(&self, message: Arc<ServerMessage>) -> anyhow::Result<()> {
        let clients = self.local_clients.read().await;
        for (client_id, sender) in clients.iter() {
            self.enqueue(client_id, sender, Arc::clone(&message));
        }
        Ok(())
    }

    async fn register_local_client(
        &self,
        client_id: ClientId,
        sender: mpsc::Sender<Arc<ServerMessage>>,
    ) -> anyhow::Result<()> {
        self.local_clients.write().await.insert(client_id, sender);
        Ok(())
    }

    async fn unregister_local_client(&self, client_id: &ClientId) -> anyhow::Result<()> {
        self.local_clients.write().await.remove(client_id);
        Ok(())
    }

    async fn online_count(&self) -> usize {
        self.local_clients.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn coordinator() -> (InMemoryMessageCoordinator, Arc<ServerMetrics>) {
        let metrics = Arc::new(ServerMetrics::new());
        (InMemoryMessageCoordinator::new(metrics.clone()), metrics)
    }

    #[tokio::test]
    async fn send_reaches_only_the_addressed_client() {
        let (coordinator, _) = coordinator();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let (tx_a, mut rx_a) = mpsc::channel(4);
        let (tx_b, mut rx_b) = mpsc::channel(4);
        coordinator.register_local_client(a, tx_a).await.unwrap();
        coordinator.register_local_client(b, tx_b).await.unwrap();

        coordinator
            .send_to_client(&a, Arc::new(ServerMessage::Waiting))
            .await
            .unwrap();

        assert_eq!(*rx_a.try_recv().unwrap(), ServerMessage::Waiting);
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn unknown_destination_is_silently_dropped() {
        let (coordinator, metrics) = coordinator();
        coordinator
            .send_to_client(&Uuid::new_v4(), Arc::new(ServerMessage::Waiting))
            .await
            .expect("unknown clients are not an error");
        assert_eq!(metrics.snapshot().delivery.messages_dropped, 0);
    }

    #[tokio::test]
    async fn broadcast_and_online_count_track_registrations() {
        let (coordinator, _) = coordinator();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let (tx_a, mut rx_a) = mpsc::channel(4);
        let (tx_b, mut rx_b) = mpsc::channel(4);
        coordinator.register_local_client(a, tx_a).await.unwrap();
        coordinator.register_local_client(b, tx_b).await.unwrap();
        assert_eq!(coordinator.online_count().await, 2);

        coordinator
            .broadcast_all(Arc::new(ServerMessage::OnlineCount { count: 2 }))
            .await
            .unwrap();
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_ok());

        coordinator.unregister_local_client(&a).await.unwrap();
        assert_eq!(coordinator.online_count().await, 1);
    }

    #[tokio::test]
    async fn full_queue_counts_a_dropped_message() {
        let (coordinator, metrics) = coordinator();
        let a = Uuid::new_v4();
        let (tx, _rx) = mpsc::channel(1);
        coordinator.register_local_client(a, tx).await.unwrap();

        for _ in 0..3 {
            coordinator
                .send_to_client(&a, Arc::new(ServerMessage::Waiting))
                .await
                .unwrap();
        }

        assert_eq!(metrics.snapshot().delivery.messages_dropped, 2);
    }
}

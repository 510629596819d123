use std::collections::HashMap;

use crate::protocol::ClientId;

/// Symmetric partner map: if A maps to B then B maps to A.
///
/// Both directions are only ever inserted or removed together.
#[derive(Debug, Default, Clone)]
pub struct PairingRegistry {
    partners: HashMap<ClientId, ClientId>,
}

impl PairingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pair two unpaired, distinct clients. Returns `false` and changes
    /// nothing if either side already has a partner.
    pub fn pair(&mut self, a: ClientId, b: ClientId) -> bool {
        if a == b || self.partners.contains_key(&a) || self.partners.contains_key(&b) {
            return false;
        }
        self.partners.insert(a, b);
        self.partners.insert(b, a);
        true
    }

    /// Dissolve the pairing that contains `client_id`, returning the former partner.
    pub fn unpair(&mut self, client_id: &ClientId) -> Option<ClientId> {
        let partner_id = self.partners.remove(client_id)?;
        self.partners.remove(&partner_id);
        Some(partner_id)
    }

    pub fn partner_of(&self, client_id: &ClientId) -> Option<ClientId> {
        self.partners.get(client_id).copied()
    }

    pub fn is_paired(&self, client_id: &ClientId) -> bool {
        self.partners.contains_key(client_id)
    }

    /// Number of active pairings (each counted once).
    pub fn pair_count(&self) -> usize {
        self.partners.len() / 2
    }

    /// Every (client, partner) entry; each pairing shows up in both directions.
    pub fn entries(&self) -> impl Iterator<Item = (&ClientId, &ClientId)> {
        self.partners.iter()
    }
}

use std::collections::HashMap;

use serde_json::Value;

use crate::protocol::{ClientId, InterestSet, ServerMessage};

use super::matchmaker::select_partner;
use super::pool::WaitingPool;
use super::registry::PairingRegistry;
use super::report::ReportRecord;

/// A message produced by the session core, addressed to one client.
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub to: ClientId,
    pub message: ServerMessage,
}

impl Outbound {
    pub fn new(to: ClientId, message: ServerMessage) -> Self {
        Self { to, message }
    }
}

/// Per-client state owned by the session manager.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientRecord {
    pub interests: InterestSet,
}

/// What a join request resulted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Paired with a waiting client; the requester is the initiator.
    Matched { partner_id: ClientId, shared: usize },
    /// Added to the waiting pool.
    Waiting,
    /// Was already waiting and nobody else is; nothing is re-sent.
    StillWaiting,
    /// Already in a session; only the interests were replaced.
    AlreadyPaired { partner_id: ClientId },
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinResult {
    pub outcome: JoinOutcome,
    pub messages: Vec<Outbound>,
}

/// Result of tearing a session down.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionEnd {
    /// Former partner, if a session existed.
    pub partner_id: Option<ClientId>,
    pub messages: Vec<Outbound>,
}

impl SessionEnd {
    pub fn ended(&self) -> bool {
        self.partner_id.is_some()
    }
}

/// Owner of the waiting pool, the pairing registry, and client records.
///
/// Every method runs to completion against `&mut self`; callers serialize
/// access (the server keeps the manager behind one mutex), which makes match
/// formation atomic with respect to concurrent joins. A client is never both
/// waiting and paired.
#[derive(Debug, Default)]
pub struct SessionManager {
    clients: HashMap<ClientId, ClientRecord>,
    pool: WaitingPool,
    pairings: PairingRegistry,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the client's interests and either pair it with the best
    /// waiting candidate or put it in the waiting pool.
    pub fn join(&mut self, client_id: ClientId, interests: InterestSet) -> JoinResult {
        self.clients.entry(client_id).or_default().interests = interests;

        if let Some(partner_id) = self.pairings.partner_of(&client_id) {
            return JoinResult {
                outcome: JoinOutcome::AlreadyPaired { partner_id },
                messages: Vec::new(),
            };
        }

        let clients = &self.clients;
        let no_interests = InterestSet::new();
        let requester_interests = clients
            .get(&client_id)
            .map_or(&no_interests, |record| &record.interests);
        let candidate = select_partner(&self.pool, &client_id, requester_interests, |id| {
            clients.get(id).map(|record| &record.interests)
        });

        let Some(candidate) = candidate else {
            let outcome = if self.pool.enqueue(client_id) {
                JoinOutcome::Waiting
            } else {
                JoinOutcome::StillWaiting
            };
            let messages = match outcome {
                JoinOutcome::Waiting => vec![Outbound::new(client_id, ServerMessage::Waiting)],
                _ => Vec::new(),
            };
            return JoinResult { outcome, messages };
        };

        let partner_id = candidate.client_id;
        self.pool.remove(&partner_id);
        self.pool.remove(&client_id);
        self.pairings.pair(client_id, partner_id);

        tracing::debug!(%client_id, %partner_id, shared = candidate.shared, "Pair formed");

        JoinResult {
            outcome: JoinOutcome::Matched {
                partner_id,
                shared: candidate.shared,
            },
            messages: vec![
                Outbound::new(
                    client_id,
                    ServerMessage::Matched {
                        partner_id,
                        is_initiator: true,
                    },
                ),
                Outbound::new(
                    partner_id,
                    ServerMessage::Matched {
                        partner_id: client_id,
                        is_initiator: false,
                    },
                ),
            ],
        }
    }

    /// Leave the waiting pool. Returns whether the client was waiting.
    pub fn cancel_wait(&mut self, client_id: &ClientId) -> bool {
        self.pool.remove(client_id)
    }

    /// End the current session (notifying the partner) and stop waiting.
    pub fn next(&mut self, client_id: &ClientId) -> SessionEnd {
        let end = self.end_session(client_id, true);
        self.cancel_wait(client_id);
        end
    }

    /// Forward a negotiation payload to an explicit destination.
    ///
    /// The destination is not checked against the pairing map so that
    /// handshakes may begin before both sides have processed `matched`.
    pub fn relay_signal(&self, from: ClientId, to: ClientId, signal: Value) -> Outbound {
        Outbound::new(to, ServerMessage::Signal { from, signal })
    }

    /// Deliver chat to the sender's partner. `None` when unpaired.
    pub fn relay_chat_message(&self, from: &ClientId, message: Value) -> Option<Outbound> {
        self.pairings
            .partner_of(from)
            .map(|partner_id| Outbound::new(partner_id, ServerMessage::ChatMessage { message }))
    }

    /// Dissolve the client's pairing, optionally telling the partner.
    pub fn end_session(&mut self, client_id: &ClientId, notify_partner: bool) -> SessionEnd {
        let Some(partner_id) = self.pairings.unpair(client_id) else {
            return SessionEnd::default();
        };

        let messages = if notify_partner {
            vec![Outbound::new(partner_id, ServerMessage::PartnerDisconnected)]
        } else {
            Vec::new()
        };

        SessionEnd {
            partner_id: Some(partner_id),
            messages,
        }
    }

    /// Build the audit record for a report, then end the session.
    pub fn report_and_end(
        &mut self,
        client_id: &ClientId,
        reason: Option<String>,
    ) -> (ReportRecord, SessionEnd) {
        let report = ReportRecord {
            reporter: *client_id,
            reported: self.pairings.partner_of(client_id),
            reason,
            filed_at: chrono::Utc::now(),
        };
        (report, self.end_session(client_id, true))
    }

    /// The client's connection is gone: stop waiting, end any session, and
    /// forget its record.
    pub fn handle_disconnect(&mut self, client_id: &ClientId) -> SessionEnd {
        self.cancel_wait(client_id);
        let end = self.end_session(client_id, true);
        self.clients.remove(client_id);
        end
    }

    pub fn partner_of(&self, client_id: &ClientId) -> Option<ClientId> {
        self.pairings.partner_of(client_id)
    }

    pub fn is_waiting(&self, client_id: &ClientId) -> bool {
        self.pool.contains(client_id)
    }

    pub fn is_paired(&self, client_id: &ClientId) -> bool {
        self.pairings.is_paired(client_id)
    }

    pub fn interests_of(&self, client_id: &ClientId) -> Option<&InterestSet> {
        self.clients.get(client_id).map(|record| &record.interests)
    }

    /// Waiting clients in enqueue order.
    pub fn waiting_clients(&self) -> Vec<ClientId> {
        self.pool.iter().copied().collect()
    }

    pub fn waiting_count(&self) -> usize {
        self.pool.len()
    }

    pub fn pair_count(&self) -> usize {
        self.pairings.pair_count()
    }

    /// Every registry entry; each pairing appears once per direction.
    pub fn pairings(&self) -> Vec<(ClientId, ClientId)> {
        self.pairings
            .entries()
            .map(|(client, partner)| (*client, *partner))
            .collect()
    }
}

use super::MatchServer;
use crate::protocol::ClientId;
use serde_json::Value;

impl MatchServer {
    /// Forward a negotiation payload (offer, answer, candidate) to `to`.
    ///
    /// The destination does not have to be the sender's current partner; a
    /// missing or disconnected destination drops the payload.
    pub async fn handle_signal(&self, client_id: &ClientId, to: Option<ClientId>, signal: Value) {
        let Some(to) = to.filter(|to| self.is_connected(to)) else {
            self.metrics.increment_signals_dropped();
            tracing::debug!(%client_id, ?to, "Signal destination unknown, dropping");
            return;
        };

        let outbound = self.sessions.lock().await.relay_signal(*client_id, to, signal);
        self.deliver(vec![outbound]).await;
        self.metrics.increment_signals_relayed();
    }

    /// Forward chat to the sender's partner; dropped when unpaired.
    pub async fn handle_chat_message(&self, client_id: &ClientId, message: Value) {
        let sessions = self.sessions.lock().await;
        match sessions.relay_chat_message(client_id, message) {
            Some(outbound) => {
                self.deliver(vec![outbound]).await;
                self.metrics.increment_chat_messages_relayed();
            }
            None => {
                self.metrics.increment_chat_messages_dropped();
                tracing::debug!(%client_id, "Chat from unpaired client dropped");
            }
        }
    }
}

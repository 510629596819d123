use crate::protocol::{ClientId, ClientMessage, InterestSet};

use super::MatchServer;

impl MatchServer {
    /// Dispatch one decoded client event.
    pub async fn handle_client_message(&self, client_id: &ClientId, message: ClientMessage) {
        tracing::trace!(%client_id, event = message.event_name(), "Handling client event");

        match message {
            ClientMessage::Join { interests } => {
                self.handle_join(client_id, interests.into_iter().collect::<InterestSet>())
                    .await;
            }
            ClientMessage::Signal { to, signal } => {
                self.handle_signal(client_id, to, signal).await;
            }
            ClientMessage::ChatMessage { message } => {
                self.handle_chat_message(client_id, message).await;
            }
            ClientMessage::Next => {
                self.handle_next(client_id).await;
            }
            ClientMessage::Leave => {
                self.handle_leave(client_id).await;
            }
            ClientMessage::Report { reason } => {
                self.handle_report(client_id, reason).await;
            }
        }
    }
}

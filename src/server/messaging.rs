use super::MatchServer;
use crate::protocol::{ClientId, ErrorCode, ServerMessage};
use crate::session::Outbound;
use std::sync::Arc;

impl MatchServer {
    /// Enqueue session-core output for delivery, in order.
    pub(crate) async fn deliver(&self, messages: Vec<Outbound>) {
        for Outbound { to, message } in messages {
            if let Err(err) = self
                .message_coordinator
                .send_to_client(&to, Arc::new(message))
                .await
            {
                tracing::warn!(client_id = %to, %err, "Failed to enqueue message");
            }
        }
    }

    /// Tell every connected client how many clients are connected.
    pub async fn broadcast_online_count(&self) {
        let count = self.message_coordinator.online_count().await;
        tracing::debug!(count, "Broadcasting online count");
        if let Err(err) = self
            .message_coordinator
            .broadcast_all(Arc::new(ServerMessage::OnlineCount { count }))
            .await
        {
            tracing::warn!(%err, "Failed to broadcast online count");
        }
    }

    /// Send a transport-level error to a specific client.
    pub async fn send_error_to_client(
        &self,
        client_id: &ClientId,
        message: String,
        error_code: Option<ErrorCode>,
    ) -> anyhow::Result<()> {
        self.message_coordinator
            .send_to_client(
                client_id,
                Arc::new(ServerMessage::Error {
                    message,
                    error_code,
                }),
            )
            .await
    }
}

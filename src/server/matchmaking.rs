use super::MatchServer;
use crate::protocol::{ClientId, InterestSet};
use crate::session::JoinOutcome;

impl MatchServer {
    /// Match or enqueue the client. A join that reaches the session lock
    /// after the client was unregistered is ignored.
    pub async fn handle_join(&self, client_id: &ClientId, interests: InterestSet) {
        let mut sessions = self.sessions.lock().await;
        if !self.is_connected(client_id) {
            tracing::debug!(%client_id, "Join from departed client ignored");
            return;
        }
        self.metrics.increment_joins();
        let result = sessions.join(*client_id, interests);

        match result.outcome {
            JoinOutcome::Matched { partner_id, shared } => {
                self.metrics.increment_matches_formed();
                tracing::info!(%client_id, %partner_id, shared, "Clients matched");
            }
            JoinOutcome::Waiting => {
                tracing::debug!(
                    %client_id,
                    waiting = sessions.waiting_count(),
                    "Client waiting for a partner"
                );
            }
            JoinOutcome::StillWaiting => {
                tracing::debug!(%client_id, "Client re-joined while waiting");
            }
            JoinOutcome::AlreadyPaired { partner_id } => {
                tracing::debug!(%client_id, %partner_id, "Join ignored while paired");
            }
        }

        self.deliver(result.messages).await;
    }

    /// End the current session, if any, and stop waiting. The client is
    /// expected to send `join` again to look for someone new.
    pub async fn handle_next(&self, client_id: &ClientId) {
        let mut sessions = self.sessions.lock().await;
        let end = sessions.next(client_id);
        if let Some(partner_id) = end.partner_id {
            self.metrics.increment_sessions_ended();
            tracing::info!(%client_id, %partner_id, "Session skipped");
        }
        self.deliver(end.messages).await;
    }

    /// Stop waiting. A live session is left untouched.
    pub async fn handle_leave(&self, client_id: &ClientId) {
        let mut sessions = self.sessions.lock().await;
        if sessions.cancel_wait(client_id) {
            tracing::debug!(%client_id, "Client left the waiting pool");
        }
    }
}

use super::MatchServer;
use crate::protocol::ClientId;

impl MatchServer {
    /// Record a report against the current partner and end the session.
    /// A report with no partner is still recorded.
    pub async fn handle_report(&self, client_id: &ClientId, reason: Option<String>) {
        let mut sessions = self.sessions.lock().await;
        let (report, end) = sessions.report_and_end(client_id, reason);

        self.metrics.increment_reports_filed();
        self.report_sink.record(&report);

        if end.ended() {
            self.metrics.increment_sessions_ended();
        }
        self.deliver(end.messages).await;
    }
}

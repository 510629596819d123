use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::protocol::ClientId;

/// A report filed by one side of a session against its partner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRecord {
    pub reporter: ClientId,
    /// `None` when the reporter had no partner at the time of the report.
    pub reported: Option<ClientId>,
    pub reason: Option<String>,
    pub filed_at: DateTime<Utc>,
}

/// Destination for filed reports. Reports are kept for external audit only;
/// nothing in the server acts on them beyond ending the session.
pub trait ReportSink: Send + Sync {
    fn record(&self, report: &ReportRecord);
}

/// Writes reports to the structured log on the `blindcall::reports` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReportSink;

impl ReportSink for LogReportSink {
    fn record(&self, report: &ReportRecord) {
        tracing::warn!(
            target: "blindcall::reports",
            reporter = %report.reporter,
            reported = ?report.reported,
            reason = report.reason.as_deref().unwrap_or(""),
            filed_at = %report.filed_at.to_rfc3339(),
            "Report filed"
        );
    }
}

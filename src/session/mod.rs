//! Matchmaking and session state.
//!
//! Everything here is synchronous and transport-free: operations mutate a
//! [`SessionManager`] and hand back the messages that should be delivered.
//!
//! - [`pool`]: ordered waiting pool
//! - [`registry`]: symmetric pairing registry
//! - [`matchmaker`]: greedy shared-interest partner selection
//! - [`manager`]: the single owner of pool, registry, and client records
//! - [`report`]: audit records for reported sessions

pub mod manager;
pub mod matchmaker;
pub mod pool;
pub mod registry;
pub mod report;

pub use manager::{ClientRecord, JoinOutcome, JoinResult, Outbound, SessionEnd, SessionManager};
pub use matchmaker::{select_partner, Candidate};
pub use pool::WaitingPool;
pub use registry::PairingRegistry;
pub use report::{LogReportSink, ReportRecord, ReportSink};

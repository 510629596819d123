//! Default value functions for configuration fields.
//!
//! These back the `#[serde(default = ...)]` attributes across the config
//! sections so that partial documents always deserialize.

use super::logging::LogFormat;
use crate::protocol::{DEFAULT_MAX_INTERESTS, DEFAULT_MAX_INTEREST_LENGTH};

// =============================================================================
// Port & Root Config
// =============================================================================

pub const fn default_port() -> u16 {
    3000
}

// =============================================================================
// Server Defaults
// =============================================================================

/// Capacity of each connection's outbound message queue.
pub const fn default_outbound_queue_capacity() -> usize {
    64
}

pub fn default_region_id() -> String {
    "default".to_string()
}

// =============================================================================
// Matchmaking Defaults
// =============================================================================

pub const fn default_max_interests() -> usize {
    DEFAULT_MAX_INTERESTS
}

pub const fn default_max_interest_length() -> usize {
    DEFAULT_MAX_INTEREST_LENGTH
}

// =============================================================================
// Security Defaults
// =============================================================================

pub fn default_cors_origins() -> String {
    "*".to_string()
}

pub const fn default_require_auth() -> bool {
    false
}

pub const fn default_max_message_size() -> usize {
    65_536 // 64KB; SDP offers with many candidates stay well under this
}

pub const fn default_max_connections_per_ip() -> usize {
    16
}

// =============================================================================
// Logging Defaults
// =============================================================================

pub fn default_log_dir() -> String {
    "logs".to_string()
}

pub fn default_log_filename() -> String {
    "server.log".to_string()
}

pub fn default_rotation() -> String {
    "daily".to_string()
}

pub const fn default_enable_file_logging() -> bool {
    false
}

pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

//! Server behavior configuration types.

use super::defaults::{default_outbound_queue_capacity, default_region_id};
use serde::{Deserialize, Serialize};

/// Server configuration for connection handling.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// Bounded capacity of each connection's outbound queue; messages beyond
    /// it are dropped
    #[serde(default = "default_outbound_queue_capacity")]
    pub outbound_queue_capacity: usize,
    /// Identifier for the deployment region, attached to startup logs
    #[serde(default = "default_region_id")]
    pub region_id: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            outbound_queue_capacity: default_outbound_queue_capacity(),
            region_id: default_region_id(),
        }
    }
}

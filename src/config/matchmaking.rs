//! Matchmaking configuration types.

use super::defaults::{default_max_interest_length, default_max_interests};
use crate::protocol::InterestLimits;
use serde::{Deserialize, Serialize};

/// Bounds applied to interest lists when `join` frames are decoded.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MatchmakingConfig {
    /// Maximum number of distinct tags kept per join
    #[serde(default = "default_max_interests")]
    pub max_interests: usize,
    /// Tags longer than this (in characters) are skipped
    #[serde(default = "default_max_interest_length")]
    pub max_interest_length: usize,
}

impl MatchmakingConfig {
    pub fn interest_limits(&self) -> InterestLimits {
        InterestLimits {
            max_interests: self.max_interests,
            max_interest_length: self.max_interest_length,
        }
    }
}

impl Default for MatchmakingConfig {
    fn default() -> Self {
        Self {
            max_interests: default_max_interests(),
            max_interest_length: default_max_interest_length(),
        }
    }
}

//! Security configuration types.

use super::defaults::{
    default_cors_origins, default_max_connections_per_ip, default_max_message_size,
    default_require_auth,
};
use serde::{Deserialize, Deserializer, Serialize};

/// Security configuration.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SecurityConfig {
    /// Allowed CORS origins (comma-separated, or "*" for any). A JSON array
    /// of origins is also accepted and joined.
    #[serde(
        default = "default_cors_origins",
        deserialize_with = "deserialize_origin_list"
    )]
    pub cors_origins: String,
    /// Enable authentication for metrics endpoint
    #[serde(default = "default_require_auth")]
    pub require_metrics_auth: bool,
    /// Bearer token for metrics endpoint (if required)
    #[serde(default)]
    pub metrics_auth_token: Option<String>,
    /// Maximum WebSocket message size in bytes
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
    /// Maximum connections per IP address
    #[serde(default = "default_max_connections_per_ip")]
    pub max_connections_per_ip: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            cors_origins: default_cors_origins(),
            require_metrics_auth: default_require_auth(),
            metrics_auth_token: None,
            max_message_size: default_max_message_size(),
            max_connections_per_ip: default_max_connections_per_ip(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OriginList {
    Joined(String),
    Items(Vec<String>),
}

fn deserialize_origin_list<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match OriginList::deserialize(deserializer)? {
        OriginList::Joined(origins) => origins,
        OriginList::Items(items) => items.join(","),
    })
}

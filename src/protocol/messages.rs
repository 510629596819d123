use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error_codes::ErrorCode;
use super::types::ClientId;

/// Events sent from client to server.
///
/// Frames are decoded leniently by [`super::parsing::parse_client_message`];
/// the `Serialize` impl exists for clients and tests that build frames.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Look for a partner, preferring clients that share these interests
    Join { interests: Vec<String> },
    /// Opaque negotiation payload addressed to an explicit destination
    Signal {
        to: Option<ClientId>,
        signal: Value,
    },
    /// Chat text for the current partner
    ChatMessage { message: Value },
    /// End the current session
    Next,
    /// Stop waiting for a partner
    Leave,
    /// Report the current partner and end the session
    Report { reason: Option<String> },
}

impl ClientMessage {
    /// Wire name of the event, used in logs.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::Signal { .. } => "signal",
            Self::ChatMessage { .. } => "chat-message",
            Self::Next => "next",
            Self::Leave => "leave",
            Self::Report { .. } => "report",
        }
    }
}

/// Events sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// No partner available yet; the client sits in the waiting pool
    Waiting,
    /// A partner was found
    Matched {
        #[serde(rename = "partnerId")]
        partner_id: ClientId,
        /// Exactly one side of a pair starts the peer negotiation
        #[serde(rename = "isInitiator")]
        is_initiator: bool,
    },
    /// Negotiation payload relayed from another client
    Signal { from: ClientId, signal: Value },
    /// Chat text relayed from the partner
    ChatMessage { message: Value },
    /// The partner left, skipped, reported, or dropped
    PartnerDisconnected,
    /// Number of currently connected clients
    OnlineCount { count: usize },
    /// Transport-level rejection
    Error {
        message: String,
        #[serde(rename = "errorCode", skip_serializing_if = "Option::is_none")]
        error_code: Option<ErrorCode>,
    },
}

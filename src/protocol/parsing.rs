//! Lenient decoding of client frames.
//!
//! Clients are browsers speaking a loose event protocol, so a frame is only
//! rejected when it cannot be an event at all. Missing `data`, missing fields,
//! and fields of the wrong shape decode as absent or empty.

use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use super::messages::ClientMessage;
use super::types::InterestLimits;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("frame is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("frame is not an event envelope")]
    MalformedEnvelope,
    #[error("unknown event type `{0}`")]
    UnknownEvent(String),
}

/// Decode a text frame of the form `{"type": "<event>", "data": {...}}`.
pub fn parse_client_message(
    raw_text: &str,
    limits: &InterestLimits,
) -> Result<ClientMessage, ProtocolError> {
    let Value::Object(mut envelope) = serde_json::from_str::<Value>(raw_text)? else {
        return Err(ProtocolError::MalformedEnvelope);
    };

    let event = match envelope.remove("type") {
        Some(Value::String(event)) => event,
        _ => return Err(ProtocolError::MalformedEnvelope),
    };

    let mut data = match envelope.remove("data") {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };

    let message = match event.as_str() {
        "join" => ClientMessage::Join {
            interests: interests_from(data.get("interests"), limits),
        },
        "signal" => ClientMessage::Signal {
            to: data
                .get("to")
                .and_then(Value::as_str)
                .and_then(|raw| Uuid::parse_str(raw).ok()),
            signal: data.remove("signal").unwrap_or(Value::Null),
        },
        "chat-message" => ClientMessage::ChatMessage {
            message: data.remove("message").unwrap_or(Value::Null),
        },
        "next" => ClientMessage::Next,
        "leave" => ClientMessage::Leave,
        "report" => ClientMessage::Report {
            reason: match data.remove("reason") {
                None | Some(Value::Null) => None,
                Some(Value::String(reason)) => Some(reason),
                Some(other) => Some(other.to_string()),
            },
        },
        _ => return Err(ProtocolError::UnknownEvent(event)),
    };

    Ok(message)
}

/// Anything other than an array of strings counts as no interests. Over-long
/// tags are skipped and the list is capped after de-duplication.
fn interests_from(value: Option<&Value>, limits: &InterestLimits) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };

    let mut interests: Vec<String> = Vec::new();
    for tag in items.iter().filter_map(Value::as_str) {
        if interests.len() >= limits.max_interests {
            break;
        }
        if tag.chars().count() > limits.max_interest_length
            || interests.iter().any(|seen| seen == tag)
        {
            continue;
        }
        interests.push(tag.to_string());
    }
    interests
}

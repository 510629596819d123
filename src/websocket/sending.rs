use crate::protocol::{ClientId, ServerMessage};
use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::SinkExt;

pub(super) type WsSink = SplitSink<WebSocket, Message>;

const FALLBACK_ERROR_FRAME: &str = r#"{"type":"error","data":{"message":"Internal error","errorCode":"INTERNAL_ERROR"}}"#;

/// Serialize a message for the wire. Serialization failure degrades to a
/// generic error frame.
pub(super) fn encode_server_message(message: &ServerMessage) -> String {
    serde_json::to_string(message).unwrap_or_else(|err| {
        tracing::error!(error = %err, "Failed to serialize server message");
        FALLBACK_ERROR_FRAME.to_string()
    })
}

/// Write a frame directly, bypassing the outbound queue. Used before the
/// client is registered.
pub(super) async fn send_immediate_server_message(
    sender: &mut WsSink,
    message: &ServerMessage,
) -> Result<(), axum::Error> {
    sender
        .send(Message::Text(encode_server_message(message).into()))
        .await
}

pub(super) async fn send_text_message(
    sender: &mut WsSink,
    message: &ServerMessage,
    client_id: &ClientId,
) -> Result<(), ()> {
    if let Err(err) = send_immediate_server_message(sender, message).await {
        tracing::debug!(%client_id, error = %err, "Failed to send message, connection closed");
        return Err(());
    }
    Ok(())
}

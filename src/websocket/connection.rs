use crate::protocol::{parse_client_message, ErrorCode, ServerMessage};
use crate::server::{MatchServer, RegisterClientError};
use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

use super::sending::{send_immediate_server_message, send_text_message};

pub(super) async fn handle_socket(socket: WebSocket, server: Arc<MatchServer>, addr: SocketAddr) {
    let (mut sender, mut receiver) = socket.split();
    let queue_capacity = server.config().outbound_queue_capacity.max(1);
    let (tx, mut rx) = mpsc::channel::<Arc<ServerMessage>>(queue_capacity);

    let client_id = match server.register_client(tx, addr).await {
        Ok(client_id) => {
            tracing::info!(%client_id, client_addr = %addr, "WebSocket connection established");
            client_id
        }
        Err(err @ RegisterClientError::IpLimitExceeded { .. }) => {
            let error_message = ServerMessage::Error {
                message: err.to_string(),
                error_code: Some(ErrorCode::TooManyConnections),
            };
            if let Err(err) = send_immediate_server_message(&mut sender, &error_message).await {
                tracing::debug!(
                    client_addr = %addr,
                    error = %err,
                    "Failed to send IP limit error frame"
                );
            }
            let _ = sender.close().await;
            return;
        }
    };

    // Outgoing: drain the bounded queue onto the socket.
    let mut send_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if send_text_message(&mut sender, &message, &client_id)
                .await
                .is_err()
            {
                break;
            }
        }
        let _ = sender.close().await;
    });

    // Incoming: decode frames and dispatch them in arrival order. The stop
    // signal is only observed between frames, so a handler never runs half way.
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
    let server_clone = server.clone();
    let mut receive_task = tokio::spawn(async move {
        let max_size = server_clone.config().max_message_size;
        let limits = server_clone.config().interest_limits;

        loop {
            let next = tokio::select! {
                biased;
                _ = &mut stop_rx => break,
                next = receiver.next() => next,
            };
            let Some(msg) = next else {
                break;
            };
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::debug!(%client_id, "WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    let text = text.as_str();
                    if text.len() > max_size {
                        server_clone.metrics.increment_oversized_frames();
                        tracing::warn!(
                            %client_id,
                            size = text.len(),
                            max = max_size,
                            "Message exceeds size limit"
                        );
                        let _ = server_clone
                            .send_error_to_client(
                                &client_id,
                                format!(
                                    "Message too large ({} bytes, max {} bytes)",
                                    text.len(),
                                    max_size
                                ),
                                Some(ErrorCode::MessageTooLarge),
                            )
                            .await;
                        continue;
                    }

                    match parse_client_message(text, &limits) {
                        Ok(message) => {
                            server_clone.handle_client_message(&client_id, message).await;
                        }
                        Err(err) => {
                            server_clone.metrics.increment_invalid_frames();
                            tracing::debug!(%client_id, error = %err, "Dropped client frame");
                        }
                    }
                }
                Message::Binary(_) => {
                    tracing::debug!(%client_id, "Ignoring binary frame");
                }
                Message::Close(_) => {
                    tracing::debug!(%client_id, "Client sent close frame");
                    break;
                }
                Message::Ping(_) | Message::Pong(_) => {}
            }
        }
    });

    // Whichever side finishes first ends the connection. Both tasks have
    // stopped before the client is unregistered.
    let send_finished_first = tokio::select! {
        _ = &mut send_task => true,
        _ = &mut receive_task => false,
    };
    if send_finished_first {
        let _ = stop_tx.send(());
        let _ = receive_task.await;
    } else {
        send_task.abort();
        let _ = send_task.await;
    }

    server.unregister_client(&client_id).await;
    tracing::info!(%client_id, client_addr = %addr, "WebSocket connection closed");
}

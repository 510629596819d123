use crate::protocol::{parse_client_message, ClientId, InterestLimits, ServerMessage};
use crate::server::{MatchServer, ServerConfig};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

type Inbox = mpsc::Receiver<Arc<ServerMessage>>;

async fn connect(server: &MatchServer, port: u16) -> (ClientId, Inbox) {
    let (sender, receiver) = mpsc::channel(32);
    let addr: SocketAddr = format!("127.0.0.1:{port}").parse().unwrap();
    let client_id = server
        .connection_manager
        .register_client(sender, addr, server.instance_id)
        .await
        .expect("client registration succeeds");
    (client_id, receiver)
}

async fn route(server: &MatchServer, client_id: &ClientId, frame: &str) {
    let message = parse_client_message(frame, &InterestLimits::default())
        .expect("frame should decode");
    server.handle_client_message(client_id, message).await;
}

#[tokio::test]
async fn join_frames_are_routed_to_matchmaking() {
    let server = MatchServer::new(ServerConfig::default());
    let (a, mut inbox_a) = connect(&server, 1).await;
    let (b, mut inbox_b) = connect(&server, 2).await;

    route(&server, &a, r#"{"type":"join","data":{"interests":["music"]}}"#).await;
    route(&server, &b, r#"{"type":"join"}"#).await;

    assert_eq!(*inbox_a.recv().await.unwrap(), ServerMessage::Waiting);
    assert_eq!(
        *inbox_b.recv().await.unwrap(),
        ServerMessage::Matched {
            partner_id: a,
            is_initiator: true
        }
    );
    assert_eq!(
        server.sessions.lock().await.interests_of(&a).map(|i| i.len()),
        Some(1)
    );
}

#[tokio::test]
async fn chat_and_signal_frames_are_relayed() {
    let server = MatchServer::new(ServerConfig::default());
    let (a, mut inbox_a) = connect(&server, 1).await;
    let (b, mut inbox_b) = connect(&server, 2).await;
    route(&server, &a, r#"{"type":"join","data":{}}"#).await;
    route(&server, &b, r#"{"type":"join","data":{}}"#).await;
    inbox_a.recv().await.unwrap();
    inbox_a.recv().await.unwrap();
    inbox_b.recv().await.unwrap();

    route(
        &server,
        &a,
        &json!({"type": "signal", "data": {"to": b, "signal": {"candidate": "c1"}}}).to_string(),
    )
    .await;
    route(&server, &a, r#"{"type":"chat-message","data":{"message":"hi"}}"#).await;

    assert_eq!(
        *inbox_b.recv().await.unwrap(),
        ServerMessage::Signal {
            from: a,
            signal: json!({"candidate": "c1"})
        }
    );
    assert_eq!(
        *inbox_b.recv().await.unwrap(),
        ServerMessage::ChatMessage {
            message: json!("hi")
        }
    );
}

#[tokio::test]
async fn next_leave_and_report_frames_produce_no_reply_to_sender() {
    let server = MatchServer::new(ServerConfig::default());
    let (a, mut inbox_a) = connect(&server, 1).await;

    route(&server, &a, r#"{"type":"next"}"#).await;
    route(&server, &a, r#"{"type":"leave"}"#).await;
    route(&server, &a, r#"{"type":"report","data":{"reason":"spam"}}"#).await;

    assert!(
        timeout(Duration::from_millis(50), inbox_a.recv())
            .await
            .unwrap_or(None)
            .is_none(),
        "idle client should not receive anything"
    );
    assert_eq!(server.metrics().snapshot().matchmaking.reports_filed, 1);
}

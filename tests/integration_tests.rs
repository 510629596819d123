//! In-process server tests: many clients against one `MatchServer`, no sockets.


use blindcall_server::protocol::{InterestSet, ServerMessage};
use serde_json::json;
use std::sync::Arc;
use test_helpers::{create_test_server, drain_session_events, register_test_client};
use tokio::sync::Barrier;

fn interests(tags: &[&str]) -> InterestSet {
    tags.iter().copied().collect()
}

#[tokio::test]
async fn disconnect_cascade_frees_partner_for_a_fresh_match() {
    let server = create_test_server();
    let (a, _inbox_a) = register_test_client(&server, 1).await;
    let (b, mut inbox_b) = register_test_client(&server, 2).await;
    server.handle_join(&a, interests(&["hiking"])).await;
    server.handle_join(&b, interests(&["hiking"])).await;
    drain_session_events(&mut inbox_b);

    server.unregister_client(&a).await;

    assert_eq!(
        drain_session_events(&mut inbox_b),
        vec![ServerMessage::PartnerDisconnected]
    );
    let stats = server.session_stats().await;
    assert_eq!(stats.active_pairs, 0);
    assert_eq!(stats.online_clients, 1);

    let (c, mut inbox_c) = register_test_client(&server, 3).await;
    server.handle_join(&b, InterestSet::new()).await;
    server.handle_join(&c, InterestSet::new()).await;
    assert_eq!(
        drain_session_events(&mut inbox_c),
        vec![ServerMessage::Matched {
            partner_id: b,
            is_initiator: true
        }]
    );
}

#[tokio::test]
async fn chat_is_routed_to_partner_only() {
    let server = create_test_server();
    let (a, mut inbox_a) = register_test_client(&server, 1).await;
    let (b, mut inbox_b) = register_test_client(&server, 2).await;
    let (c, mut inbox_c) = register_test_client(&server, 3).await;

    server.handle_chat_message(&a, json!("before pairing")).await;
    assert!(drain_session_events(&mut inbox_b).is_empty());
    assert!(drain_session_events(&mut inbox_c).is_empty());

    server.handle_join(&a, InterestSet::new()).await;
    server.handle_join(&b, InterestSet::new()).await;
    server.handle_join(&c, InterestSet::new()).await;
    drain_session_events(&mut inbox_a);
    drain_session_events(&mut inbox_b);
    drain_session_events(&mut inbox_c);

    server.handle_chat_message(&b, json!("hey")).await;

    assert_eq!(
        drain_session_events(&mut inbox_a),
        vec![ServerMessage::ChatMessage {
            message: json!("hey")
        }]
    );
    assert!(drain_session_events(&mut inbox_b).is_empty());
    assert!(drain_session_events(&mut inbox_c).is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn simultaneous_joins_form_exactly_one_pair() {
    for _ in 0..20 {
        let server = create_test_server();
        let mut clients = Vec::new();
        for port in 1..=3 {
            clients.push(register_test_client(&server, port).await);
        }

        let barrier = Arc::new(Barrier::new(3));
        let handles: Vec<_> = clients
            .iter()
            .map(|(client_id, _)| {
                let server = server.clone();
                let barrier = barrier.clone();
                let client_id = *client_id;
                tokio::spawn(async move {
                    barrier.wait().await;
                    server.handle_join(&client_id, interests(&["same"])).await;
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let stats = server.session_stats().await;
        assert_eq!(stats.active_pairs, 1);
        assert_eq!(stats.waiting_clients, 1);

        let mut initiators = 0;
        let mut matched = 0;
        let mut waiting = 0;
        for (_, inbox) in &mut clients {
            for event in drain_session_events(inbox) {
                match event {
                    ServerMessage::Matched { is_initiator, .. } => {
                        matched += 1;
                        initiators += usize::from(is_initiator);
                    }
                    ServerMessage::Waiting => waiting += 1,
                    other => panic!("unexpected event {other:?}"),
                }
            }
        }
        assert_eq!(matched, 2);
        assert_eq!(initiators, 1);
        // The first joiner waited before being matched; the leftover is still waiting.
        assert_eq!(waiting, 2);
    }
}

#[tokio::test]
async fn next_then_rejoin_can_find_the_same_pool_again() {
    let server = create_test_server();
    let (a, mut inbox_a) = register_test_client(&server, 1).await;
    let (b, mut inbox_b) = register_test_client(&server, 2).await;
    server.handle_join(&a, interests(&["x"])).await;
    server.handle_join(&b, interests(&["x"])).await;
    drain_session_events(&mut inbox_a);
    drain_session_events(&mut inbox_b);

    server.handle_next(&a).await;
    server.handle_join(&a, interests(&["x"])).await;

    assert_eq!(
        drain_session_events(&mut inbox_b),
        vec![ServerMessage::PartnerDisconnected]
    );
    assert_eq!(drain_session_events(&mut inbox_a), vec![ServerMessage::Waiting]);

    server.handle_join(&b, interests(&["x"])).await;
    assert_eq!(
        drain_session_events(&mut inbox_b),
        vec![ServerMessage::Matched {
            partner_id: a,
            is_initiator: true
        }]
    );
}

#[tokio::test]
async fn online_count_tracks_connections() {
    let server = create_test_server();
    let (_a, mut inbox_a) = register_test_client(&server, 1).await;
    let (b, _inbox_b) = register_test_client(&server, 2).await;
    server.unregister_client(&b).await;

    let counts: Vec<usize> = std::iter::from_fn(|| inbox_a.try_recv().ok())
        .filter_map(|message| match *message {
            ServerMessage::OnlineCount { count } => Some(count),
            _ => None,
        })
        .collect();
    assert_eq!(counts, vec![1, 2, 1]);
}

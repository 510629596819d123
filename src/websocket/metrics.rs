use crate::server::MatchServer;
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use std::sync::Arc;

fn enforce_metrics_auth(headers: &HeaderMap, expected: Option<&str>) -> Result<(), StatusCode> {
    let Some(raw_header) = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
    else {
        tracing::warn!("Unauthorized metrics access attempt: missing Authorization header");
        return Err(StatusCode::UNAUTHORIZED);
    };

    let Some(token) = raw_header.strip_prefix("Bearer ") else {
        tracing::warn!("Unauthorized metrics access attempt: invalid Authorization scheme");
        return Err(StatusCode::UNAUTHORIZED);
    };

    match expected {
        Some(expected) if !expected.is_empty() && token == expected => Ok(()),
        _ => {
            tracing::warn!("Unauthorized metrics access attempt: token rejected");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

/// JSON snapshot of counters plus live session gauges.
pub async fn metrics_handler(
    headers: HeaderMap,
    State(server): State<Arc<MatchServer>>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let config = server.config();
    if config.require_metrics_auth {
        enforce_metrics_auth(&headers, config.metrics_auth_token.as_deref())?;
    }

    let sessions = server.session_stats().await;
    let snapshot = server.metrics.snapshot();

    Ok(Json(serde_json::json!({
        "timestamp": snapshot.timestamp.to_rfc3339(),
        "instanceId": server.instance_id(),
        "region": config.region_id,
        "sessions": {
            "waiting": sessions.waiting_clients,
            "activePairs": sessions.active_pairs,
            "online": sessions.online_clients,
        },
        "serverMetrics": snapshot,
    })))
}

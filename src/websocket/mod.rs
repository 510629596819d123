// WebSocket transport and HTTP endpoints.
//
// - handler: WebSocket upgrade handler (entry point)
// - connection: per-connection send/receive loops
// - sending: frame serialization
// - routes: router, CORS, tracing, health, fallback, serve loop
// - metrics: metrics endpoint and bearer auth

mod connection;
mod handler;
mod metrics;
mod routes;
mod sending;

pub use handler::websocket_handler;
pub use metrics::metrics_handler;
pub use routes::{create_router, run_server};

#![cfg_attr(not(test), deny(clippy::panic))]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

//! # Blindcall Server
//!
//! An in-memory WebSocket server that pairs anonymous clients one-on-one,
//! preferring partners with shared interests, and relays WebRTC negotiation
//! and chat between them.

/// Server configuration and environment variables
pub mod config;

/// Per-connection message delivery
pub mod coordination;

/// Structured logging configuration
pub mod logging;

/// Metrics collection and reporting
pub mod metrics;

/// WebSocket message protocol definitions
pub mod protocol;

/// Server orchestration over the session core
pub mod server;

/// Waiting pool, pairing registry, and matchmaking
pub mod session;

/// WebSocket connection handling and HTTP endpoints
pub mod websocket;

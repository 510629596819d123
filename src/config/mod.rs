//! Configuration for the matchmaking server.
//!
//! Layered JSON configuration: inline env JSON, stdin, explicit file path,
//! `config.json` in the working or executable directory, then compiled
//! defaults. Fields can be overridden with `BLINDCALL__SECTION__FIELD`.
//!
//! - [`types`]: root [`Config`]
//! - [`server`]: connection queue settings
//! - [`matchmaking`]: interest list bounds
//! - [`security`]: CORS, frame size, per-IP limits, metrics auth
//! - [`logging`]: log level, format, and rolling file output
//! - [`loader`], [`validation`], [`defaults`]

pub mod defaults;
pub mod loader;
pub mod logging;
pub mod matchmaking;
pub mod security;
pub mod server;
pub mod types;
pub mod validation;

pub use loader::load;
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use matchmaking::MatchmakingConfig;
pub use security::SecurityConfig;
pub use server::ServerConfig;
pub use types::Config;
pub use validation::{is_production_mode, validate_config};

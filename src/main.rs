#![cfg_attr(not(test), deny(clippy::panic))]

use blindcall_server::config;
use blindcall_server::logging;
use blindcall_server::server::{MatchServer, ServerConfig};
use blindcall_server::websocket;
use clap::Parser;
use std::net::SocketAddr;

/// Anonymous one-on-one matchmaking and WebRTC signaling over WebSocket
#[derive(Parser, Debug)]
#[command(name = "blindcall-server")]
#[command(about = "Anonymous one-on-one matchmaking and WebRTC signaling server")]
#[command(version)]
struct Cli {
    /// Validate configuration and exit without starting the server.
    #[arg(long, short = 'c', conflicts_with = "print_config")]
    validate_config: bool,

    /// Print the loaded configuration as JSON and exit.
    #[arg(long, conflicts_with = "validate_config")]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = config::load();

    if cli.print_config {
        let json = serde_json::to_string_pretty(&cfg)
            .map_err(|e| anyhow::anyhow!("Failed to serialize config: {e}"))?;
        println!("{json}");
        return Ok(());
    }

    // load() only reports validation problems; here they decide the exit code.
    let validation_result = config::validate_config(&cfg);

    if cli.validate_config {
        match validation_result {
            Ok(()) => {
                println!("Configuration validation passed");
                println!();
                println!("Configuration summary:");
                println!("  Port: {}", cfg.port);
                println!(
                    "  Outbound queue capacity: {}",
                    cfg.server.outbound_queue_capacity
                );
                println!(
                    "  Max connections per IP: {}",
                    cfg.security.max_connections_per_ip
                );
                println!(
                    "  Metrics auth required: {}",
                    cfg.security.require_metrics_auth
                );
                println!(
                    "  Interest limits: {} tags, {} chars each",
                    cfg.matchmaking.max_interests, cfg.matchmaking.max_interest_length
                );
                println!("  Deployment region: {}", cfg.server.region_id);
                return Ok(());
            }
            Err(e) => {
                eprintln!("Configuration validation failed:\n{e}");
                std::process::exit(1);
            }
        }
    }

    validation_result?;

    let _log_guard = logging::init_with_config(&cfg.logging);

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    let server = MatchServer::new(ServerConfig::from(&cfg));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        cors_origins = %cfg.security.cors_origins,
        "Server started - WebSocket: /ws, Metrics: /metrics"
    );

    websocket::run_server(listener, server, &cfg.security.cors_origins).await?;

    tracing::info!("Server stopped");
    Ok(())
}

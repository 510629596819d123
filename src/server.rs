use crate::config::Config;
use crate::coordination::{InMemoryMessageCoordinator, MessageCoordinator};
use crate::metrics::ServerMetrics;
use crate::protocol::{ClientId, InterestLimits, ServerMessage};
use crate::session::{LogReportSink, ReportSink, SessionManager};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

mod connection_manager;
mod matchmaking;
mod message_router;
#[cfg(test)]
mod message_router_tests;
mod messaging;
mod moderation;
mod relay;

use connection_manager::ConnectionManager;

/// Matchmaking and signaling server for one process.
///
/// Session state lives in a single [`SessionManager`] behind one mutex. Every
/// client event locks it, mutates it, and enqueues the resulting messages
/// before releasing it, so match formation is atomic and each client observes
/// its own events in state order.
pub struct MatchServer {
    sessions: Mutex<SessionManager>,
    /// Connected clients and per-IP accounting
    connection_manager: ConnectionManager,
    config: ServerConfig,
    pub(crate) metrics: Arc<ServerMetrics>,
    message_coordinator: Arc<dyn MessageCoordinator>,
    report_sink: Arc<dyn ReportSink>,
    instance_id: Uuid,
}

#[derive(Debug, Error)]
pub enum RegisterClientError {
    #[error("Too many connections from your IP ({current}/{limit})")]
    IpLimitExceeded { current: usize, limit: usize },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub outbound_queue_capacity: usize,
    pub max_message_size: usize,
    pub max_connections_per_ip: usize,
    pub interest_limits: InterestLimits,
    pub require_metrics_auth: bool,
    pub metrics_auth_token: Option<String>,
    pub region_id: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for ServerConfig {
    fn from(cfg: &Config) -> Self {
        Self {
            outbound_queue_capacity: cfg.server.outbound_queue_capacity,
            max_message_size: cfg.security.max_message_size,
            max_connections_per_ip: cfg.security.max_connections_per_ip,
            interest_limits: cfg.matchmaking.interest_limits(),
            require_metrics_auth: cfg.security.require_metrics_auth,
            metrics_auth_token: cfg.security.metrics_auth_token.clone(),
            region_id: cfg.server.region_id.clone(),
        }
    }
}

/// Live session gauges, read under the session lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct SessionStats {
    pub waiting_clients: usize,
    pub active_pairs: usize,
    pub online_clients: usize,
}

impl MatchServer {
    /// Server with in-process delivery and log-backed report recording.
    pub fn new(config: ServerConfig) -> Arc<Self> {
        let metrics = Arc::new(ServerMetrics::new());
        let coordinator: Arc<dyn MessageCoordinator> =
            Arc::new(InMemoryMessageCoordinator::new(metrics.clone()));
        Self::with_components(config, metrics, coordinator, Arc::new(LogReportSink))
    }

    pub fn with_components(
        config: ServerConfig,
        metrics: Arc<ServerMetrics>,
        message_coordinator: Arc<dyn MessageCoordinator>,
        report_sink: Arc<dyn ReportSink>,
    ) -> Arc<Self> {
        let connection_manager = ConnectionManager::new(
            config.max_connections_per_ip,
            metrics.clone(),
            message_coordinator.clone(),
        );

        let instance_id = Uuid::new_v4();
        tracing::info!(%instance_id, region = %config.region_id, "Match server created");

        Arc::new(Self {
            sessions: Mutex::new(SessionManager::new()),
            connection_manager,
            config,
            metrics,
            message_coordinator,
            report_sink,
            instance_id,
        })
    }

    /// Admit a new connection and announce the updated online count.
    pub async fn register_client(
        &self,
        sender: mpsc::Sender<Arc<ServerMessage>>,
        client_addr: SocketAddr,
    ) -> Result<ClientId, RegisterClientError> {
        let client_id = self
            .connection_manager
            .register_client(sender, client_addr, self.instance_id)
            .await
            .inspect_err(|_| self.metrics.increment_rejected_connections())?;

        self.broadcast_online_count().await;
        Ok(client_id)
    }

    /// Tear down everything a departed connection owned, notify its partner,
    /// and announce the updated online count. Safe to call more than once.
    pub async fn unregister_client(&self, client_id: &ClientId) {
        // Connection removal and session teardown share the lock so a late
        // join from this client cannot re-enter the pool.
        let removed = {
            let mut sessions = self.sessions.lock().await;
            let removed = self.connection_manager.remove_client(client_id);
            let end = sessions.handle_disconnect(client_id);
            if let Some(partner_id) = end.partner_id {
                self.metrics.increment_sessions_ended();
                tracing::info!(%client_id, %partner_id, "Session ended by disconnect");
            }
            self.deliver(end.messages).await;
            removed
        };

        if removed.is_none() {
            return;
        }
        self.metrics.decrement_active_connections();

        if let Err(e) = self
            .message_coordinator
            .unregister_local_client(client_id)
            .await
        {
            tracing::warn!(%client_id, "Failed to unregister client from coordinator: {}", e);
        }

        tracing::info!(%client_id, instance_id = %self.instance_id, "Client unregistered");
        self.broadcast_online_count().await;
    }

    pub async fn session_stats(&self) -> SessionStats {
        let (waiting_clients, active_pairs) = {
            let sessions = self.sessions.lock().await;
            (sessions.waiting_count(), sessions.pair_count())
        };
        SessionStats {
            waiting_clients,
            active_pairs,
            online_clients: self.message_coordinator.online_count().await,
        }
    }

    pub fn is_connected(&self, client_id: &ClientId) -> bool {
        self.connection_manager.has_client(client_id)
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn metrics(&self) -> Arc<ServerMetrics> {
        self.metrics.clone()
    }
}

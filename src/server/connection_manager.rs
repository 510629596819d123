use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::coordination::MessageCoordinator;
use crate::metrics::ServerMetrics;
use crate::protocol::{ClientId, ServerMessage};

use super::RegisterClientError;

#[derive(Debug, Clone)]
pub(crate) struct ClientConnection {
    pub client_addr: SocketAddr,
    pub connected_at: Instant,
}

/// Tracks live connections and enforces the per-IP connection limit.
pub(crate) struct ConnectionManager {
    clients: DashMap<ClientId, ClientConnection>,
    connections_per_ip: DashMap<IpAddr, usize>,
    metrics: Arc<ServerMetrics>,
    message_coordinator: Arc<dyn MessageCoordinator>,
    max_connections_per_ip: usize,
}

impl ConnectionManager {
    pub fn new(
        max_connections_per_ip: usize,
        metrics: Arc<ServerMetrics>,
        message_coordinator: Arc<dyn MessageCoordinator>,
    ) -> Self {
        Self {
            clients: DashMap::new(),
            connections_per_ip: DashMap::new(),
            metrics,
            message_coordinator,
            max_connections_per_ip,
        }
    }

    /// Reserve an IP slot, mint a fresh client id, and register the outbound
    /// queue for delivery.
    pub async fn register_client(
        &self,
        sender: mpsc::Sender<Arc<ServerMessage>>,
        client_addr: SocketAddr,
        instance_id: Uuid,
    ) -> Result<ClientId, RegisterClientError> {
        let ip = client_addr.ip();
        if let Err(current) = self.try_reserve_ip_slot(ip) {
            warn!(
                %ip,
                current,
                max = self.max_connections_per_ip,
                "IP connection limit exceeded"
            );
            return Err(RegisterClientError::IpLimitExceeded {
                current,
                limit: self.max_connections_per_ip,
            });
        }

        let client_id = Uuid::new_v4();
        self.clients.insert(
            client_id,
            ClientConnection {
                client_addr,
                connected_at: Instant::now(),
            },
        );
        self.metrics.increment_connections();

        if let Err(err) = self
            .message_coordinator
            .register_local_client(client_id, sender)
            .await
        {
            warn!(%client_id, %err, "Failed to register client with coordinator");
        }

        info!(%client_id, %instance_id, %client_addr, "Client registered");
        Ok(client_id)
    }

    pub fn has_client(&self, client_id: &ClientId) -> bool {
        self.clients.contains_key(client_id)
    }

    pub fn remove_client(&self, client_id: &ClientId) -> Option<ClientConnection> {
        self.clients.remove(client_id).map(|(_, connection)| {
            self.release_ip_slot(connection.client_addr.ip());
            tracing::debug!(
                %client_id,
                connected_for_ms = connection.connected_at.elapsed().as_millis() as u64,
                "Connection removed"
            );
            connection
        })
    }

    fn try_reserve_ip_slot(&self, ip: IpAddr) -> Result<usize, usize> {
        match self.connections_per_ip.entry(ip) {
            Entry::Occupied(mut entry) => {
                let count = entry.get_mut();
                if *count >= self.max_connections_per_ip {
                    Err(*count)
                } else {
                    *count += 1;
                    Ok(*count)
                }
            }
            Entry::Vacant(entry) => {
                if self.max_connections_per_ip == 0 {
                    Err(0)
                } else {
                    entry.insert(1);
                    Ok(1)
                }
            }
        }
    }

    fn release_ip_slot(&self, ip: IpAddr) {
        if let Some(mut entry) = self.connections_per_ip.get_mut(&ip) {
            if *entry > 1 {
                *entry -= 1;
                return;
            }
        }
        self.connections_per_ip.remove(&ip);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct RecordingCoordinator {
        registrations: Mutex<Vec<ClientId>>,
    }

    #[async_trait]
    impl MessageCoordinator for RecordingCoordinator {
        async fn send_to_client(
            &self,
            _client_id: &ClientId,
            _message: Arc<ServerMessage>,
        ) -> Result<()> {
            Ok(())
        }

        async fn broadcast_all(&self, _message: Arc<ServerMessage>) -> Result<()> {
            Ok(())
        }

        async fn register_local_client(
            &self,
            client_id: ClientId,
            _sender: mpsc::Sender<Arc<ServerMessage>>,
        ) -> Result<()> {
            self.registrations.lock().await.push(client_id);
            Ok(())
        }

        async fn unregister_local_client(&self, _client_id: &ClientId) -> Result<()> {
            Ok(())
        }

        async fn online_count(&self) -> usize {
            0
        }
    }

    fn make_manager(max_connections_per_ip: usize) -> (ConnectionManager, Arc<RecordingCoordinator>) {
        let metrics = Arc::new(ServerMetrics::new());
        let coordinator = Arc::new(RecordingCoordinator::default());
        let manager = ConnectionManager::new(
            max_connections_per_ip,
            metrics,
            coordinator.clone() as Arc<dyn MessageCoordinator>,
        );
        (manager, coordinator)
    }

    fn channel() -> (
        mpsc::Sender<Arc<ServerMessage>>,
        mpsc::Receiver<Arc<ServerMessage>>,
    ) {
        mpsc::channel(4)
    }

    #[tokio::test]
    async fn register_client_enforces_ip_limits_and_releases_on_remove() {
        let (manager, _) = make_manager(1);
        let addr: SocketAddr = "127.0.0.1:5000".parse().unwrap();

        let (tx1, _rx1) = channel();
        let first_id = manager
            .register_client(tx1, addr, Uuid::new_v4())
            .await
            .expect("first registration succeeds");

        let (tx2, _rx2) = channel();
        let err = manager
            .register_client(tx2, "127.0.0.1:5001".parse().unwrap(), Uuid::new_v4())
            .await
            .expect_err("second client from the same IP hits the limit");
        match err {
            RegisterClientError::IpLimitExceeded { current, limit } => {
                assert_eq!(current, 1);
                assert_eq!(limit, 1);
            }
        }

        assert!(manager.remove_client(&first_id).is_some());
        assert!(manager.remove_client(&first_id).is_none());

        let (tx3, _rx3) = channel();
        manager
            .register_client(tx3, addr, Uuid::new_v4())
            .await
            .expect("registrations resume after slot release");
    }

    #[tokio::test]
    async fn distinct_ips_have_independent_limits() {
        let (manager, coordinator) = make_manager(1);

        let (tx1, _rx1) = channel();
        let (tx2, _rx2) = channel();
        let a = manager
            .register_client(tx1, "10.0.0.1:1".parse().unwrap(), Uuid::new_v4())
            .await
            .unwrap();
        let b = manager
            .register_client(tx2, "10.0.0.2:1".parse().unwrap(), Uuid::new_v4())
            .await
            .unwrap();

        assert_ne!(a, b);
        assert!(manager.has_client(&a) && manager.has_client(&b));
        assert_eq!(*coordinator.registrations.lock().await, vec![a, b]);
    }

    #[tokio::test]
    async fn zero_limit_rejects_everyone() {
        let (manager, _) = make_manager(0);
        let (tx, _rx) = channel();
        let result = manager
            .register_client(tx, "127.0.0.1:1".parse().unwrap(), Uuid::new_v4())
            .await;
        assert!(matches!(
            result,
            Err(RegisterClientError::IpLimitExceeded { current: 0, limit: 0 })
        ));
    }
}

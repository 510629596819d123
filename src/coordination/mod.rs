//! Message delivery to connected clients.
//!
//! The session core never touches sockets. It produces addressed
//! [`ServerMessage`]s and the server hands them to a [`MessageCoordinator`],
//! which owns the per-connection outbound queues.

pub mod in_memory;

pub use in_memory::InMemoryMessageCoordinator;

use crate::protocol::{ClientId, ServerMessage};
use std::sync::Arc;
use tokio::sync::mpsc;

#[async_trait::async_trait]
pub trait MessageCoordinator: Send + Sync {
    /// Best-effort delivery; an unknown or closed client is not an error.
    async fn send_to_client(
        &self,
        client_id: &ClientId,
        message: Arc<ServerMessage>,
    ) -> anyhow::Result<()>;

    /// Deliver to every registered client.
    async fn broadcast_all(&self, message: Arc<ServerMessage>) -> anyhow::Result<()>;

    async fn register_local_client(
        &self,
        client_id: ClientId,
        sender: mpsc::Sender<Arc<ServerMessage>>,
    ) -> anyhow::Result<()>;

    async fn unregister_local_client(&self, client_id: &ClientId) -> anyhow::Result<()>;

    /// Number of clients currently registered for delivery.
    async fn online_count(&self) -> usize;
}

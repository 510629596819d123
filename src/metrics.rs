use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for the matchmaking server.
#[derive(Debug, Default)]
pub struct ServerMetrics {
    // Connection metrics
    pub total_connections: AtomicU64,
    pub active_connections: AtomicU64,
    pub disconnections: AtomicU64,
    pub rejected_connections: AtomicU64,

    // Matchmaking metrics
    pub joins: AtomicU64,
    pub matches_formed: AtomicU64,
    pub sessions_ended: AtomicU64,
    pub reports_filed: AtomicU64,

    // Relay metrics
    pub signals_relayed: AtomicU64,
    pub signals_dropped: AtomicU64,
    pub chat_messages_relayed: AtomicU64,
    pub chat_messages_dropped: AtomicU64,

    // Delivery metrics
    pub messages_dropped: AtomicU64,
    pub invalid_frames: AtomicU64,
    pub oversized_frames: AtomicU64,
}

impl ServerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    // Connection metrics
    pub fn increment_connections(&self) {
        self.total_connections.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decrement_active_connections(&self) {
        // Check-then-decrement so a double unregister cannot underflow
        let _ = self
            .active_connections
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                current.checked_sub(1)
            });
        self.disconnections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_rejected_connections(&self) {
        self.rejected_connections.fetch_add(1, Ordering::Relaxed);
    }

    // Matchmaking metrics
    pub fn increment_joins(&self) {
        self.joins.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_matches_formed(&self) {
        self.matches_formed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_sessions_ended(&self) {
        self.sessions_ended.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_reports_filed(&self) {
        self.reports_filed.fetch_add(1, Ordering::Relaxed);
    }

    // Relay metrics
    pub fn increment_signals_relayed(&self) {
        self.signals_relayed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_signals_dropped(&self) {
        self.signals_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_chat_messages_relayed(&self) {
        self.chat_messages_relayed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_chat_messages_dropped(&self) {
        self.chat_messages_dropped.fetch_add(1, Ordering::Relaxed);
    }

    // Delivery metrics
    pub fn increment_messages_dropped(&self) {
        self.messages_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_invalid_frames(&self) {
        self.invalid_frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_oversized_frames(&self) {
        self.oversized_frames.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);

        MetricsSnapshot {
            timestamp: chrono::Utc::now(),
            connections: ConnectionMetrics {
                total_connections: load(&self.total_connections),
                active_connections: load(&self.active_connections),
                disconnections: load(&self.disconnections),
                rejected_connections: load(&self.rejected_connections),
            },
            matchmaking: MatchmakingMetrics {
                joins: load(&self.joins),
                matches_formed: load(&self.matches_formed),
                sessions_ended: load(&self.sessions_ended),
                reports_filed: load(&self.reports_filed),
            },
            relay: RelayMetrics {
                signals_relayed: load(&self.signals_relayed),
                signals_dropped: load(&self.signals_dropped),
                chat_messages_relayed: load(&self.chat_messages_relayed),
                chat_messages_dropped: load(&self.chat_messages_dropped),
            },
            delivery: DeliveryMetrics {
                messages_dropped: load(&self.messages_dropped),
                invalid_frames: load(&self.invalid_frames),
                oversized_frames: load(&self.oversized_frames),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub connections: ConnectionMetrics,
    pub matchmaking: MatchmakingMetrics,
    pub relay: RelayMetrics,
    pub delivery: DeliveryMetrics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionMetrics {
    pub total_connections: u64,
    pub active_connections: u64,
    pub disconnections: u64,
    pub rejected_connections: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchmakingMetrics {
    pub joins: u64,
    pub matches_formed: u64,
    pub sessions_ended: u64,
    pub reports_filed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayMetrics {
    pub signals_relayed: u64,
    pub signals_dropped: u64,
    pub chat_messages_relayed: u64,
    pub chat_messages_dropped: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryMetrics {
    pub messages_dropped: u64,
    pub invalid_frames: u64,
    pub oversized_frames: u64,
}

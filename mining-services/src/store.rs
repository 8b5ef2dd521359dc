//! Published snapshot and alert ring
//!
//! Readers clone an `Arc<Snapshot>` and never wait on a cycle in progress.
//! The snapshot is swapped whole; alerts go into a bounded ring as they are
//! detected.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::Arc;

use mining_core::{Alert, Snapshot};

/// Most alerts retained
pub const ALERT_RING_CAPACITY: usize = 10;

/// Alerts returned by the alerts endpoint
pub const RECENT_ALERTS_LIMIT: usize = 5;

#[derive(Debug, Default)]
struct StoreState {
    snapshot: Arc<Snapshot>,
    alerts: VecDeque<Alert>,
}

/// Single-writer store for the latest accepted cycle
#[derive(Debug, Default)]
pub struct SnapshotStore {
    state: RwLock<StoreState>,
}

impl SnapshotStore {
    /// Empty store: no coins, no `lastUpdate`, no alerts
    pub fn new() -> Self {
        Self::default()
    }

    /// The current snapshot
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.state.read().snapshot.clone()
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.state.read().snapshot.last_update
    }

    /// Replace the snapshot
    pub fn publish(&self, snapshot: Snapshot) {
        let snapshot = Arc::new(snapshot);
        self.state.write().snapshot = snapshot;
    }

    /// Append an alert, evicting the oldest beyond [`ALERT_RING_CAPACITY`]
    pub fn push_alert(&self, alert: Alert) {
        let mut state = self.state.write();
        state.alerts.push_back(alert);
        while state.alerts.len() > ALERT_RING_CAPACITY {
            state.alerts.pop_front();
        }
    }

    /// Every retained alert, oldest first
    pub fn alerts(&self) -> Vec<Alert> {
        self.state.read().alerts.iter().cloned().collect()
    }

    /// The `limit` most recent alerts, oldest first
    pub fn recent_alerts(&self, limit: usize) -> Vec<Alert> {
        let state = self.state.read();
        let skip = state.alerts.len().saturating_sub(limit);
        state.alerts.iter().skip(skip).cloned().collect()
    }
}

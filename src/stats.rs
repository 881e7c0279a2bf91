use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::dispatcher::Inner;
use crate::job::JobKind;

/// Cumulative per-kind counters, process-wide for the life of the
/// dispatcher. Never reset by the rate-window timer.
#[derive(Default)]
pub(crate) struct Counters {
    pub submitted: AtomicU64,
    pub completed: AtomicU64,
    pub failed: AtomicU64,
}

/// Utilization snapshot for one kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KindStats {
    pub pool_size: usize,
    pub busy_workers: usize,
    pub free_workers: usize,
    pub queued: usize,
    pub submitted: u64,
    pub completed: u64,
    pub failed: u64,
}

/// Snapshot across every kind, taken at one point in time.
///
/// This is a monitoring view: each kind's numbers are internally
/// consistent, but kinds are sampled one after another, which is fine
/// for a display surface polling once a second.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stats {
    pub kinds: HashMap<JobKind, KindStats>,
}

impl Stats {
    pub fn get(&self, kind: JobKind) -> Option<&KindStats> {
        self.kinds.get(&kind)
    }
}

/// Read-only monitoring handle over a dispatcher.
///
/// Cheap to clone and safe to poll concurrently with ongoing dispatch
/// activity; easy to plug into a dashboard, CLI tool, or HTTP API.
#[derive(Clone)]
pub struct StatsReporter {
    pub(crate) inner: Arc<Inner>,
}

impl StatsReporter {
    /// Snapshot every kind.
    pub async fn snapshot(&self) -> Stats {
        self.inner.stats().await
    }

    /// Snapshot a single kind.
    pub async fn kind_stats(&self, kind: JobKind) -> KindStats {
        self.inner.kind_stats(kind).await
    }
}

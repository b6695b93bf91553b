use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::LazyLock;
use std::time::{SystemTime, UNIX_EPOCH};

pub const UNSET_TS: u64 = 0;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MutationMetricsSnapshot {
    pub started: u64,
    pub committed: u64,
    pub already_applied: u64,
    pub rolled_back: u64,
    pub rejected: u64,
    pub stale_reconciliations: u64,
    pub retries: u64,
    pub last_commit_ms: Option<u64>,
    pub last_rollback_ms: Option<u64>,
}

#[derive(Debug)]
struct MutationMetrics {
    started: AtomicU64,
    committed: AtomicU64,
    already_applied: AtomicU64,
    rolled_back: AtomicU64,
    rejected: AtomicU64,
    stale_reconciliations: AtomicU64,
    retries: AtomicU64,
    last_commit_ms: AtomicU64,
    last_rollback_ms: AtomicU64,
}

impl MutationMetrics {
    const fn new() -> Self {
        Self {
            started: AtomicU64::new(0),
            committed: AtomicU64::new(0),
            already_applied: AtomicU64::new(0),
            rolled_back: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            stale_reconciliations: AtomicU64::new(0),
            retries: AtomicU64::new(0),
            last_commit_ms: AtomicU64::new(UNSET_TS),
            last_rollback_ms: AtomicU64::new(UNSET_TS),
        }
    }

    fn snapshot(&self) -> MutationMetricsSnapshot {
        MutationMetricsSnapshot {
            started: self.started.load(Ordering::Relaxed),
            committed: self.committed.load(Ordering::Relaxed),
            already_applied: self.already_applied.load(Ordering::Relaxed),
            rolled_back: self.rolled_back.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            stale_reconciliations: self.stale_reconciliations.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            last_commit_ms: timestamp_to_option(self.last_commit_ms.load(Ordering::Relaxed)),
            last_rollback_ms: timestamp_to_option(self.last_rollback_ms.load(Ordering::Relaxed)),
        }
    }

    fn reset(&self) {
        for counter in [
            &self.started,
            &self.committed,
            &self.already_applied,
            &self.rolled_back,
            &self.rejected,
            &self.stale_reconciliations,
            &self.retries,
            &self.last_commit_ms,
            &self.last_rollback_ms,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

static METRICS: LazyLock<MutationMetrics> = LazyLock::new(MutationMetrics::new);

pub fn record_started() {
    METRICS.started.fetch_add(1, Ordering::Relaxed);
}

pub fn record_committed() {
    METRICS.committed.fetch_add(1, Ordering::Relaxed);
    METRICS
        .last_commit_ms
        .store(current_unix_ms(), Ordering::Relaxed);
}

pub fn record_already_applied() {
    METRICS.already_applied.fetch_add(1, Ordering::Relaxed);
    METRICS
        .last_commit_ms
        .store(current_unix_ms(), Ordering::Relaxed);
}

pub fn record_rolled_back() {
    METRICS.rolled_back.fetch_add(1, Ordering::Relaxed);
    METRICS
        .last_rollback_ms
        .store(current_unix_ms(), Ordering::Relaxed);
}

pub fn record_rejected() {
    METRICS.rejected.fetch_add(1, Ordering::Relaxed);
}

pub fn record_stale_reconciliation() {
    METRICS.stale_reconciliations.fetch_add(1, Ordering::Relaxed);
}

pub fn record_retry() {
    METRICS.retries.fetch_add(1, Ordering::Relaxed);
}

pub fn snapshot() -> MutationMetricsSnapshot {
    METRICS.snapshot()
}

pub fn reset() {
    METRICS.reset();
}

#[inline]
pub fn current_unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or(UNSET_TS)
}

#[inline]
pub fn timestamp_to_option(value: u64) -> Option<u64> {
    if value == UNSET_TS {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_counters_snapshot_and_reset() {
        let metrics = MutationMetrics::new();
        metrics.started.fetch_add(2, Ordering::Relaxed);
        metrics.rolled_back.fetch_add(1, Ordering::Relaxed);
        metrics.last_rollback_ms.store(42, Ordering::Relaxed);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.started, 2);
        assert_eq!(snapshot.rolled_back, 1);
        assert_eq!(snapshot.last_rollback_ms, Some(42));
        assert_eq!(snapshot.last_commit_ms, None);

        metrics.reset();
        assert_eq!(metrics.snapshot().started, 0);
        assert_eq!(metrics.snapshot().last_rollback_ms, None);
    }
}

use super::cache_value::CacheValue;
use crate::domain::value_objects::{ActionKind, CacheKey, IdempotencyToken, TargetId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    Pending,
    Committed,
    RolledBack,
}

impl fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AttemptStatus::Pending => "pending",
            AttemptStatus::Committed => "committed",
            AttemptStatus::RolledBack => "rolled_back",
        };
        f.write_str(label)
    }
}

/// One in-memory mutation lifecycle; discarded once committed or rolled back.
#[derive(Debug, Clone)]
pub struct MutationAttempt {
    pub seq: u64,
    pub idempotency_token: IdempotencyToken,
    pub action_kind: ActionKind,
    pub target_id: TargetId,
    pub snapshots: HashMap<CacheKey, Option<CacheValue>>,
    pub status: AttemptStatus,
    pub started_at: DateTime<Utc>,
}

impl MutationAttempt {
    pub fn new(
        seq: u64,
        idempotency_token: IdempotencyToken,
        action_kind: ActionKind,
        target_id: TargetId,
    ) -> Self {
        Self {
            seq,
            idempotency_token,
            action_kind,
            target_id,
            snapshots: HashMap::new(),
            status: AttemptStatus::Pending,
            started_at: Utc::now(),
        }
    }

    pub fn record_snapshot(&mut self, key: CacheKey, prior: Option<CacheValue>) {
        self.snapshots.entry(key).or_insert(prior);
    }

    /// Keys that held a value when the optimistic patch ran.
    pub fn patched_keys(&self) -> impl Iterator<Item = &CacheKey> {
        self.snapshots
            .iter()
            .filter(|(_, prior)| prior.is_some())
            .map(|(key, _)| key)
    }

    pub fn commit(&mut self) {
        self.status = AttemptStatus::Committed;
    }

    pub fn roll_back(&mut self) {
        self.status = AttemptStatus::RolledBack;
    }

    pub fn is_settled(&self) -> bool {
        self.status != AttemptStatus::Pending
    }
}

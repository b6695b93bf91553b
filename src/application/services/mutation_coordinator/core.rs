use super::ledger::{Layer, Ledger};
use super::retry::RetryPolicy;
use crate::application::actions::{ActionAdapter, AttemptContext, Claim, ServerResponse};
use crate::application::ports::{ApiRequest, CredentialProvider, IdempotencyTokenSource, Transport};
use crate::domain::entities::MutationAttempt;
use crate::domain::value_objects::{CacheKey, KeySelector, TargetId};
use crate::infrastructure::cache::CacheStore;
use crate::shared::error::{MutationError, TransportError};
use crate::shared::metrics;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, info_span, warn, Instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationOutcome {
    /// The server confirmed the change and the cache holds its answer.
    Committed,
    /// The server reported the target state was already in place (409).
    AlreadyApplied,
    /// A newer attempt on the same entity already settled; this response was dropped.
    Superseded,
}

struct PendingAttempt {
    attempt: MutationAttempt,
    claim: Claim,
    ctx: AttemptContext,
    adapter: Arc<dyn ActionAdapter>,
}

/// Rolls the attempt back if `perform` is dropped before the server answers.
struct AttemptGuard<'a> {
    coordinator: &'a MutationCoordinator,
    claim: Claim,
    seq: u64,
    keys: Vec<CacheKey>,
    armed: bool,
}

impl<'a> AttemptGuard<'a> {
    fn arm(coordinator: &'a MutationCoordinator, pending: &PendingAttempt) -> Self {
        Self {
            coordinator,
            claim: pending.claim.clone(),
            seq: pending.attempt.seq,
            keys: pending.attempt.patched_keys().cloned().collect(),
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        self.coordinator.roll_back(&self.claim, self.seq, &self.keys);
        // The server may still apply the request.
        self.coordinator.invalidate_exact(&self.keys);
        metrics::record_rolled_back();
        warn!(
            seq = self.seq,
            claim = %self.claim,
            "mutation abandoned before the server answered; rolled back"
        );
    }
}

/// Runs mutation lifecycles: optimistic patch, dispatch, reconcile or roll back.
///
/// Cache work happens synchronously under the ledger lock; the transport call
/// is the only await point of `perform`. Dropping `perform` there rolls the
/// attempt back.
pub struct MutationCoordinator {
    store: CacheStore,
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialProvider>,
    tokens: Arc<dyn IdempotencyTokenSource>,
    retry: RetryPolicy,
    ledger: Mutex<Ledger>,
}

impl MutationCoordinator {
    pub fn new(
        store: CacheStore,
        transport: Arc<dyn Transport>,
        credentials: Arc<dyn CredentialProvider>,
        tokens: Arc<dyn IdempotencyTokenSource>,
    ) -> Self {
        Self {
            store,
            transport,
            credentials,
            tokens,
            retry: RetryPolicy::none(),
            ledger: Mutex::new(Ledger::default()),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Attempts that have patched the cache and are awaiting the server.
    pub fn pending_attempts(&self) -> usize {
        self.lock_ledger().pending_attempts()
    }

    fn lock_ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub async fn perform(
        &self,
        adapter: Arc<dyn ActionAdapter>,
        target: TargetId,
    ) -> Result<MutationOutcome, MutationError> {
        let (bearer, viewer) = match (
            self.credentials.bearer_or_null(),
            self.credentials.viewer_id(),
        ) {
            (Some(bearer), Some(viewer)) => (bearer, viewer),
            _ => {
                metrics::record_rejected();
                warn!(action = %adapter.kind(), target = %target, "mutation rejected: not signed in");
                return Err(MutationError::Unauthenticated);
            }
        };

        if let Err(err) = adapter.precheck(&viewer, &target) {
            metrics::record_rejected();
            warn!(action = %adapter.kind(), target = %target, "mutation rejected: {}", err);
            return Err(err);
        }

        let ctx = AttemptContext {
            token: self.tokens.next(),
            viewer,
            started_at: Utc::now(),
        };
        let span = info_span!(
            "mutation",
            token = %ctx.token,
            action = %adapter.kind(),
            target = %target
        );

        let pending = span.in_scope(|| self.begin(adapter, &target, ctx));
        let request = pending
            .adapter
            .invoke(&target, &pending.ctx.token)
            .with_bearer(&bearer);
        let guard = AttemptGuard::arm(self, &pending);
        let result = self.dispatch(request).instrument(span.clone()).await;
        guard.disarm();

        span.in_scope(|| self.settle(pending, &target, result))
    }

    /// Steps before dispatch: resolve keys, cancel fetches, patch, hold.
    fn begin(
        &self,
        adapter: Arc<dyn ActionAdapter>,
        target: &TargetId,
        ctx: AttemptContext,
    ) -> PendingAttempt {
        let mut ledger = self.lock_ledger();
        let seq = ledger.next_seq();
        let claim = adapter.claim(&ctx, target);
        let mut attempt =
            MutationAttempt::new(seq, ctx.token.clone(), adapter.kind(), target.clone());
        attempt.started_at = ctx.started_at;

        let keys = self.store.resolve(&adapter.affected_keys(target));
        for key in &keys {
            self.store.cancel_in_flight(&key.path());
        }

        let layer = Layer {
            seq,
            claim: claim.clone(),
            adapter: Arc::clone(&adapter),
            ctx: ctx.clone(),
            target: target.clone(),
        };
        for key in keys {
            let Some(prior) = self.store.patch(&key, |current| layer.apply(&key, current)) else {
                continue;
            };
            if ledger.push_layer(key.clone(), prior.clone(), layer.clone()) {
                self.store.hold(&key);
            }
            attempt.record_snapshot(key, Some(prior));
        }
        ledger.open_claim(claim.clone(), seq);
        metrics::record_started();
        debug!(seq, claim = %claim, keys = attempt.snapshots.len(), "optimistic patch applied");

        PendingAttempt {
            attempt,
            claim,
            ctx,
            adapter,
        }
    }

    async fn dispatch(&self, request: ApiRequest) -> Result<Value, TransportError> {
        let mut retries = 0;
        loop {
            match self.transport.send(request.clone()).await {
                Ok(payload) => return Ok(payload),
                Err(err) => {
                    let retryable = MutationError::classify(&err).is_retryable();
                    if !retryable || retries >= self.retry.max_retries {
                        return Err(err);
                    }
                    retries += 1;
                    metrics::record_retry();
                    warn!(retry = retries, "transient failure, resending: {}", err);
                    tokio::time::sleep(self.retry.delay_for(retries)).await;
                }
            }
        }
    }

    fn settle(
        &self,
        pending: PendingAttempt,
        target: &TargetId,
        result: Result<Value, TransportError>,
    ) -> Result<MutationOutcome, MutationError> {
        let PendingAttempt {
            mut attempt,
            claim,
            ctx,
            adapter,
        } = pending;
        let seq = attempt.seq;
        let keys: Vec<CacheKey> = attempt.patched_keys().cloned().collect();

        let response = match result {
            Ok(payload) => ServerResponse::Confirmed(payload),
            Err(err) => match MutationError::classify(&err) {
                MutationError::Conflict(_) => ServerResponse::AlreadyApplied,
                classified => {
                    self.roll_back(&claim, seq, &keys);
                    attempt.roll_back();
                    metrics::record_rolled_back();
                    warn!(code = classified.code(), "mutation rolled back: {}", classified);
                    return Err(classified);
                }
            },
        };

        let superseded = {
            let mut ledger = self.lock_ledger();
            let superseded = ledger.is_superseded(&claim, seq);
            for key in &keys {
                if superseded {
                    ledger.drop_layer(key, seq);
                } else {
                    ledger.reconcile(key, &claim, seq, |base| {
                        adapter.reconcile(&ctx, target, key, base, &response)
                    });
                }
            }
            ledger.close_claim(&claim, seq, !superseded);
            self.republish(&mut ledger, &keys);
            superseded
        };
        attempt.commit();

        if superseded {
            // The server applied a change the cache no longer shows.
            self.invalidate_exact(&keys);
            metrics::record_stale_reconciliation();
            let stale = MutationError::StaleReconciliation(ctx.token.to_string());
            debug!("{}; newer attempt owns {}", stale, claim);
            return Ok(MutationOutcome::Superseded);
        }

        let outcome = if response.is_already_applied() {
            // The server's count is unknown after a conflict; refresh lazily.
            self.invalidate_exact(&keys);
            metrics::record_already_applied();
            MutationOutcome::AlreadyApplied
        } else {
            metrics::record_committed();
            MutationOutcome::Committed
        };
        self.store.invalidate(&adapter.dependent_keys(target), false);
        info!(outcome = ?outcome, keys = keys.len(), "mutation settled");
        Ok(outcome)
    }

    fn roll_back(&self, claim: &Claim, seq: u64, keys: &[CacheKey]) {
        let mut ledger = self.lock_ledger();
        for key in keys {
            ledger.drop_layer(key, seq);
        }
        ledger.close_claim(claim, seq, false);
        self.republish(&mut ledger, keys);
    }

    fn invalidate_exact(&self, keys: &[CacheKey]) {
        if keys.is_empty() {
            return;
        }
        let exact: Vec<KeySelector> = keys.iter().cloned().map(KeySelector::Exact).collect();
        self.store.invalidate(&exact, false);
    }

    /// Writes the recomputed live values back and releases emptied keys.
    fn republish(&self, ledger: &mut Ledger, keys: &[CacheKey]) {
        for key in keys {
            let Some(settled) = ledger.settle_key(key) else {
                continue;
            };
            let value = settled.value;
            self.store.patch(key, move |_| value);
            if settled.released {
                self.store.release(key);
            }
        }
    }
}

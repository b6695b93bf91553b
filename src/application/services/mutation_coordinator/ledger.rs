use crate::application::actions::{ActionAdapter, AttemptContext, Claim};
use crate::domain::entities::CacheValue;
use crate::domain::value_objects::{CacheKey, TargetId};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// One pending attempt's contribution to a key.
#[derive(Clone)]
pub(super) struct Layer {
    pub seq: u64,
    pub claim: Claim,
    pub adapter: Arc<dyn ActionAdapter>,
    pub ctx: AttemptContext,
    pub target: TargetId,
}

impl Layer {
    pub fn apply(&self, key: &CacheKey, value: &CacheValue) -> CacheValue {
        self.adapter
            .optimistic_patch(&self.ctx, &self.target, key, value)
    }
}

/// `base` is the value observed before the first pending attempt touched the
/// key; the live value is `base` with every layer replayed in start order.
struct KeyLedger {
    base: CacheValue,
    layers: Vec<Layer>,
}

impl KeyLedger {
    fn live(&self, key: &CacheKey) -> CacheValue {
        self.layers
            .iter()
            .fold(self.base.clone(), |value, layer| layer.apply(key, &value))
    }
}

#[derive(Default)]
struct ClaimState {
    pending: BTreeSet<u64>,
    settled: Option<u64>,
}

pub(super) struct Settled {
    pub value: CacheValue,
    /// No layers remain; the key's hold can be released.
    pub released: bool,
}

#[derive(Default)]
pub(super) struct Ledger {
    keys: HashMap<CacheKey, KeyLedger>,
    claims: HashMap<Claim, ClaimState>,
    last_seq: u64,
}

impl Ledger {
    pub fn next_seq(&mut self) -> u64 {
        self.last_seq += 1;
        self.last_seq
    }

    /// Returns true when this is the key's first layer (the caller holds the key).
    pub fn push_layer(&mut self, key: CacheKey, prior: CacheValue, layer: Layer) -> bool {
        match self.keys.get_mut(&key) {
            Some(ledger) => {
                ledger.layers.push(layer);
                false
            }
            None => {
                self.keys.insert(
                    key,
                    KeyLedger {
                        base: prior,
                        layers: vec![layer],
                    },
                );
                true
            }
        }
    }

    pub fn open_claim(&mut self, claim: Claim, seq: u64) {
        self.claims.entry(claim).or_default().pending.insert(seq);
    }

    /// A newer attempt on the same claim has already succeeded.
    pub fn is_superseded(&self, claim: &Claim, seq: u64) -> bool {
        self.claims
            .get(claim)
            .and_then(|state| state.settled)
            .is_some_and(|settled| settled > seq)
    }

    pub fn close_claim(&mut self, claim: &Claim, seq: u64, succeeded: bool) {
        let Some(state) = self.claims.get_mut(claim) else {
            return;
        };
        state.pending.remove(&seq);
        if succeeded {
            state.settled = Some(state.settled.map_or(seq, |settled| settled.max(seq)));
        }
        if state.pending.is_empty() {
            self.claims.remove(claim);
        }
    }

    /// Folds a confirmed attempt into the base and drops its layer together
    /// with every older layer of the same claim.
    pub fn reconcile<F>(&mut self, key: &CacheKey, claim: &Claim, seq: u64, reconcile: F)
    where
        F: FnOnce(&CacheValue) -> CacheValue,
    {
        let Some(ledger) = self.keys.get_mut(key) else {
            return;
        };
        ledger.base = reconcile(&ledger.base);
        ledger
            .layers
            .retain(|layer| !(&layer.claim == claim && layer.seq <= seq));
    }

    pub fn drop_layer(&mut self, key: &CacheKey, seq: u64) {
        if let Some(ledger) = self.keys.get_mut(key) {
            ledger.layers.retain(|layer| layer.seq != seq);
        }
    }

    /// Recomputes the live value; an emptied ledger is removed.
    pub fn settle_key(&mut self, key: &CacheKey) -> Option<Settled> {
        let ledger = self.keys.get(key)?;
        let value = ledger.live(key);
        let released = ledger.layers.is_empty();
        if released {
            self.keys.remove(key);
        }
        Some(Settled { value, released })
    }

    pub fn pending_attempts(&self) -> usize {
        self.claims.values().map(|state| state.pending.len()).sum()
    }

    #[cfg(test)]
    pub fn tracked_keys(&self) -> usize {
        self.keys.len()
    }
}

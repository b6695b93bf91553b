use crate::application::ports::QueryFetcher;
use crate::domain::entities::{CacheValue, SuggestionEntry};
use crate::domain::value_objects::{CacheKey, KeySelector, UserId};
use crate::shared::error::AppError;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, warn};

struct InFlight {
    fetch_id: u64,
    handle: AbortHandle,
}

struct CacheEntry {
    sender: watch::Sender<Option<CacheValue>>,
    stale: bool,
    in_flight: Option<InFlight>,
    idle_since: Option<Instant>,
}

impl CacheEntry {
    fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            sender,
            stale: false,
            in_flight: None,
            idle_since: None,
        }
    }

    fn value(&self) -> Option<CacheValue> {
        (*self.sender.borrow()).clone()
    }

    fn cancel_fetch(&mut self) -> bool {
        match self.in_flight.take() {
            Some(in_flight) => {
                in_flight.handle.abort();
                true
            }
            None => false,
        }
    }
}

#[derive(Default)]
struct StoreState {
    entries: HashMap<CacheKey, CacheEntry>,
    holds: HashMap<CacheKey, usize>,
}

impl StoreState {
    fn is_held(&self, key: &CacheKey) -> bool {
        self.holds.contains_key(key)
    }

    fn publish(&mut self, key: &CacheKey, value: CacheValue) {
        if let Some(entry) = self.entries.get(key) {
            entry.sender.send_replace(Some(value));
        }
        if let CacheKey::FollowerSummary { user_id } = key {
            self.touch_suggestions(user_id);
        }
    }

    /// Suggestion lists render follower data from the canonical summaries,
    /// so their observers are woken whenever a listed user's summary changes.
    fn touch_suggestions(&self, user_id: &UserId) {
        let Some(list) = self.entries.get(&CacheKey::SuggestionList) else {
            return;
        };
        let mentioned = list
            .sender
            .borrow()
            .as_ref()
            .is_some_and(|value| value.mentions_user(user_id));
        if mentioned {
            list.sender.send_modify(|_| {});
        }
    }

    fn seed_summaries(&mut self, suggestions: &[SuggestionEntry]) {
        for suggestion in suggestions {
            let key = CacheKey::follower_summary(&suggestion.user_id);
            if self.is_held(&key) {
                continue;
            }
            let seeded = CacheValue::FollowerSummary(suggestion.summary());
            let entry = self.entries.entry(key).or_insert_with(CacheEntry::new);
            entry.stale = false;
            entry.sender.send_if_modified(|current| {
                if current.as_ref() == Some(&seeded) {
                    false
                } else {
                    *current = Some(seeded.clone());
                    true
                }
            });
        }
    }

    fn referenced_by_suggestions(&self, key: &CacheKey) -> bool {
        let CacheKey::FollowerSummary { user_id } = key else {
            return false;
        };
        self.entries
            .get(&CacheKey::SuggestionList)
            .is_some_and(|list| {
                list.sender
                    .borrow()
                    .as_ref()
                    .is_some_and(|value| value.mentions_user(user_id))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatus {
    pub entries: usize,
    pub stale: usize,
    pub in_flight: usize,
    pub held: usize,
}

struct StoreInner {
    state: Mutex<StoreState>,
    fetcher: Arc<dyn QueryFetcher>,
    retention: Duration,
    next_fetch_id: AtomicU64,
}

/// Process-wide, key-addressed store of cached views.
///
/// Every operation is synchronous and never holds the state lock across an
/// await point; background fetches run as spawned tasks that re-enter the
/// store only to publish their result.
#[derive(Clone)]
pub struct CacheStore {
    inner: Arc<StoreInner>,
}

impl CacheStore {
    pub fn new(fetcher: Arc<dyn QueryFetcher>, retention: Duration) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                state: Mutex::new(StoreState::default()),
                fetcher,
                retention,
                next_fetch_id: AtomicU64::new(1),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        // A panic while holding the lock cannot leave an entry half-written,
        // so a poisoned state is still usable.
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns the current value; schedules a background fetch when the key
    /// is absent or stale.
    pub fn read(&self, key: &CacheKey) -> Option<CacheValue> {
        let mut state = self.lock();
        self.touch_entry(&mut state, key).value()
    }

    pub fn subscribe(&self, key: &CacheKey) -> watch::Receiver<Option<CacheValue>> {
        let mut state = self.lock();
        self.touch_entry(&mut state, key).sender.subscribe()
    }

    /// Current value without triggering a fetch.
    pub fn peek(&self, key: &CacheKey) -> Option<CacheValue> {
        let state = self.lock();
        state.entries.get(key).and_then(CacheEntry::value)
    }

    pub fn is_stale(&self, key: &CacheKey) -> bool {
        let state = self.lock();
        state.entries.get(key).is_some_and(|entry| entry.stale)
    }

    fn touch_entry<'a>(&self, state: &'a mut StoreState, key: &CacheKey) -> &'a mut CacheEntry {
        let held = state.is_held(key);
        let entry = state
            .entries
            .entry(key.clone())
            .or_insert_with(CacheEntry::new);
        entry.idle_since = None;
        let needs_fetch = entry.sender.borrow().is_none() || entry.stale;
        if needs_fetch && entry.in_flight.is_none() && !held {
            self.schedule_fetch(key, entry);
        }
        entry
    }

    /// Write-through used by fetch completion and by consumers seeding data
    /// they already hold. Returns false when the key is held by a pending
    /// mutation; the entry is then only marked stale.
    pub fn insert(&self, key: CacheKey, value: CacheValue) -> bool {
        let mut state = self.lock();
        if state.is_held(&key) {
            if let Some(entry) = state.entries.get_mut(&key) {
                entry.stale = true;
            }
            debug!(key = %key, "insert skipped for held key");
            return false;
        }
        let entry = state
            .entries
            .entry(key.clone())
            .or_insert_with(CacheEntry::new);
        entry.cancel_fetch();
        entry.stale = false;
        if let CacheValue::SuggestionList(suggestions) = &value {
            state.seed_summaries(suggestions);
        }
        state.publish(&key, value);
        true
    }

    /// Applies `updater` to the present value and notifies observers before
    /// returning the prior value. Absent keys are left untouched.
    pub fn patch<F>(&self, key: &CacheKey, updater: F) -> Option<CacheValue>
    where
        F: FnOnce(&CacheValue) -> CacheValue,
    {
        let mut state = self.lock();
        let prior = state.entries.get(key).and_then(CacheEntry::value)?;
        let next = updater(&prior);
        debug!(key = %key, "cache patched");
        state.publish(key, next);
        Some(prior)
    }

    /// Marks every present entry matching the selectors stale.
    pub fn invalidate(&self, selectors: &[KeySelector], refetch: bool) -> usize {
        let mut state = self.lock();
        let keys: Vec<CacheKey> = state
            .entries
            .keys()
            .filter(|key| selectors.iter().any(|selector| selector.matches(key)))
            .cloned()
            .collect();

        for key in &keys {
            let held = state.is_held(key);
            if let Some(entry) = state.entries.get_mut(key) {
                entry.stale = true;
                if refetch && !held {
                    self.schedule_fetch(key, entry);
                }
            }
        }
        debug!(count = keys.len(), refetch, "cache entries invalidated");
        keys.len()
    }

    /// Aborts background fetches whose key path starts with `prefix`.
    /// The entries stay stale so a later read refreshes them.
    pub fn cancel_in_flight(&self, prefix: &str) -> usize {
        let mut state = self.lock();
        let mut cancelled = 0;
        for (key, entry) in state.entries.iter_mut() {
            if key.has_prefix(prefix) && entry.cancel_fetch() {
                entry.stale = true;
                cancelled += 1;
            }
        }
        if cancelled > 0 {
            debug!(prefix, cancelled, "background fetches cancelled");
        }
        cancelled
    }

    /// Present keys matching any selector, in path order.
    pub fn resolve(&self, selectors: &[KeySelector]) -> Vec<CacheKey> {
        let state = self.lock();
        let mut keys: Vec<CacheKey> = state
            .entries
            .iter()
            .filter(|(key, entry)| {
                entry.sender.borrow().is_some()
                    && selectors.iter().any(|selector| selector.matches(key))
            })
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort_by_key(CacheKey::path);
        keys
    }

    pub fn hold(&self, key: &CacheKey) {
        let mut state = self.lock();
        *state.holds.entry(key.clone()).or_insert(0) += 1;
    }

    /// Drops one hold; an observed key that went stale meanwhile is refreshed.
    pub fn release(&self, key: &CacheKey) {
        let mut state = self.lock();
        let remaining = match state.holds.get_mut(key) {
            Some(count) => {
                *count = count.saturating_sub(1);
                *count
            }
            None => return,
        };
        if remaining > 0 {
            return;
        }
        state.holds.remove(key);
        if let Some(entry) = state.entries.get_mut(key) {
            if entry.stale && entry.in_flight.is_none() && entry.sender.receiver_count() > 0 {
                self.schedule_fetch(key, entry);
            }
        }
    }

    /// Suggestion list joined with the canonical follower summaries.
    pub fn suggestions(&self) -> Option<Vec<SuggestionEntry>> {
        let mut state = self.lock();
        let list = self.touch_entry(&mut state, &CacheKey::SuggestionList).value()?;
        let entries = list.as_suggestions()?;
        Some(
            entries
                .iter()
                .map(|entry| {
                    let canonical = state
                        .entries
                        .get(&CacheKey::follower_summary(&entry.user_id))
                        .and_then(CacheEntry::value);
                    match canonical.as_ref().and_then(CacheValue::as_follower_summary) {
                        Some(summary) => entry.clone().with_summary(*summary),
                        None => entry.clone(),
                    }
                })
                .collect(),
        )
    }

    /// Removes entries that have been unobserved, unheld and idle for the
    /// retention period. Returns how many were dropped.
    pub fn collect_garbage(&self, now: Instant) -> usize {
        let mut state = self.lock();
        let retention = self.inner.retention;
        let mut expired = Vec::new();

        let keys: Vec<CacheKey> = state.entries.keys().cloned().collect();
        for key in keys {
            let pinned = state.is_held(&key) || state.referenced_by_suggestions(&key);
            let Some(entry) = state.entries.get_mut(&key) else {
                continue;
            };
            let idle =
                entry.sender.receiver_count() == 0 && entry.in_flight.is_none() && !pinned;
            if !idle {
                entry.idle_since = None;
                continue;
            }
            match entry.idle_since {
                None => entry.idle_since = Some(now),
                Some(since) if now.saturating_duration_since(since) >= retention => {
                    expired.push(key)
                }
                Some(_) => {}
            }
        }

        for key in &expired {
            state.entries.remove(key);
        }
        if !expired.is_empty() {
            debug!(removed = expired.len(), "cache entries collected");
        }
        expired.len()
    }

    /// Runs `collect_garbage` on a fixed interval until the store is dropped.
    pub fn spawn_gc(&self, interval: Duration) -> Option<JoinHandle<()>> {
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                warn!("no async runtime available; cache garbage collection disabled");
                return None;
            }
        };
        let weak: Weak<StoreInner> = Arc::downgrade(&self.inner);
        Some(runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                CacheStore { inner }.collect_garbage(Instant::now());
            }
        }))
    }

    pub fn status(&self) -> CacheStatus {
        let state = self.lock();
        CacheStatus {
            entries: state.entries.len(),
            stale: state.entries.values().filter(|entry| entry.stale).count(),
            in_flight: state
                .entries
                .values()
                .filter(|entry| entry.in_flight.is_some())
                .count(),
            held: state.holds.len(),
        }
    }

    fn schedule_fetch(&self, key: &CacheKey, entry: &mut CacheEntry) {
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                warn!(key = %key, "no async runtime available; background fetch skipped");
                return;
            }
        };
        entry.cancel_fetch();

        let fetch_id = self.inner.next_fetch_id.fetch_add(1, Ordering::Relaxed);
        let store = self.clone();
        let fetcher = Arc::clone(&self.inner.fetcher);
        let task_key = key.clone();
        let handle = runtime.spawn(async move {
            let result = fetcher.fetch(&task_key).await;
            store.complete_fetch(&task_key, fetch_id, result);
        });
        entry.in_flight = Some(InFlight {
            fetch_id,
            handle: handle.abort_handle(),
        });
        debug!(key = %key, fetch_id, "background fetch scheduled");
    }

    fn complete_fetch(&self, key: &CacheKey, fetch_id: u64, result: Result<CacheValue, AppError>) {
        let mut state = self.lock();
        let held = state.is_held(key);
        let Some(entry) = state.entries.get_mut(key) else {
            return;
        };
        match &entry.in_flight {
            Some(in_flight) if in_flight.fetch_id == fetch_id => entry.in_flight = None,
            _ => {
                debug!(key = %key, fetch_id, "superseded fetch result ignored");
                return;
            }
        }

        let value = match result {
            Ok(value) => value,
            Err(e) => {
                warn!(key = %key, "background fetch failed: {}", e);
                return;
            }
        };

        if held {
            entry.stale = true;
            debug!(key = %key, "fetch result dropped for held key");
            return;
        }
        entry.stale = false;
        if let CacheValue::SuggestionList(suggestions) = &value {
            state.seed_summaries(suggestions);
        }
        state.publish(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::FollowerSummary;
    use crate::domain::value_objects::{CacheKind, FeedScope};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct FakeFetcher {
        values: Mutex<HashMap<CacheKey, CacheValue>>,
        gate: Option<Arc<Notify>>,
        calls: AtomicUsize,
    }

    impl FakeFetcher {
        fn with_value(key: CacheKey, value: CacheValue) -> Self {
            let fetcher = Self::default();
            fetcher.values.lock().unwrap().insert(key, value);
            fetcher
        }

        fn gated(mut self, gate: Arc<Notify>) -> Self {
            self.gate = Some(gate);
            self
        }
    }

    #[async_trait]
    impl QueryFetcher for FakeFetcher {
        async fn fetch(&self, key: &CacheKey) -> Result<CacheValue, AppError> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.values
                .lock()
                .unwrap()
                .get(key)
                .cloned()
                .ok_or_else(|| AppError::NotFound(key.path()))
        }
    }

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    fn summary(count: u64, followed: bool) -> CacheValue {
        CacheValue::FollowerSummary(FollowerSummary::new(count, followed))
    }

    fn suggestion(id: &str, count: u64) -> SuggestionEntry {
        SuggestionEntry {
            user_id: user(id),
            display_name: id.to_uppercase(),
            follower_count: count,
            is_followed_by_viewer: false,
        }
    }

    fn store_with(fetcher: FakeFetcher) -> CacheStore {
        CacheStore::new(Arc::new(fetcher), Duration::from_secs(60))
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn read_of_absent_key_fetches_in_background_and_notifies() {
        let key = CacheKey::follower_summary(&user("u1"));
        let store = store_with(FakeFetcher::with_value(key.clone(), summary(7, false)));

        let mut rx = store.subscribe(&key);
        assert_eq!(store.read(&key), None);

        tokio::time::timeout(Duration::from_secs(1), rx.changed())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(*rx.borrow(), Some(summary(7, false)));
        assert!(!store.is_stale(&key));
    }

    #[tokio::test]
    async fn patch_notifies_synchronously_and_returns_prior() {
        let key = CacheKey::follower_summary(&user("u1"));
        let store = store_with(FakeFetcher::default());
        store.insert(key.clone(), summary(10, false));
        let rx = store.subscribe(&key);

        let prior = store.patch(&key, |_| summary(11, true));

        assert_eq!(prior, Some(summary(10, false)));
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow(), Some(summary(11, true)));
    }

    #[tokio::test]
    async fn patch_on_absent_key_is_a_no_op() {
        let store = store_with(FakeFetcher::default());
        let key = CacheKey::follower_summary(&user("ghost"));

        assert_eq!(store.patch(&key, |_| summary(1, true)), None);
        assert_eq!(store.peek(&key), None);
    }

    #[tokio::test]
    async fn cancel_in_flight_discards_late_results() {
        let gate = Arc::new(Notify::new());
        let key = CacheKey::post_engagement(&"p1".parse().unwrap());
        let fetcher = FakeFetcher::with_value(
            key.clone(),
            CacheValue::PostEngagement(Default::default()),
        )
        .gated(Arc::clone(&gate));
        let store = store_with(fetcher);

        store.read(&key);
        assert_eq!(store.status().in_flight, 1);

        assert_eq!(store.cancel_in_flight("post-engagement:p1"), 1);
        gate.notify_waiters();
        settle().await;

        assert_eq!(store.peek(&key), None);
        assert!(store.is_stale(&key));
        assert_eq!(store.status().in_flight, 0);
    }

    #[tokio::test]
    async fn held_keys_keep_their_value_and_stay_stale() {
        let key = CacheKey::follower_summary(&user("u1"));
        let store = store_with(FakeFetcher::with_value(key.clone(), summary(99, false)));
        store.insert(key.clone(), summary(10, true));
        store.hold(&key);

        store.invalidate(&[KeySelector::Exact(key.clone())], true);
        settle().await;

        assert_eq!(store.peek(&key), Some(summary(10, true)));
        assert!(store.is_stale(&key));
        assert!(!store.insert(key.clone(), summary(1, false)));

        let mut rx = store.subscribe(&key);
        store.release(&key);
        tokio::time::timeout(Duration::from_secs(1), rx.changed())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(store.peek(&key), Some(summary(99, false)));
    }

    #[tokio::test]
    async fn suggestion_list_is_derived_from_canonical_summaries() {
        let store = store_with(FakeFetcher::default());
        store.insert(
            CacheKey::SuggestionList,
            CacheValue::SuggestionList(vec![suggestion("u1", 41), suggestion("u2", 3)]),
        );
        let summary_key = CacheKey::follower_summary(&user("u1"));
        assert_eq!(store.peek(&summary_key), Some(summary(41, false)));

        let list_rx = store.subscribe(&CacheKey::SuggestionList);
        store.patch(&summary_key, |_| summary(42, true));

        assert!(list_rx.has_changed().unwrap());
        let joined = store.suggestions().unwrap();
        assert_eq!(joined[0].follower_count, 42);
        assert!(joined[0].is_followed_by_viewer);
        assert_eq!(joined[1].follower_count, 3);
    }

    #[tokio::test]
    async fn resolve_expands_kind_selectors_over_present_keys() {
        let store = store_with(FakeFetcher::default());
        let home = CacheKey::feed_page(FeedScope::Home, 0);
        store.insert(home.clone(), CacheValue::FeedPage(Default::default()));
        store.insert(CacheKey::follower_summary(&user("u1")), summary(1, false));

        let keys = store.resolve(&[KeySelector::Kind(CacheKind::FeedPage)]);
        assert_eq!(keys, vec![home]);
    }

    #[tokio::test]
    async fn garbage_collection_respects_observers_and_retention() {
        let store = store_with(FakeFetcher::default());
        let watched = CacheKey::follower_summary(&user("u1"));
        let idle = CacheKey::follower_summary(&user("u2"));
        store.insert(watched.clone(), summary(1, false));
        store.insert(idle.clone(), summary(2, false));
        let _rx = store.subscribe(&watched);

        let start = Instant::now();
        assert_eq!(store.collect_garbage(start), 0);
        assert_eq!(store.collect_garbage(start + Duration::from_secs(30)), 0);
        assert_eq!(store.collect_garbage(start + Duration::from_secs(61)), 1);

        assert_eq!(store.peek(&idle), None);
        assert_eq!(store.peek(&watched), Some(summary(1, false)));
    }
}

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::debug;

use crate::domain::ExtractedValue;

/// How long a pipeline keeps its cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheScope {
    /// A fresh cache for every batch
    PerRun,
    /// One cache reused by every batch of the same pipeline
    #[default]
    Shared,
}

type Slot = Arc<OnceCell<Option<ExtractedValue>>>;

/// Memoized lookup results keyed by identifier.
///
/// Each key owns its own once-cell, so a slow computation for one
/// identifier never blocks lookups for another. Entries are write-once.
#[derive(Default)]
pub struct ResultCache {
    entries: DashMap<String, Slot>,
    hits: AtomicUsize,
    computations: AtomicUsize,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, identifier: &str) -> Slot {
        // The shard guard is released at the end of this statement, before any await
        self.entries
            .entry(identifier.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .value()
            .clone()
    }

    /// Return the stored value for `identifier`, running `compute` only if
    /// no value exists yet. Concurrent callers for the same key wait for a
    /// single computation instead of starting their own.
    pub async fn get_or_compute<F, Fut>(&self, identifier: &str, compute: F) -> Option<ExtractedValue>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<ExtractedValue>>,
    {
        let slot = self.slot(identifier);

        if let Some(value) = slot.get() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Cache hit for {}", identifier);
            return *value;
        }

        let mut ran = false;
        let value = *slot
            .get_or_init(|| {
                ran = true;
                self.computations.fetch_add(1, Ordering::Relaxed);
                compute()
            })
            .await;

        if !ran {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Joined in-flight lookup for {}", identifier);
        }

        value
    }

    /// Insert a known value. Returns false if the key was already resolved.
    pub fn seed(&self, identifier: &str, value: Option<ExtractedValue>) -> bool {
        self.slot(identifier).set(value).is_ok()
    }

    /// Resolved value for `identifier`; the outer `None` means "not cached".
    pub fn get(&self, identifier: &str) -> Option<Option<ExtractedValue>> {
        self.entries
            .get(identifier)
            .and_then(|slot| slot.value().get().copied())
    }

    /// Number of resolved entries.
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.value().initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    /// How many times a compute closure actually ran.
    pub fn computations(&self) -> usize {
        self.computations.load(Ordering::Relaxed)
    }

    /// Resolved entries, sorted by identifier.
    pub fn snapshot(&self) -> Vec<(String, Option<ExtractedValue>)> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .filter_map(|entry| entry.value().get().map(|v| (entry.key().clone(), *v)))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

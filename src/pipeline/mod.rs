//! Batch enrichment: identifiers in, weights out, same order.
//!
//! ```text
//! identifiers → dedup → map_bounded(fetch → extract, via cache) → reorder
//! ```

mod config;

pub use config::PipelineConfig;

use std::collections::{HashMap, HashSet};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, error, info};

use crate::cache::{CacheScope, ResultCache};
use crate::concurrency::map_bounded;
use crate::domain::{BatchResult, ExtractedValue};
use crate::extractor::Extractor;
use crate::fetcher::{FetchOutcome, RetryingFetcher};

pub struct EnrichmentPipeline {
    fetcher: RetryingFetcher,
    extractor: Arc<Extractor>,
    workers: usize,
    scope: CacheScope,
    cache: Arc<ResultCache>,
}

impl EnrichmentPipeline {
    pub fn new(fetcher: RetryingFetcher, extractor: Extractor, config: &PipelineConfig) -> Self {
        Self {
            fetcher,
            extractor: Arc::new(extractor),
            workers: config.workers.max(1),
            scope: config.cache_scope,
            cache: Arc::new(ResultCache::new()),
        }
    }

    /// Share an existing cache across every batch of this pipeline.
    pub fn with_cache(mut self, cache: Arc<ResultCache>) -> Self {
        self.cache = cache;
        self.scope = CacheScope::Shared;
        self
    }

    pub fn scope(&self) -> CacheScope {
        self.scope
    }

    /// The cache shared between batches. Unused when the scope is per-run.
    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    /// Resolve every identifier. The result always has one entry per input,
    /// in input order; failures of any kind show up as `None`.
    pub async fn enrich(&self, identifiers: &[String]) -> BatchResult {
        let cache = match self.scope {
            CacheScope::PerRun => Arc::new(ResultCache::new()),
            CacheScope::Shared => self.cache.clone(),
        };
        self.enrich_with(cache, identifiers).await
    }

    /// Like [`enrich`](Self::enrich), with an explicit cache for this batch.
    pub async fn enrich_with(&self, cache: Arc<ResultCache>, identifiers: &[String]) -> BatchResult {
        let mut seen = HashSet::new();
        let unique: Vec<String> = identifiers
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect();

        info!(
            "Enriching {} identifiers ({} unique) with {} workers",
            identifiers.len(),
            unique.len(),
            self.workers
        );

        let fetcher = self.fetcher.clone();
        let extractor = self.extractor.clone();
        let task_cache = cache.clone();

        let resolved = map_bounded(unique.clone(), self.workers, move |identifier: String| {
            let fetcher = fetcher.clone();
            let extractor = extractor.clone();
            let cache = task_cache.clone();
            async move {
                cache
                    .get_or_compute(&identifier, || lookup(&fetcher, &extractor, &identifier))
                    .await
            }
        })
        .await;

        let by_id: HashMap<String, Option<ExtractedValue>> = unique
            .into_iter()
            .zip(resolved)
            .map(|(id, value)| (id, value.flatten()))
            .collect();

        let results: BatchResult = identifiers
            .iter()
            .map(|id| by_id.get(id).copied().flatten())
            .collect();

        let found = results.iter().filter(|v| v.is_some()).count();
        info!(
            "Batch complete: {}/{} resolved, {} pages computed and {} cache hits so far",
            found,
            results.len(),
            cache.computations(),
            cache.hits()
        );

        results
    }

    /// Resolve a single identifier through the same cache and retry path.
    pub async fn resolve(&self, identifier: &str) -> Option<ExtractedValue> {
        self.enrich(&[identifier.to_string()])
            .await
            .into_iter()
            .next()
            .flatten()
    }
}

/// Fetch and extract one identifier. Faults are turned into `None` here so
/// the cache records them instead of leaving the key unresolved.
async fn lookup(
    fetcher: &RetryingFetcher,
    extractor: &Extractor,
    identifier: &str,
) -> Option<ExtractedValue> {
    if identifier.trim().is_empty() {
        debug!("Skipping empty identifier");
        return None;
    }

    let attempt = async {
        match fetcher.fetch(identifier).await {
            FetchOutcome::Page(page) => {
                let value = extractor.extract(&page.body);
                if value.is_none() {
                    debug!("No weight found on page for {}", identifier);
                }
                value
            }
            FetchOutcome::Failed(_) => None,
        }
    };

    match AssertUnwindSafe(attempt).catch_unwind().await {
        Ok(value) => value,
        Err(_) => {
            error!("Lookup for {} panicked", identifier);
            None
        }
    }
}

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use crate::app::error::{Result, WeighbridgeError};
use crate::cache::{CacheScope, ResultCache};
use crate::config::Config;
use crate::domain::{BatchResult, StoredWeight};
use crate::extractor::Extractor;
use crate::fetcher::{Fetcher, HttpFetcher, RetryingFetcher};
use crate::pipeline::EnrichmentPipeline;
use crate::store::{SqliteStore, Store};

pub struct AppContext {
    pub config: Config,
    pub store: Arc<SqliteStore>,
    pub pipeline: EnrichmentPipeline,
}

impl AppContext {
    pub fn new(config: Config, db_path: Option<PathBuf>) -> Result<Self> {
        let db_path = match db_path {
            Some(p) => p,
            None => Self::default_db_path()?,
        };
        let store = Arc::new(SqliteStore::new(&db_path)?);
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::new(&config.fetch)?);
        Self::with_parts(config, store, fetcher)
    }

    pub fn in_memory(config: Config) -> Result<Self> {
        let store = Arc::new(SqliteStore::in_memory()?);
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::new(&config.fetch)?);
        Self::with_parts(config, store, fetcher)
    }

    /// Wire a context around an arbitrary single-attempt fetcher.
    pub fn with_parts(
        config: Config,
        store: Arc<SqliteStore>,
        fetcher: Arc<dyn Fetcher + Send + Sync>,
    ) -> Result<Self> {
        let fetcher = RetryingFetcher::new(
            fetcher,
            config.fetch.retry_policy(),
            config.fetch.pacing(),
        );
        let extractor = Extractor::new(&config.extract)?;
        let pipeline = EnrichmentPipeline::new(fetcher, extractor, &config.pipeline);

        Ok(Self {
            config,
            store,
            pipeline,
        })
    }

    /// Run a batch. With `persist`, stored weights are used instead of
    /// fetching and newly found ones are written back.
    pub async fn enrich(&self, identifiers: &[String], persist: bool) -> Result<BatchResult> {
        if !persist {
            return Ok(self.pipeline.enrich(identifiers).await);
        }

        let cache = match self.pipeline.scope() {
            CacheScope::PerRun => Arc::new(ResultCache::new()),
            CacheScope::Shared => self.pipeline.cache().clone(),
        };
        let mut warmed = 0;
        let unique: HashSet<&str> = identifiers.iter().map(String::as_str).collect();
        for id in &unique {
            if let Some(stored) = self.store.get_weight(id)? {
                if cache.seed(id, stored.value) {
                    warmed += 1;
                }
            }
        }
        if warmed > 0 {
            tracing::debug!("Warmed cache with {} stored weights", warmed);
        }

        let results = self.pipeline.enrich_with(cache, identifiers).await;

        // Misses are not stored: a later run may succeed where this one failed
        let mut written = HashSet::new();
        let found: Vec<StoredWeight> = identifiers
            .iter()
            .zip(&results)
            .filter_map(|(id, value)| value.map(|v| (id, v)))
            .filter(|(id, _)| written.insert(id.as_str()))
            .map(|(id, v)| StoredWeight::new(id.as_str(), Some(v)))
            .collect();
        let added = self.store.add_weights(&found)?;
        tracing::info!("Stored {} new weights", added);

        Ok(results)
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| WeighbridgeError::Other("Could not find data directory".into()))?;
        let app_dir = data_dir.join("weighbridge");
        std::fs::create_dir_all(&app_dir)?;
        Ok(app_dir.join("weighbridge.db"))
    }
}

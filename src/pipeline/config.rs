use serde::{Deserialize, Serialize};

use crate::cache::CacheScope;
use crate::concurrency::DEFAULT_WORKERS;

/// Batch-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum identifiers resolved at once (default: 5)
    pub workers: usize,

    /// Keep results between batches ("shared") or start clean ("per_run")
    pub cache_scope: CacheScope,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            cache_scope: CacheScope::Shared,
        }
    }
}

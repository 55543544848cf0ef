//! # weighbridge
//!
//! Resolves product weights for lists of catalog identifiers by scraping
//! each identifier's product page.
//!
//! ## Architecture
//!
//! ```text
//! identifiers → EnrichmentPipeline → map_bounded → ResultCache
//!                                                 → RetryingFetcher → Extractor
//! ```
//!
//! - [`fetcher`]: single-attempt HTTP fetch plus retry, backoff and pacing
//! - [`extractor`]: ordered chain of weight extraction strategies
//! - [`cache`]: per-identifier memoization with single-flight computation
//! - [`concurrency`]: bounded, order-preserving parallel map
//! - [`pipeline`]: the batch entry point
//!
//! ## Quick Start
//!
//! ```bash
//! # Resolve a few identifiers
//! weighbridge enrich 4006381333931 8710103832564
//!
//! # Resolve a file of identifiers, one per line, as JSON
//! weighbridge enrich --input codes.txt --json
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together config,
/// pipeline and store.
pub mod app;

/// Per-identifier result cache.
pub mod cache;

/// Command-line interface using clap.
///
/// - `enrich [IDS...] [--input FILE]` - Resolve a batch
/// - `get <id>` - Resolve one identifier
/// - `stored` - List stored weights
/// - `forget [id]` - Delete stored weights
pub mod cli;

/// Bounded-concurrency map that keeps input order.
pub mod concurrency;

/// Configuration loaded from `~/.config/weighbridge/config.toml`.
pub mod config;

/// Core domain models.
///
/// - [`ExtractedValue`](domain::ExtractedValue): a weight and the strategy that found it
/// - [`StoredWeight`](domain::StoredWeight): a persisted lookup result
pub mod domain;

/// Weight extraction from product page HTML.
pub mod extractor;

/// Page fetching.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for one fetch attempt
/// - [`HttpFetcher`](fetcher::HttpFetcher): reqwest-based implementation
/// - [`RetryingFetcher`](fetcher::RetryingFetcher): retry, backoff and pacing
pub mod fetcher;

/// Batch enrichment pipeline.
pub mod pipeline;

/// SQLite persistence layer.
///
/// - [`Store`](store::Store): Trait defining storage operations
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;

pub mod config;
pub mod http_fetcher;
pub mod retry;

use std::fmt;

use async_trait::async_trait;

pub use config::FetchConfig;
pub use http_fetcher::HttpFetcher;
pub use retry::{Pacing, RetryPolicy, RetryingFetcher};

/// A page body returned with a success status.
#[derive(Debug, Clone)]
pub struct Page {
    pub status: u16,
    pub body: String,
}

/// Why a single attempt (or a whole retry budget) failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    Timeout,
    Status(u16),
    Transport(String),
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchFailure::Timeout => write!(f, "request timed out"),
            FetchFailure::Status(code) => write!(f, "unexpected status {}", code),
            FetchFailure::Transport(msg) => write!(f, "transport error: {}", msg),
        }
    }
}

impl std::error::Error for FetchFailure {}

impl From<reqwest::Error> for FetchFailure {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchFailure::Timeout
        } else if let Some(status) = e.status() {
            FetchFailure::Status(status.as_u16())
        } else {
            FetchFailure::Transport(e.to_string())
        }
    }
}

/// Terminal result of fetching one identifier, retries included.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Page(Page),
    Failed(FetchFailure),
}

/// A single fetch attempt for one identifier.
#[async_trait]
pub trait Fetcher {
    async fn fetch_once(&self, identifier: &str) -> Result<Page, FetchFailure>;
}

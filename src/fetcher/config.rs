use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::fetcher::retry::{Pacing, RetryPolicy};

/// Configuration for fetching product pages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Page URL with `{id}` standing in for the identifier
    pub url_template: String,

    /// User agent string to send
    pub user_agent: String,

    /// Accept-Language header value
    pub accept_language: String,

    /// Per-attempt timeout in seconds (default: 10)
    pub timeout_secs: u64,

    /// Attempts per identifier, first one included (default: 3)
    pub max_attempts: u32,

    /// Delay after the first failed attempt in milliseconds (default: 2000)
    pub base_delay_ms: u64,

    /// Factor applied to the delay after each further failure (default: 2.0)
    pub backoff_multiplier: f64,

    /// Lower bound of the random pause before each attempt (default: 500)
    pub pacing_min_ms: u64,

    /// Upper bound of the random pause before each attempt (default: 1500)
    pub pacing_max_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            url_template: "https://www.example.com/product/{id}".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
            timeout_secs: 10,
            max_attempts: 3,
            base_delay_ms: 2000,
            backoff_multiplier: 2.0,
            pacing_min_ms: 500,
            pacing_max_ms: 1500,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_delay: Duration::from_millis(self.base_delay_ms),
            multiplier: self.backoff_multiplier,
        }
    }

    pub fn pacing(&self) -> Pacing {
        Pacing::new(
            Duration::from_millis(self.pacing_min_ms),
            Duration::from_millis(self.pacing_max_ms),
        )
    }
}

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, error, warn};

use crate::fetcher::{FetchFailure, FetchOutcome, Fetcher};

/// Upper bound on a single backoff wait.
pub const MAX_BACKOFF: Duration = Duration::from_secs(300);

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, first one included
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no waiting.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            multiplier: 1.0,
        }
    }

    /// Delay to wait after the `failed`-th failed attempt (1-based),
    /// saturating at [`MAX_BACKOFF`].
    pub fn delay_after(&self, failed: u32) -> Duration {
        let exponent = i32::try_from(failed.saturating_sub(1)).unwrap_or(i32::MAX);
        let secs = self.base_delay.as_secs_f64() * self.multiplier.max(1.0).powi(exponent);
        Duration::try_from_secs_f64(secs)
            .map(|delay| delay.min(MAX_BACKOFF))
            .unwrap_or(MAX_BACKOFF)
    }
}

/// Random pause inserted before every attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pacing {
    pub min: Duration,
    pub max: Duration,
}

impl Pacing {
    pub fn new(a: Duration, b: Duration) -> Self {
        if a <= b {
            Self { min: a, max: b }
        } else {
            Self { min: b, max: a }
        }
    }

    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn sample(&self) -> Duration {
        if self.max.is_zero() {
            return Duration::ZERO;
        }
        if self.min == self.max {
            return self.min;
        }
        rand::thread_rng().gen_range(self.min..=self.max)
    }
}

/// Applies a [`RetryPolicy`] and [`Pacing`] on top of a single-attempt [`Fetcher`].
#[derive(Clone)]
pub struct RetryingFetcher {
    inner: Arc<dyn Fetcher + Send + Sync>,
    policy: RetryPolicy,
    pacing: Pacing,
}

impl RetryingFetcher {
    pub fn new(inner: Arc<dyn Fetcher + Send + Sync>, policy: RetryPolicy, pacing: Pacing) -> Self {
        Self {
            inner,
            policy,
            pacing,
        }
    }

    /// Fetch `identifier`, retrying transient failures. Never errors: an
    /// exhausted budget comes back as [`FetchOutcome::Failed`].
    pub async fn fetch(&self, identifier: &str) -> FetchOutcome {
        let attempts = self.policy.max_attempts.max(1);
        let mut last_failure = FetchFailure::Transport("no attempt made".to_string());

        for attempt in 1..=attempts {
            let pause = self.pacing.sample();
            if !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }

            match self.inner.fetch_once(identifier).await {
                Ok(page) => {
                    debug!(
                        "Fetched {} on attempt {}/{} ({} bytes)",
                        identifier,
                        attempt,
                        attempts,
                        page.body.len()
                    );
                    return FetchOutcome::Page(page);
                }
                Err(failure) => {
                    warn!(
                        "Attempt {}/{} for {} failed: {}",
                        attempt, attempts, identifier, failure
                    );
                    last_failure = failure;
                }
            }

            if attempt < attempts {
                tokio::time::sleep(self.policy.delay_after(attempt)).await;
            }
        }

        error!(
            "Giving up on {} after {} attempts: {}",
            identifier, attempts, last_failure
        );
        FetchOutcome::Failed(last_failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::fetcher::Page;

    /// Replays a script of attempt results, then keeps failing.
    struct Scripted {
        script: Mutex<VecDeque<Result<Page, FetchFailure>>>,
        calls: AtomicU32,
    }

    impl Scripted {
        fn new(script: Vec<Result<Page, FetchFailure>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl Fetcher for Scripted {
        async fn fetch_once(&self, _identifier: &str) -> Result<Page, FetchFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(FetchFailure::Transport("script exhausted".into())))
        }
    }

    fn page(body: &str) -> Page {
        Page {
            status: 200,
            body: body.to_string(),
        }
    }

    fn no_wait(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            ..RetryPolicy::none()
        }
    }

    #[test]
    fn test_backoff_doubles_from_base() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Duration::from_secs(2));
        assert_eq!(policy.delay_after(2), Duration::from_secs(4));
        assert_eq!(policy.delay_after(3), Duration::from_secs(8));
    }

    #[test]
    fn test_backoff_saturates_instead_of_overflowing() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            multiplier: 1e300,
        };
        assert_eq!(policy.delay_after(1), Duration::from_secs(2));
        assert_eq!(policy.delay_after(2), MAX_BACKOFF);
        assert_eq!(policy.delay_after(u32::MAX), MAX_BACKOFF);

        let huge_base = RetryPolicy {
            base_delay: Duration::from_millis(u64::MAX),
            ..RetryPolicy::default()
        };
        assert_eq!(huge_base.delay_after(3), MAX_BACKOFF);
    }

    #[test]
    fn test_pacing_sample_within_bounds() {
        let pacing = Pacing::new(Duration::from_millis(10), Duration::from_millis(20));
        for _ in 0..100 {
            let d = pacing.sample();
            assert!(d >= Duration::from_millis(10) && d <= Duration::from_millis(20));
        }
        assert_eq!(Pacing::none().sample(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_exhausts_budget_on_persistent_failure() {
        let inner = Arc::new(Scripted::new(vec![]));
        let fetcher = RetryingFetcher::new(inner.clone(), no_wait(3), Pacing::none());

        let outcome = fetcher.fetch("A1").await;
        assert!(matches!(outcome, FetchOutcome::Failed(FetchFailure::Transport(_))));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_stops_at_first_success() {
        let inner = Arc::new(Scripted::new(vec![
            Err(FetchFailure::Timeout),
            Ok(page("<html></html>")),
            Ok(page("never reached")),
        ]));
        let fetcher = RetryingFetcher::new(inner.clone(), no_wait(3), Pacing::none());

        match fetcher.fetch("A1").await {
            FetchOutcome::Page(page) => assert_eq!(page.body, "<html></html>"),
            other => panic!("expected a page, got {:?}", other),
        }
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_reports_last_failure() {
        let inner = Arc::new(Scripted::new(vec![
            Err(FetchFailure::Timeout),
            Err(FetchFailure::Status(503)),
        ]));
        let fetcher = RetryingFetcher::new(inner, no_wait(2), Pacing::none());

        match fetcher.fetch("A1").await {
            FetchOutcome::Failed(failure) => assert_eq!(failure, FetchFailure::Status(503)),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_waits_between_attempts() {
        let inner = Arc::new(Scripted::new(vec![]));
        let fetcher = RetryingFetcher::new(inner, RetryPolicy::default(), Pacing::none());

        let start = tokio::time::Instant::now();
        fetcher.fetch("A1").await;

        // 2s after the first failure, 4s after the second, none after the last
        assert_eq!(start.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacing_precedes_every_attempt() {
        let inner = Arc::new(Scripted::new(vec![]));
        let pacing = Pacing::new(Duration::from_secs(1), Duration::from_secs(1));
        let fetcher = RetryingFetcher::new(inner.clone(), RetryPolicy::default(), pacing);

        let start = tokio::time::Instant::now();
        fetcher.fetch("A1").await;

        // 1s of pacing before each of the 3 attempts, plus 2s + 4s of backoff
        assert_eq!(start.elapsed(), Duration::from_secs(3 + 6));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_oversized_multiplier_still_returns_failure() {
        let inner = Arc::new(Scripted::new(vec![]));
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            multiplier: 1e300,
        };
        let fetcher = RetryingFetcher::new(inner.clone(), policy, Pacing::none());

        let start = tokio::time::Instant::now();
        let outcome = fetcher.fetch("A1").await;

        assert!(matches!(outcome, FetchOutcome::Failed(_)));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(2) + MAX_BACKOFF);
    }
}

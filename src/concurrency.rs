use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub const DEFAULT_WORKERS: usize = 5;

/// Run `f` over `items` with at most `width` calls in flight and return the
/// results in input order.
///
/// Tasks run on the tokio runtime, so they can make progress in parallel.
/// Results are slotted in as they complete. A task that panics leaves
/// `None` at its index and does not disturb its siblings.
pub async fn map_bounded<T, R, F, Fut>(items: Vec<T>, width: usize, f: F) -> Vec<Option<R>>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(width.max(1)));
    let f = Arc::new(f);
    let mut results: Vec<Option<R>> = (0..items.len()).map(|_| None).collect();
    let mut tasks = JoinSet::new();

    for (index, item) in items.into_iter().enumerate() {
        let semaphore = semaphore.clone();
        let f = f.clone();

        tasks.spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return (index, None);
            };

            match AssertUnwindSafe(f(item)).catch_unwind().await {
                Ok(result) => (index, Some(result)),
                Err(panic) => {
                    let reason = panic
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| panic.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_string());
                    tracing::error!("Task {} panicked: {}", index, reason);
                    (index, None)
                }
            }
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, result)) => results[index] = result,
            Err(e) => {
                tracing::error!("Task join error: {}", e);
            }
        }
    }

    results
}

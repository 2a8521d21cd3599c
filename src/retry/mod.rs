//! Retry engine
//!
//! Wraps an async operation and re-invokes it on retriable failures, sleeping with
//! exponential backoff between attempts. Retry decisions are delegated to
//! [`crate::error::is_retriable`].
//!
//! # Example
//!
//! ```no_run
//! use review_harvester::error::CrawlError;
//! use review_harvester::retry::{retry, RetryPolicy};
//!
//! # async fn example() -> Result<(), CrawlError> {
//! let policy = RetryPolicy::extraction();
//! let value = retry(&policy, || async { Ok::<_, CrawlError>(42) }).await?;
//! assert_eq!(value, 42);
//! # Ok(())
//! # }
//! ```

mod policy;
mod state;

pub use policy::{RetryPolicy, DEFAULT_JITTER};
pub use state::{calculate_delay, RetryState};

use crate::error::{is_retriable, CrawlError};
use std::future::Future;

/// Runs `operation` under `policy` without an observer
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, operation: F) -> Result<T, CrawlError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CrawlError>>,
{
    retry_with_observer(policy, operation, |_| {}).await
}

/// Runs `operation` under `policy`, calling `on_retry` before every backoff sleep
///
/// The operation is invoked until it succeeds, fails with an error that is not
/// retriable, or `policy.max_attempts` attempts have failed. The final error is
/// returned unchanged.
pub async fn retry_with_observer<T, F, Fut, O>(
    policy: &RetryPolicy,
    mut operation: F,
    mut on_retry: O,
) -> Result<T, CrawlError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CrawlError>>,
    O: FnMut(&RetryState),
{
    let mut state = RetryState::new(policy.max_attempts, policy.base_delay);

    loop {
        let error = match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        if !policy.is_eligible(&error) {
            return Err(error);
        }

        state.attempts += 1;

        let verdict = is_retriable(&error, policy.scope);
        if !verdict.retriable || !state.should_retry() {
            tracing::debug!(
                "Giving up after {} attempt(s) ({}): {}",
                state.attempts,
                error.kind(),
                error.message()
            );
            return Err(error);
        }

        let delay = verdict
            .forced_delay
            .unwrap_or_else(|| state.next_delay(policy.jitter));

        state.last_error = Some(error);
        on_retry(&state);

        tracing::debug!(
            "Attempt {}/{} failed, retrying in {:?}",
            state.attempts,
            state.max_attempts,
            delay
        );
        tokio::time::sleep(delay).await;
    }
}

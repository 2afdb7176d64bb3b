//! Upper bound on how long the caller waits for a long-running call.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

pub const GENERATION_TIMEOUT: Duration = Duration::from_secs(90);
pub const SKILLS_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeoutError {
    #[error("Request timed out. Please try again.")]
    TimedOut,

    #[error("Request failed: {0}")]
    Aborted(String),
}

/// Races `future` against a timer.
///
/// The future runs on its own task, so when the timer wins the call is not
/// cancelled. It finishes in the background and its result is dropped.
pub async fn with_timeout<F>(future: F, limit: Duration) -> Result<F::Output, TimeoutError>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    let task = tokio::spawn(future);
    match tokio::time::timeout(limit, task).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(join_error)) => Err(TimeoutError::Aborted(join_error.to_string())),
        Err(_) => Err(TimeoutError::TimedOut),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_fast_call_returns_its_output() {
        let result = with_timeout(async { 42 }, SKILLS_TIMEOUT).await;
        assert_eq!(result, Ok(42));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_call_times_out_with_user_message() {
        let result = with_timeout(
            async {
                tokio::time::sleep(Duration::from_secs(120)).await;
                "late"
            },
            GENERATION_TIMEOUT,
        )
        .await;

        let err = result.unwrap_err();
        assert_eq!(err, TimeoutError::TimedOut);
        assert_eq!(err.to_string(), "Request timed out. Please try again.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_call_keeps_running() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = finished.clone();

        let result = with_timeout(
            async move {
                tokio::time::sleep(Duration::from_secs(45)).await;
                flag.store(true, Ordering::SeqCst);
            },
            SKILLS_TIMEOUT,
        )
        .await;
        assert_eq!(result, Err(TimeoutError::TimedOut));
        assert!(!finished.load(Ordering::SeqCst));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(finished.load(Ordering::SeqCst));
    }
}

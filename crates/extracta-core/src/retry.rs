use std::fmt;
use std::future::Future;
use std::time::Duration;

use crate::error::AppError;

/// Bounded retry with a fixed backoff.
///
/// One policy drives every retried unit of work: draw extraction, year
/// loading and page fetches.
#[derive(Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Values below 1 behave as 1.
    pub max_attempts: u32,
    /// Pause between two attempts.
    pub backoff: Duration,
    /// Decides whether an error is worth another attempt.
    pub classify: fn(&AppError) -> bool,
}

fn always(_: &AppError) -> bool {
    true
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            backoff: Duration::from_secs(2),
            classify: always,
        }
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}

impl RetryPolicy {
    /// Retry every error up to `max_attempts` times.
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts,
            backoff,
            classify: always,
        }
    }

    pub fn with_classifier(mut self, classify: fn(&AppError) -> bool) -> Self {
        self.classify = classify;
        self
    }

    /// Run `op` until it succeeds, the attempts are exhausted, or it fails
    /// with an error the classifier rejects.
    ///
    /// `op` receives the 1-based attempt number. `on_failure` is called for
    /// every failed attempt with the attempt number, the error and whether
    /// another attempt follows. The last error is returned.
    pub async fn run<T, F, Fut>(
        &self,
        mut op: F,
        mut on_failure: impl FnMut(u32, &AppError, bool),
    ) -> Result<T, AppError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    let will_retry = attempt < max_attempts && (self.classify)(&e);
                    on_failure(attempt, &e, will_retry);
                    if !will_retry {
                        return Err(e);
                    }
                }
            }
            tokio::time::sleep(self.backoff).await;
            attempt += 1;
        }
    }
}

//! Bounded retry for transient backend disconnects.
//!
//! An explicit policy parameterized by an error-classification function,
//! applied around each repository operation. Only errors the classifier marks
//! transient are retried; everything else propagates immediately.

use std::future::Future;

use tracing::warn;

use crate::error::{Error, Result};

/// Default number of attempts for transient-disconnect retries.
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// Classifier deciding whether an error is worth retrying.
pub type ErrorClassifier = fn(&Error) -> bool;

/// Whether an error is a transient relational-backend disconnect.
///
/// Pool-acquisition timeouts are deliberately not transient: exhaustion is a
/// reportable condition, not something to paper over with retries.
pub fn is_transient_disconnect(err: &Error) -> bool {
    matches!(err, Error::Database(sqlx::Error::Io(_)))
}

/// A bounded, immediate (no backoff) retry policy.
#[derive(Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
    is_transient: ErrorClassifier,
}

impl RetryPolicy {
    /// Policy with explicit attempt bound and classifier.
    pub fn new(max_attempts: u32, is_transient: ErrorClassifier) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            is_transient,
        }
    }

    /// The standard policy: 3 attempts, retrying only relational disconnects.
    pub fn transient_disconnects() -> Self {
        Self::new(DEFAULT_RETRY_ATTEMPTS, is_transient_disconnect)
    }

    /// Run `op`, retrying the whole operation while the classifier accepts
    /// the error and attempts remain.
    pub async fn run<T, F, Fut>(&self, op_name: &'static str, op: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.max_attempts && (self.is_transient)(&err) => {
                    warn!(
                        subsystem = "db",
                        op = op_name,
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %err,
                        "Transient backend disconnect; retrying operation"
                    );
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::transient_disconnects()
    }
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn disconnect_error() -> Error {
        Error::Database(sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "connection reset by peer",
        )))
    }

    #[tokio::test]
    async fn test_retries_transient_errors_then_succeeds() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::transient_disconnects();

        let result = policy
            .run("test", || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(disconnect_error())
                } else {
                    Ok(42)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_bounded_attempts() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::transient_disconnects();

        let result: Result<()> = policy
            .run("test", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(disconnect_error())
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), DEFAULT_RETRY_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_non_transient_errors_propagate_immediately() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::transient_disconnects();

        let result: Result<()> = policy
            .run("test", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::UriExists("http://example.org/1".into()))
            })
            .await;

        assert!(matches!(result, Err(Error::UriExists(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_pool_timeout_is_not_transient() {
        assert!(!is_transient_disconnect(&Error::Database(
            sqlx::Error::PoolTimedOut
        )));
        assert!(is_transient_disconnect(&disconnect_error()));
        assert!(!is_transient_disconnect(&Error::TermNotFound("x".into())));
    }
}

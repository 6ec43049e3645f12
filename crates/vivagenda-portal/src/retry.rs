//! Sequential retry with exponential backoff for full fetch attempts.
//!
//! An attempt covers the whole authenticate-then-fetch sequence; sessions
//! are never reused across attempts. Only transient conditions (transport
//! failures, HTTP 5xx) are retried. Rejected credentials, 4xx statuses, and
//! malformed payloads fail fast: repeating them cannot change the outcome.

use std::future::Future;
use std::time::Duration;

use crate::error::PortalError;

/// Returns `true` for errors worth a fresh attempt after a backoff delay.
///
/// **Retried:**
/// - [`PortalError::Http`] timeouts, connect failures, and 5xx responses
///   surfaced by `reqwest`.
/// - [`PortalError::UnexpectedStatus`] in the 5xx range.
///
/// **Failed fast:**
/// - [`PortalError::CredentialsRejected`] — the portal rejected the
///   credential pair; retrying would hammer the login endpoint.
/// - [`PortalError::UnexpectedStatus`] in the 4xx range.
/// - [`PortalError::Deserialize`] / [`PortalError::MissingDataKey`] — the
///   body is structurally wrong; retrying won't fix it.
pub(crate) fn is_transient(err: &PortalError) -> bool {
    match err {
        PortalError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        PortalError::UnexpectedStatus { status, .. } => (500..600).contains(status),
        PortalError::CredentialsRejected
        | PortalError::Deserialize { .. }
        | PortalError::MissingDataKey { .. }
        | PortalError::InvalidBaseUrl { .. }
        | PortalError::RetriesExhausted { .. } => false,
    }
}

/// Runs `operation` up to `max_attempts` times, sleeping
/// `backoff_base_secs * 2^(n-1)` seconds after the n-th failed attempt.
///
/// Non-transient errors are returned as-is from the attempt that produced
/// them. When the budget is exhausted the last transient error is wrapped
/// in [`PortalError::RetriesExhausted`] with the total attempt count.
///
/// # Backoff schedule (example with `backoff_base_secs = 5`)
///
/// | Attempt | Sleep before next attempt |
/// |---------|---------------------------|
/// | 1       | 5 × 2⁰ = 5 s              |
/// | 2       | 5 × 2¹ = 10 s             |
/// | 3       | (budget exhausted)        |
pub(crate) async fn run_with_attempts<T, F, Fut>(
    max_attempts: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, PortalError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, PortalError>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_transient(&err) {
                    return Err(err);
                }
                if attempt >= max_attempts {
                    return Err(PortalError::RetriesExhausted {
                        attempts: attempt,
                        source: Box::new(err),
                    });
                }
                let delay_secs = backoff_base_secs.saturating_mul(1u64 << (attempt - 1).min(62));
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay_secs,
                    error = %err,
                    "transient portal error, retrying after backoff"
                );
                tokio::time::sleep(Duration::from_secs(delay_secs)).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn server_error() -> PortalError {
        PortalError::UnexpectedStatus {
            status: 503,
            url: "https://portal.example/login".to_owned(),
        }
    }

    #[test]
    fn credentials_rejected_is_not_transient() {
        assert!(!is_transient(&PortalError::CredentialsRejected));
    }

    #[test]
    fn client_errors_are_not_transient() {
        assert!(!is_transient(&PortalError::UnexpectedStatus {
            status: 404,
            url: "https://portal.example/x".to_owned(),
        }));
    }

    #[test]
    fn server_errors_are_transient() {
        assert!(is_transient(&server_error()));
    }

    #[test]
    fn missing_data_key_is_not_transient() {
        assert!(!is_transient(&PortalError::MissingDataKey {
            context: "test".to_owned(),
        }));
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = run_with_attempts(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, PortalError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn wraps_last_error_after_exhausting_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = run_with_attempts(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, PortalError>(server_error())
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 3, "exactly max_attempts tries");
        match result {
            Err(PortalError::RetriesExhausted { attempts, source }) => {
                assert_eq!(attempts, 3);
                assert!(matches!(
                    *source,
                    PortalError::UnexpectedStatus { status: 503, .. }
                ));
            }
            other => panic!("expected RetriesExhausted, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn retries_twice_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = run_with_attempts(5, 0, || {
            let c = Arc::clone(&c);
            async move {
                let n = c.fetch_add(1, Ordering::SeqCst) + 1;
                if n <= 2 {
                    Err(server_error())
                } else {
                    Ok::<u32, PortalError>(99)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 99);
        assert_eq!(calls.load(Ordering::SeqCst), 3, "2 failures + 1 success");
    }

    #[tokio::test]
    async fn does_not_retry_rejected_credentials() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = run_with_attempts(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, PortalError>(PortalError::CredentialsRejected)
            }
        })
        .await;
        assert_eq!(
            calls.load(Ordering::SeqCst),
            1,
            "rejected credentials must not be retried"
        );
        assert!(matches!(result, Err(PortalError::CredentialsRejected)));
    }

    #[tokio::test]
    async fn zero_attempt_budget_still_runs_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = run_with_attempts(0, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, PortalError>(7)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

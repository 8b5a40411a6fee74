//! HTTP failure policy shared by the translation backends.
//!
//! - 429 surfaces as `RateLimited` and is never retried
//! - 401/403 are authentication failures
//! - 500/502/503/504, timeouts and connection failures are transient and
//!   retried once when enabled
//! - anything else is a fatal service error

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use tracing::warn;

use crate::error::{Error, Result};

/// Outcome of a failed request attempt.
#[derive(Debug)]
pub(crate) enum RequestFailure {
    /// Worth one more attempt
    Transient(Error),
    Fatal(Error),
}

impl RequestFailure {
    fn into_error(self) -> Error {
        match self {
            Self::Transient(e) | Self::Fatal(e) => e,
        }
    }
}

impl From<Error> for RequestFailure {
    fn from(e: Error) -> Self {
        Self::Fatal(e)
    }
}

pub(crate) type Attempt<T> = std::result::Result<T, RequestFailure>;

pub(crate) fn build_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Error::TranslationService(format!("failed to create HTTP client: {e}")))
}

pub(crate) fn classify_status(service: &str, status: StatusCode, retry_after: Option<u64>, body: &str) -> RequestFailure {
    let body = body.trim();
    match status.as_u16() {
        429 => RequestFailure::Fatal(Error::RateLimited { retry_after }),
        401 | 403 => RequestFailure::Fatal(Error::TranslationService(format!(
            "{service} rejected the credentials (HTTP {status}): {body}"
        ))),
        500 | 502 | 503 | 504 => {
            RequestFailure::Transient(Error::TranslationService(format!("{service} unavailable (HTTP {status}): {body}")))
        }
        _ => RequestFailure::Fatal(Error::TranslationService(format!("{service} returned HTTP {status}: {body}"))),
    }
}

pub(crate) fn classify_send_error(service: &str, e: &reqwest::Error) -> RequestFailure {
    if e.is_timeout() {
        RequestFailure::Transient(Error::TranslationService(format!("{service} request timed out")))
    } else if e.is_connect() || e.is_request() {
        RequestFailure::Transient(Error::TranslationService(format!("cannot reach {service}: {e}")))
    } else {
        RequestFailure::Fatal(Error::TranslationService(format!("{service} request failed: {e}")))
    }
}

/// Send a prepared request and turn non-success statuses into failures.
pub(crate) async fn send(service: &str, request: reqwest::RequestBuilder) -> Attempt<Response> {
    let response = request.send().await.map_err(|e| classify_send_error(service, &e))?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok());
    let body = response.text().await.unwrap_or_default();
    Err(classify_status(service, status, retry_after, &body))
}

pub(crate) fn invalid_response(service: &str, detail: impl std::fmt::Display) -> RequestFailure {
    RequestFailure::Fatal(Error::TranslationService(format!("invalid response from {service}: {detail}")))
}

/// Retry-once policy for transient failures.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RetryPolicy {
    retry_transient: bool,
    delay: Duration,
}

impl RetryPolicy {
    pub(crate) const fn new(retry_transient: bool, delay_ms: u64) -> Self {
        Self {
            retry_transient,
            delay: Duration::from_millis(delay_ms),
        }
    }

    pub(crate) async fn run<T, F, Fut>(&self, service: &str, mut attempt: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Attempt<T>>,
    {
        match attempt().await {
            Ok(value) => Ok(value),
            Err(RequestFailure::Transient(e)) if self.retry_transient => {
                warn!("{} failed transiently ({}), retrying once", service, e);
                tokio::time::sleep(self.delay).await;
                attempt().await.map_err(RequestFailure::into_error)
            }
            Err(failure) => Err(failure.into_error()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_rate_limit_is_fatal() {
        let failure = classify_status("svc", StatusCode::TOO_MANY_REQUESTS, Some(7), "");
        assert!(matches!(failure, RequestFailure::Fatal(Error::RateLimited { retry_after: Some(7) })));
    }

    #[test]
    fn test_auth_and_server_errors() {
        assert!(matches!(
            classify_status("svc", StatusCode::FORBIDDEN, None, "denied"),
            RequestFailure::Fatal(Error::TranslationService(_))
        ));
        assert!(matches!(
            classify_status("svc", StatusCode::BAD_GATEWAY, None, ""),
            RequestFailure::Transient(_)
        ));
        assert!(matches!(
            classify_status("svc", StatusCode::BAD_REQUEST, None, ""),
            RequestFailure::Fatal(_)
        ));
    }

    #[tokio::test]
    async fn test_transient_retried_exactly_once() {
        let calls = AtomicUsize::new(0);
        let policy = RetryPolicy::new(true, 0);
        let result: Result<()> = policy
            .run("svc", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(RequestFailure::Transient(Error::TranslationService("down".into()))) }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_can_succeed() {
        let calls = AtomicUsize::new(0);
        let policy = RetryPolicy::new(true, 0);
        let result = policy
            .run("svc", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(RequestFailure::Transient(Error::TranslationService("down".into())))
                    } else {
                        Ok("ok")
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_fatal_and_disabled_retry_not_repeated() {
        let calls = AtomicUsize::new(0);
        let result: Result<()> = RetryPolicy::new(true, 0)
            .run("svc", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(RequestFailure::Fatal(Error::RateLimited { retry_after: None })) }
            })
            .await;
        assert!(matches!(result, Err(Error::RateLimited { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let result: Result<()> = RetryPolicy::new(false, 0)
            .run("svc", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(RequestFailure::Transient(Error::TranslationService("down".into()))) }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}

//! Blocking HTTP with retry, exponential backoff and circuit breaker logic.
//!
//! Shared by every REST client in the crate (prices, news, sentiment).

use super::circuit_breaker::CircuitBreaker;
use super::provider::DataError;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use std::time::Duration;

/// Retry settings for one client.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

/// Build a client with the crate's timeout and user agent.
pub fn build_client() -> Result<Client, DataError> {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent(concat!("goldlab/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))
}

/// Send the request produced by `build`, retrying transient failures.
///
/// `label` names the upstream in errors ("Twelve Data", "Serper", ...).
/// Returns the first successful response.
pub fn send_with_retry(
    label: &str,
    breaker: &CircuitBreaker,
    policy: RetryPolicy,
    build: impl Fn() -> RequestBuilder,
) -> Result<Response, DataError> {
    if !breaker.is_allowed() {
        return Err(DataError::CircuitBreakerTripped);
    }

    let mut last_error = None;
    for attempt in 0..=policy.max_retries {
        if attempt > 0 {
            let delay = policy.base_delay * 2u32.pow(attempt - 1);
            tracing::debug!(upstream = label, attempt, ?delay, "retrying request");
            std::thread::sleep(delay);
        }

        if !breaker.is_allowed() {
            return Err(DataError::CircuitBreakerTripped);
        }

        match build().send() {
            Ok(resp) => {
                let status = resp.status();

                if status == StatusCode::FORBIDDEN {
                    breaker.trip();
                    return Err(DataError::CircuitBreakerTripped);
                }

                if status == StatusCode::TOO_MANY_REQUESTS {
                    breaker.record_failure();
                    let retry_after = resp
                        .headers()
                        .get("retry-after")
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.parse::<u64>().ok())
                        .unwrap_or(60);
                    last_error = Some(DataError::RateLimited {
                        retry_after_secs: retry_after,
                    });
                    continue;
                }

                if status == StatusCode::UNAUTHORIZED {
                    return Err(DataError::AuthenticationRequired(format!(
                        "{label} rejected the API key"
                    )));
                }

                if !status.is_success() {
                    breaker.record_failure();
                    last_error = Some(DataError::Other(format!("{label} error: HTTP {status}")));
                    continue;
                }

                breaker.record_success();
                return Ok(resp);
            }
            Err(e) => {
                if e.is_connect() || e.is_timeout() {
                    last_error = Some(DataError::NetworkUnreachable(format!("{label}: {e}")));
                    continue;
                }
                return Err(DataError::NetworkUnreachable(format!("{label}: {e}")));
            }
        }
    }

    Err(last_error.unwrap_or_else(|| DataError::Other(format!("{label}: max retries exceeded"))))
}

/// Read an API key from the environment.
pub fn key_from_env(env_var: &str) -> Result<String, DataError> {
    match std::env::var(env_var) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(DataError::missing_key(env_var)),
    }
}

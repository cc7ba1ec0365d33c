//! Retrying transport: network failures and 5xx responses are retried with capped
//! exponential backoff, everything else is returned on the first attempt.

use std::time::Duration;

use reqwest::{Request, Response};
use tracing::{debug, warn};

use crate::error::RequestError;

/// How many times, and how patiently, a failed attempt is repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first one.
    pub max_retries: u32,
    /// Wait before the first retry.
    pub wait_min: Duration,
    /// Upper bound for any single wait.
    pub wait_max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            wait_min: Duration::from_secs(1),
            wait_max: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            wait_min: Duration::ZERO,
            wait_max: Duration::ZERO,
        }
    }

    /// Total attempts including the first one.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Wait before retry number `retry` (1-based): `wait_min * 2^(retry-1)`, capped at `wait_max`.
    #[must_use]
    pub fn backoff(&self, retry: u32) -> Duration {
        let shift = retry.saturating_sub(1).min(16);
        self.wait_min
            .saturating_mul(1u32 << shift)
            .min(self.wait_max.max(self.wait_min))
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RetryTransport {
    client: reqwest::Client,
    policy: RetryPolicy,
}

impl RetryTransport {
    pub(crate) const fn new(client: reqwest::Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    pub(crate) const fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Send `request`, repeating it while the failure is retryable and attempts remain.
    ///
    /// The final 5xx response is handed back as a response so the caller can classify it.
    pub(crate) async fn send(&self, request: Request) -> Result<Response, RequestError> {
        let attempts = self.policy.max_attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            let last = attempt >= attempts;
            let Some(current) = request.try_clone() else {
                // Streaming bodies cannot be replayed; send once.
                return self.send_once(request, attempt).await;
            };

            let method = current.method().clone();
            let url = current.url().clone();
            match self.client.execute(current).await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_server_error() && !last {
                        warn!(attempt, %method, %url, %status, "server error, retrying");
                        self.pause(attempt).await;
                        continue;
                    }
                    return Ok(response);
                }
                Err(err) => {
                    if !last && should_retry_error(&err) {
                        warn!(attempt, %method, %url, error = %err, "request failed, retrying");
                        self.pause(attempt).await;
                        continue;
                    }
                    return Err(RequestError::Transport {
                        attempts: attempt,
                        source: err,
                    });
                }
            }
        }
    }

    async fn send_once(&self, request: Request, attempt: u32) -> Result<Response, RequestError> {
        self.client
            .execute(request)
            .await
            .map_err(|source| RequestError::Transport {
                attempts: attempt,
                source,
            })
    }

    async fn pause(&self, attempt: u32) {
        let delay = self.policy.backoff(attempt);
        debug!(delay_ms = delay.as_millis(), "backing off before retry");
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

fn should_retry_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

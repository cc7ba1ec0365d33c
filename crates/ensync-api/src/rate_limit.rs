//! Client-side token bucket used to pace outgoing requests.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Steady request rate plus the burst the bucket can absorb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    burst: u32,
    interval: Duration,
}

impl RateLimit {
    /// Build a limit of `requests_per_second` with room for `burst` back-to-back requests.
    ///
    /// # Errors
    ///
    /// Returns [`RateLimitError::InvalidRate`] for a non-positive or non-finite rate and
    /// [`RateLimitError::InvalidBurst`] for a zero burst.
    pub fn per_second(requests_per_second: f64, burst: u32) -> Result<Self, RateLimitError> {
        if burst == 0 {
            return Err(RateLimitError::InvalidBurst);
        }
        if !requests_per_second.is_finite() || requests_per_second <= 0.0 {
            return Err(RateLimitError::InvalidRate {
                requests_per_second,
            });
        }
        let interval = Duration::try_from_secs_f64(requests_per_second.recip())
            .map_err(|_| RateLimitError::InvalidRate {
                requests_per_second,
            })?;
        if interval.is_zero() {
            return Err(RateLimitError::InvalidRate {
                requests_per_second,
            });
        }
        Ok(Self { burst, interval })
    }

    /// Maximum number of requests that may be issued without waiting.
    #[must_use]
    pub const fn burst(&self) -> u32 {
        self.burst
    }

    /// Time it takes to earn one token.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }
}

/// Failures from limiter configuration or waiting.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RateLimitError {
    /// Rate must be a positive finite number.
    #[error("requests per second must be positive, got {requests_per_second}")]
    InvalidRate {
        /// Rejected rate.
        requests_per_second: f64,
    },
    /// Burst must allow at least one request.
    #[error("burst must be at least 1")]
    InvalidBurst,
    /// The caller cancelled while waiting for a token.
    #[error("wait for rate limiter token was cancelled")]
    Cancelled,
}

/// Token bucket shared by every request issued through one client.
#[derive(Debug)]
pub struct RateLimiter {
    limit: RateLimit,
    bucket: Mutex<Bucket>,
}

#[derive(Debug)]
struct Bucket {
    tokens: u128,
    last_refill: Instant,
}

impl RateLimiter {
    const TOKEN_SCALE: u128 = 1_000_000;

    /// Create a limiter whose bucket starts full.
    #[must_use]
    pub fn new(limit: RateLimit) -> Self {
        Self {
            limit,
            bucket: Mutex::new(Bucket {
                tokens: Self::capacity(limit),
                last_refill: Instant::now(),
            }),
        }
    }

    /// Configured limit.
    #[must_use]
    pub const fn limit(&self) -> RateLimit {
        self.limit
    }

    /// Wait until a token is available, or until `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns [`RateLimitError::Cancelled`] when the token is cancelled before
    /// or during the wait.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<(), RateLimitError> {
        if cancel.is_cancelled() {
            return Err(RateLimitError::Cancelled);
        }
        loop {
            let Err(wait) = self.try_acquire(Instant::now()) else {
                return Ok(());
            };
            debug!(wait_ms = wait.as_millis(), "waiting for rate limiter token");
            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(RateLimitError::Cancelled),
                () = tokio::time::sleep(wait) => {}
            }
        }
    }

    /// Take a token if one is available; otherwise report how long until one is.
    fn try_acquire(&self, now: Instant) -> Result<(), Duration> {
        let mut bucket = self.bucket.lock().unwrap_or_else(PoisonError::into_inner);
        self.refill(&mut bucket, now);
        if bucket.tokens >= Self::TOKEN_SCALE {
            bucket.tokens -= Self::TOKEN_SCALE;
            Ok(())
        } else {
            Err(self.retry_delay(&bucket))
        }
    }

    fn capacity(limit: RateLimit) -> u128 {
        u128::from(limit.burst) * Self::TOKEN_SCALE
    }

    fn refill(&self, bucket: &mut Bucket, now: Instant) {
        let elapsed = now.saturating_duration_since(bucket.last_refill);
        if elapsed.is_zero() {
            return;
        }

        let interval_micros = self.limit.interval.as_micros().max(1);
        let replenished = Self::TOKEN_SCALE.saturating_mul(elapsed.as_micros()) / interval_micros;
        if replenished > 0 {
            bucket.tokens = (bucket.tokens + replenished).min(Self::capacity(self.limit));
            bucket.last_refill = now;
        }
    }

    fn retry_delay(&self, bucket: &Bucket) -> Duration {
        let deficit = Self::TOKEN_SCALE.saturating_sub(bucket.tokens);
        let needed = deficit.saturating_mul(self.limit.interval.as_micros());
        let micros = needed.div_ceil(Self::TOKEN_SCALE).max(1);
        Duration::from_micros(u64::try_from(micros).unwrap_or(u64::MAX))
    }
}

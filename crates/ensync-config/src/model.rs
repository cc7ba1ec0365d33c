//! Typed configuration document.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::defaults;
use crate::error::{ConfigError, ConfigResult};

/// Effective CLI configuration after file and environment sources are merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Root URL of the management API.
    pub base_url: String,
    /// Enables debug-level logging.
    pub debug: bool,
    /// Overall per-request deadline in seconds; `0` disables it.
    pub timeout_secs: u64,
    /// Client-side request pacing.
    pub rate_limit: RateLimitSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            debug: false,
            timeout_secs: defaults::TIMEOUT_SECS,
            rate_limit: RateLimitSettings::default(),
        }
    }
}

/// Token bucket settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    /// Sustained request rate.
    pub requests_per_second: f64,
    /// Requests that may be issued back to back.
    pub burst: u32,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            requests_per_second: defaults::REQUESTS_PER_SECOND,
            burst: defaults::BURST,
        }
    }
}

impl Settings {
    /// Request deadline, or `None` when disabled.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        if self.timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.timeout_secs))
        }
    }

    /// Check that the merged settings are usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingBaseUrl`] for a blank base URL,
    /// [`ConfigError::InvalidBaseUrl`] for a non-http(s) or relative one, and
    /// [`ConfigError::InvalidField`] for out-of-range rate limits.
    pub fn validate(&self) -> ConfigResult<()> {
        let base_url = self.base_url.trim();
        if base_url.is_empty() {
            return Err(ConfigError::MissingBaseUrl);
        }
        let parsed = Url::parse(base_url).map_err(|_| ConfigError::InvalidBaseUrl {
            value: base_url.to_string(),
            reason: "not an absolute URL",
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidBaseUrl {
                value: base_url.to_string(),
                reason: "scheme must be http or https",
            });
        }
        if parsed.host_str().is_none_or(str::is_empty) {
            return Err(ConfigError::InvalidBaseUrl {
                value: base_url.to_string(),
                reason: "missing host",
            });
        }

        let rate = self.rate_limit.requests_per_second;
        if !rate.is_finite() || rate <= 0.0 {
            return Err(ConfigError::InvalidField {
                field: "rate_limit.requests_per_second",
                reason: "must be a positive number",
            });
        }
        if self.rate_limit.burst == 0 {
            return Err(ConfigError::InvalidField {
                field: "rate_limit.burst",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }
}

//! Error types for configuration loading.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures raised while locating, reading, or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading the configuration file failed for a reason other than absence.
    #[error("failed to read configuration file {}", path.display())]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// File involved.
        path: PathBuf,
        /// Source IO error.
        source: io::Error,
    },
    /// The configuration file is not valid YAML for the expected shape.
    #[error("failed to parse configuration file {}", path.display())]
    Parse {
        /// File involved.
        path: PathBuf,
        /// Source YAML error.
        source: serde_yaml::Error,
    },
    /// No base URL was supplied by the file or the environment.
    #[error(
        "base_url is required: set it in the config file or via the ENSYNC_BASE_URL environment variable"
    )]
    MissingBaseUrl,
    /// The base URL is not an absolute http(s) URL.
    #[error("invalid base_url '{value}': {reason}")]
    InvalidBaseUrl {
        /// Offending value.
        value: String,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// A field holds a value outside its accepted range.
    #[error("invalid value for '{field}': {reason}")]
    InvalidField {
        /// Dotted field name.
        field: &'static str,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;

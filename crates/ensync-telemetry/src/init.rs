//! Logger construction.
//!
//! The logger is returned as a [`Dispatch`] rather than installed globally, so
//! callers hand it to the components that log and tests can build as many as they
//! need. Output goes to stderr so command output on stdout stays machine readable.

use std::io::IsTerminal;
use std::str::FromStr;

use tracing::Dispatch;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt};

use crate::error::{Result, TelemetryError};

/// Level used when debug output is off.
pub const DEFAULT_LOG_LEVEL: &str = "info";
/// Level used when debug output is on.
pub const DEBUG_LOG_LEVEL: &str = "debug";

/// Level directive for the given debug flag.
#[must_use]
pub const fn level_for(debug: bool) -> &'static str {
    if debug { DEBUG_LOG_LEVEL } else { DEFAULT_LOG_LEVEL }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig<'a> {
    /// Level or filter directive (e.g., `warn`, `ensync_api=debug`).
    pub level: &'a str,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig<'_> {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL,
            format: LogFormat::infer(),
        }
    }
}

/// Available output formats for the logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Structured JSON objects, one per line.
    Json,
    /// Human-readable lines.
    Pretty,
}

impl LogFormat {
    /// Pretty on an interactive terminal, JSON otherwise.
    #[must_use]
    pub fn infer() -> Self {
        if std::io::stderr().is_terminal() {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" | "text" => Ok(Self::Pretty),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

/// Build a stderr logger.
///
/// `RUST_LOG`, when set and valid, takes precedence over `config.level`.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] when the level directive is invalid.
pub fn build_dispatch(config: &LoggingConfig<'_>) -> Result<Dispatch> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| parse_filter(config.level))?;
    Ok(assemble(
        config.format,
        filter,
        std::io::stderr,
        std::io::stderr().is_terminal(),
    ))
}

/// Build a logger writing to `writer`, ignoring `RUST_LOG`.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] when the level directive is invalid.
pub fn build_dispatch_with_writer<W>(config: &LoggingConfig<'_>, writer: W) -> Result<Dispatch>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = parse_filter(config.level)?;
    Ok(assemble(config.format, filter, writer, false))
}

fn parse_filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(level).map_err(|source| TelemetryError::InvalidFilter {
        directive: level.to_string(),
        source,
    })
}

fn assemble<W>(format: LogFormat, filter: EnvFilter, writer: W, ansi: bool) -> Dispatch
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => Dispatch::new(
            registry.with(
                fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_target(false)
                    .with_thread_ids(false),
            ),
        ),
        LogFormat::Pretty => Dispatch::new(
            registry.with(
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(ansi)
                    .with_target(false)
                    .with_thread_ids(false),
            ),
        ),
    }
}

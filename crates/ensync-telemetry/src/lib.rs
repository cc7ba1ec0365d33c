#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls
)]
#![warn(missing_docs, unreachable_pub, unused)]
#![allow(clippy::multiple_crate_versions)]

//! Logging primitives for the EnSync CLI.
//!
//! Layout: `init.rs` (logger construction and format selection), `error.rs`.

pub mod error;
pub mod init;

pub use error::{Result, TelemetryError};
pub use init::{
    DEBUG_LOG_LEVEL, DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, build_dispatch,
    build_dispatch_with_writer, level_for,
};

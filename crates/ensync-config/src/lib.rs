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

//! File and environment backed configuration for the EnSync CLI.
//!
//! Layout: `model.rs` (typed settings and validation), `loader.rs` (file discovery
//! and environment overrides), `defaults.rs` (locations and default values).

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Environment, ProcessEnvironment};
pub use model::{RateLimitSettings, Settings};

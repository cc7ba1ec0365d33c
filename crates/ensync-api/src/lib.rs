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
//! HTTP client for the EnSync management API.
//!
//! Every call flows through one pipeline: an optional token-bucket gate, URL and
//! header assembly, a retrying transport (network failures and 5xx, capped
//! exponential backoff), then response classification. Operations are grouped into
//! the [`EventService`], [`AccessKeyService`], and [`WorkspaceService`] traits, all
//! implemented by [`Client`].
//!
//! Layout: `client.rs` (pipeline and builder), `request.rs`/`response.rs` (wire
//! assembly and classification), `rate_limit.rs`, `retry.rs`, `params.rs`,
//! `service.rs` (operation traits) with one implementation file per resource.

mod access_keys;
pub mod client;
pub mod error;
mod events;
pub mod params;
pub mod rate_limit;
pub mod request;
pub mod response;
pub mod retry;
pub mod service;
mod workspaces;

pub use client::{Client, ClientBuilder};
pub use error::{ApiError, ApiResult, ClientBuildError, RequestError, StatusError};
pub use params::{ListParams, SortOrder, ValidationError};
pub use rate_limit::{RateLimit, RateLimitError, RateLimiter};
pub use request::ApiRequest;
pub use response::ErrorBody;
pub use retry::RetryPolicy;
pub use service::{AccessKeyService, ApiService, EventService, WorkspaceService};
pub use tokio_util::sync::CancellationToken;

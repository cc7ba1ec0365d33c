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
//! Shared data model for the EnSync management API.
//!
//! These records mirror the JSON documents exchanged with the remote API and are
//! re-used by the client for response decoding and by the CLI for rendering.
//! Layout: `event.rs`, `access_key.rs`, `workspace.rs` (resource records),
//! `list.rs` (paged envelopes), `requests.rs` (partial write payloads).

pub mod access_key;
pub mod event;
pub mod list;
pub mod requests;
pub mod workspace;

use serde::{Deserialize, Deserializer};

pub use access_key::{
    AccessKey, AccessKeyPermissions, AccessKeyType, ParseAccessKeyTypeError, Permissions,
    ServiceKeyPair,
};
pub use event::Event;
pub use list::{AccessKeyList, EventList, ResultList, WorkspaceList};
pub use requests::{
    CreateAccessKeyRequest, CreateWorkspaceRequest, EventRequest, PermissionsUpdate,
    RotateServiceKeyPairRequest,
};
pub use workspace::Workspace;

/// Insertion-ordered JSON object used for free-form payloads.
///
/// Backed by `serde_json`'s `preserve_order` map so documents keep the key order
/// the server (or the user) supplied when they are echoed back.
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

/// Treat an explicit JSON `null` the same as a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

//! Workspaces.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::null_as_default;

/// Workspace node. Children are only populated when the server nests them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    /// Server-assigned identifier.
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    /// Workspace name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Identifier of the parent workspace; empty for roots.
    #[serde(default, deserialize_with = "null_as_default")]
    pub parent_id: String,
    /// Materialised path from the root.
    #[serde(default, deserialize_with = "null_as_default")]
    pub path: String,
    /// Creation timestamp assigned by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Nested child workspaces, as returned by the server.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub children: Vec<Workspace>,
}

impl Workspace {
    /// Returns `true` for workspaces without a parent.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_id.is_empty()
    }
}

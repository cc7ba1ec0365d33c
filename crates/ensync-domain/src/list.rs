//! Paged list envelopes.

use serde::{Deserialize, Serialize};

use crate::{AccessKeyPermissions, Event, Workspace, null_as_default};

/// One page of results together with the count reported by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    rename_all = "camelCase",
    bound(deserialize = "T: Deserialize<'de>")
)]
pub struct ResultList<T> {
    /// Number of results the server reports for this page.
    #[serde(default)]
    pub results_length: usize,
    /// Records in server order.
    #[serde(default = "Vec::new", deserialize_with = "null_as_default")]
    pub results: Vec<T>,
}

impl<T> Default for ResultList<T> {
    fn default() -> Self {
        Self {
            results_length: 0,
            results: Vec::new(),
        }
    }
}

impl<T> ResultList<T> {
    /// Returns `true` when the reported count matches the records received.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.results_length == self.results.len()
    }

    /// Returns `true` when the page carries no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Page of event definitions.
pub type EventList = ResultList<Event>;
/// Page of access keys.
pub type AccessKeyList = ResultList<AccessKeyPermissions>;
/// Page of workspaces.
pub type WorkspaceList = ResultList<Workspace>;

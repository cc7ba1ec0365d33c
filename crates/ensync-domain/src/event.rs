//! Event definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{JsonObject, null_as_default};

/// Event definition registered with the messaging platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Server-assigned identifier; empty until the event has been created.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub id: String,
    /// Event name, unique per account.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Free-form payload schema attached to the event.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "JsonObject::is_empty"
    )]
    pub payload: JsonObject,
    /// Creation timestamp assigned by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update timestamp assigned by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Event {
    /// Build an unsaved event from a name and payload.
    #[must_use]
    pub fn new(name: impl Into<String>, payload: JsonObject) -> Self {
        Self {
            name: name.into(),
            payload,
            ..Self::default()
        }
    }

    /// Returns `true` when neither an identifier nor a name is present.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.id.is_empty() && self.name.is_empty()
    }
}

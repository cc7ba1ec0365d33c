//! Write payloads sent to the API.
//!
//! Updates carry only the mutable fields so server-owned fields are never
//! cleared by accident.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{AccessKeyType, Event, JsonObject, Permissions};

/// Body for creating or updating an event definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventRequest {
    /// Event name.
    pub name: String,
    /// Event payload schema.
    pub payload: JsonObject,
}

impl From<&Event> for EventRequest {
    fn from(event: &Event) -> Self {
        Self {
            name: event.name.clone(),
            payload: event.payload.clone(),
        }
    }
}

/// Body for creating an access key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateAccessKeyRequest {
    /// Principal type tag.
    #[serde(rename = "type")]
    pub key_type: AccessKeyType,
    /// Display name.
    pub name: String,
    /// Initial permissions.
    pub permissions: Permissions,
}

/// Body for replacing the send/receive lists of an access key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionsUpdate {
    /// Channels the key may publish to.
    pub send: BTreeSet<String>,
    /// Channels the key may subscribe to.
    pub receive: BTreeSet<String>,
}

impl From<&Permissions> for PermissionsUpdate {
    fn from(permissions: &Permissions) -> Self {
        Self {
            send: permissions.send.clone(),
            receive: permissions.receive.clone(),
        }
    }
}

/// Body for rotating the service key pair of an access key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotateServiceKeyPairRequest {
    /// Access key whose pair is rotated.
    pub access_key: String,
}

/// Body for creating a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateWorkspaceRequest {
    /// Workspace name.
    pub name: String,
}

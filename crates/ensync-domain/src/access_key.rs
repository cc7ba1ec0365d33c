//! Access keys, their channel permissions, and service key pairs.

use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{JsonObject, null_as_default};

/// Kind of principal an access key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessKeyType {
    /// Key used by a backend service.
    Service,
    /// Key scoped to an account.
    Account,
    /// Tag not recognised by this client.
    #[serde(other)]
    Unknown,
}

impl AccessKeyType {
    /// Wire representation of the type tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Service => "SERVICE",
            Self::Account => "ACCOUNT",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl Display for AccessKeyType {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Error returned when an access key type tag cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseAccessKeyTypeError {
    value: String,
}

impl Display for ParseAccessKeyTypeError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "unknown access key type '{}' (expected SERVICE or ACCOUNT)",
            self.value
        )
    }
}

impl std::error::Error for ParseAccessKeyTypeError {}

impl FromStr for AccessKeyType {
    type Err = ParseAccessKeyTypeError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case("service") {
            Ok(Self::Service)
        } else if trimmed.eq_ignore_ascii_case("account") {
            Ok(Self::Account)
        } else {
            Err(ParseAccessKeyTypeError {
                value: trimmed.to_string(),
            })
        }
    }
}

/// Channel permissions granted to an access key.
///
/// `send` and `receive` are sets of channel (event) names. A literal `"*"`
/// entry grants the verb for every channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Permissions {
    /// Channels the key may publish to.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeSet::is_empty"
    )]
    pub send: BTreeSet<String>,
    /// Channels the key may subscribe to.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeSet::is_empty"
    )]
    pub receive: BTreeSet<String>,
    /// Additional resource grants, passed through untouched.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "JsonObject::is_empty"
    )]
    pub resources: JsonObject,
}

impl Permissions {
    /// Entry granting a verb on every channel.
    pub const WILDCARD: &'static str = "*";

    /// Build permissions from explicit send and receive channel lists.
    #[must_use]
    pub fn new<S, R>(send: S, receive: R) -> Self
    where
        S: IntoIterator,
        S::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            send: send.into_iter().map(Into::into).collect(),
            receive: receive.into_iter().map(Into::into).collect(),
            resources: JsonObject::new(),
        }
    }

    /// Permissions granting both verbs on every channel.
    #[must_use]
    pub fn allow_all() -> Self {
        Self::new([Self::WILDCARD], [Self::WILDCARD])
    }

    /// Whether the key may publish to `channel`.
    #[must_use]
    pub fn has_send_permission(&self, channel: &str) -> bool {
        grants(&self.send, channel)
    }

    /// Whether the key may subscribe to `channel`.
    #[must_use]
    pub fn has_receive_permission(&self, channel: &str) -> bool {
        grants(&self.receive, channel)
    }
}

fn grants(channels: &BTreeSet<String>, channel: &str) -> bool {
    channels.contains(Permissions::WILDCARD) || channels.contains(channel)
}

/// Public/private credential pair issued by key rotation.
///
/// The private half is only present in the response to the rotation call.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceKeyPair {
    /// Public half of the pair.
    #[serde(default, deserialize_with = "null_as_default")]
    pub public_key: String,
    /// Private half, returned once at generation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
}

impl fmt::Debug for ServiceKeyPair {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ServiceKeyPair")
            .field("public_key", &self.public_key)
            .field(
                "private_key",
                &self.private_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Access key record as returned by the create call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessKey {
    /// Server-assigned identifier.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub id: String,
    /// Generated opaque key string.
    #[serde(default, deserialize_with = "null_as_default")]
    pub access_key: String,
    /// Display name.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub name: String,
    /// Principal type tag.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub key_type: Option<AccessKeyType>,
    /// Creation timestamp assigned by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Permissions attached to the key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Permissions>,
    /// Identifier of the associated service key, if any.
    #[serde(
        rename = "service_key_id",
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub service_key_id: String,
    /// Service key pair generated alongside the key, if any.
    #[serde(
        rename = "service_key_pair",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub service_key_pair: Option<ServiceKeyPair>,
}

/// Access key record as returned by lookups, listings, and the permissions endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessKeyPermissions {
    /// Server-assigned identifier.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub id: String,
    /// Opaque key string.
    #[serde(default, deserialize_with = "null_as_default")]
    pub key: String,
    /// Display name.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub name: String,
    /// Principal type tag.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub key_type: Option<AccessKeyType>,
    /// Creation timestamp assigned by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Permissions attached to the key.
    #[serde(default)]
    pub permissions: Option<Permissions>,
    /// Identifier of the associated service key, if any.
    #[serde(
        rename = "service_key_id",
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub service_key_id: String,
    /// Service key pair associated with the key, if any.
    #[serde(
        rename = "service_key_pair",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub service_key_pair: Option<ServiceKeyPair>,
}

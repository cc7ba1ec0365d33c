//! Command handlers grouped by resource.

pub(crate) mod access_keys;
pub(crate) mod events;
pub(crate) mod version;
pub(crate) mod workspaces;

use ensync_domain::{JsonObject, Permissions, ResultList};
use serde_json::Value;
use tracing::warn;

use crate::client::{CliError, CliResult};

/// Parse a flag value that must hold a JSON object.
pub(crate) fn parse_json_object(flag: &str, raw: &str) -> CliResult<JsonObject> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(other) => Err(CliError::validation(format!(
            "--{flag} must be a JSON object, got {}",
            json_kind(&other)
        ))),
        Err(err) => Err(CliError::validation(format!(
            "--{flag} is not valid JSON: {err}"
        ))),
    }
}

/// Parse a `--permissions` value such as `{"send":["orders"],"receive":["*"]}`.
pub(crate) fn parse_permissions(raw: &str) -> CliResult<Permissions> {
    let object = parse_json_object("permissions", raw)?;
    serde_json::from_value(Value::Object(object))
        .map_err(|err| CliError::validation(format!("invalid --permissions: {err}")))
}

/// Reject blank identifiers before they reach the request path.
pub(crate) fn require(flag: &str, value: &str) -> CliResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CliError::validation(format!("--{flag} must not be empty")));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn warn_on_count_mismatch<T>(resource: &str, list: &ResultList<T>) {
    if !list.is_consistent() {
        warn!(
            resource,
            results_length = list.results_length,
            received = list.results.len(),
            "result count does not match the returned records"
        );
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

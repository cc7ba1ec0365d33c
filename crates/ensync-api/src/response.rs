//! Response classification and decoding.

use bytes::Bytes;
use reqwest::{Response, StatusCode};
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};

use crate::error::{RequestError, StatusError};

/// Structured error payload returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human readable failure description.
    pub message: String,
    /// Optional application error code; numeric codes are kept as text.
    #[serde(
        default,
        deserialize_with = "code_as_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub code: Option<String>,
}

fn code_as_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(code)) => Ok(Some(code)),
        Some(serde_json::Value::Number(code)) => Ok(Some(code.to_string())),
        Some(other) => Err(de::Error::custom(format!(
            "error code must be a string or number, got {other}"
        ))),
    }
}

/// Drain the response body. The connection is released once the body is consumed or dropped.
pub(crate) async fn read_body(response: Response) -> Result<(StatusCode, Bytes), RequestError> {
    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|source| RequestError::ReadBody { source })?;
    Ok((status, body))
}

/// Split a response into success bytes or a [`StatusError`].
pub(crate) fn classify(status: StatusCode, body: Bytes) -> Result<Bytes, StatusError> {
    if status.as_u16() < 400 {
        return Ok(body);
    }
    let details = serde_json::from_slice::<ErrorBody>(&body).ok();
    Err(StatusError {
        status: status.as_u16(),
        details,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

pub(crate) fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, serde_json::Error> {
    serde_json::from_slice(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use ensync_domain::Event;

    #[test]
    fn success_passes_bytes_through() -> Result<()> {
        let body = classify(StatusCode::NO_CONTENT, Bytes::new())?;
        assert!(body.is_empty());
        let body = classify(StatusCode::OK, Bytes::from_static(b"{\"name\":\"x\"}"))?;
        let event: Event = decode(&body)?;
        assert_eq!(event.name, "x");
        Ok(())
    }

    #[test]
    fn non_json_failure_keeps_raw_text() {
        let error = classify(StatusCode::NOT_FOUND, Bytes::from_static(b"404 page not found"))
            .err();
        let error = error.unwrap_or_else(|| panic!("expected status error"));
        assert_eq!(error.status, 404);
        assert!(error.details.is_none());
        assert_eq!(error.body, "404 page not found");
    }

    #[test]
    fn structured_failure_is_decoded() {
        let error = classify(
            StatusCode::BAD_REQUEST,
            Bytes::from_static(br#"{"message":"limit out of range","code":4001}"#),
        )
        .err()
        .unwrap_or_else(|| panic!("expected status error"));
        assert_eq!(error.message(), "limit out of range");
        assert_eq!(error.code(), Some("4001"));
    }

    #[test]
    fn body_without_message_falls_back_to_raw() {
        let error = classify(
            StatusCode::INTERNAL_SERVER_ERROR,
            Bytes::from_static(br#"{"error":"boom"}"#),
        )
        .err()
        .unwrap_or_else(|| panic!("expected status error"));
        assert!(error.details.is_none());
        assert_eq!(error.message(), r#"{"error":"boom"}"#);
    }
}

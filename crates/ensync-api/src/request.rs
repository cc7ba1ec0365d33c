//! Outgoing request description and URL assembly.

use std::fmt::Write as _;

use reqwest::Method;
use serde::Serialize;
use url::Url;

use crate::error::RequestError;

/// Header carrying the caller's access key.
pub const HEADER_ACCESS_KEY: &str = "x-access-key";
/// Media type for every request and response body.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// One API call before it reaches the pipeline.
///
/// Path segments are stored unescaped and percent-encoded when the URL is built,
/// so identifiers containing `/`, `?`, or spaces address a single resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    method: Method,
    segments: Vec<String>,
    query: Vec<(String, String)>,
    body: Option<Vec<u8>>,
}

impl ApiRequest {
    /// Request with the given method and path segments.
    pub fn new<I, S>(method: Method, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            method,
            segments: segments.into_iter().map(Into::into).collect(),
            query: Vec::new(),
            body: None,
        }
    }

    /// `GET` request.
    pub fn get<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::GET, segments)
    }

    /// `POST` request.
    pub fn post<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::POST, segments)
    }

    /// `PUT` request.
    pub fn put<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::PUT, segments)
    }

    /// `DELETE` request.
    pub fn delete<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::DELETE, segments)
    }

    /// Replace the query pairs.
    #[must_use]
    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    /// Serialise `body` as the JSON payload.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Encode`] when serialisation fails.
    pub fn with_json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, RequestError> {
        let encoded = serde_json::to_vec(body).map_err(|source| RequestError::Encode { source })?;
        self.body = Some(encoded);
        Ok(self)
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Query pairs in send order.
    #[must_use]
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Encoded JSON body, if any.
    #[must_use]
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Unescaped path for logs, e.g. `/event/user.created`.
    #[must_use]
    pub fn path(&self) -> String {
        self.segments
            .iter()
            .fold(String::new(), |mut path, segment| {
                let _ = write!(path, "/{segment}");
                path
            })
    }

    pub(crate) fn into_body(self) -> Option<Vec<u8>> {
        self.body
    }

    /// Append the path segments and query to `base`.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::InvalidUrl`] when a segment is empty or `base`
    /// cannot carry a path.
    pub fn url(&self, base: &Url) -> Result<Url, RequestError> {
        if self.segments.iter().any(String::is_empty) {
            return Err(RequestError::InvalidUrl { path: self.path() });
        }
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|()| RequestError::InvalidUrl { path: self.path() })?
            .pop_if_empty()
            .extend(&self.segments);
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }
        Ok(url)
    }
}

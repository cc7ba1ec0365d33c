//! The API client and its request pipeline.

use std::fmt::{self, Debug, Formatter};
use std::future::Future;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::instrument::WithSubscriber;
use tracing::{Dispatch, debug, error, warn};
use url::Url;

use crate::error::{ApiError, ApiResult, ClientBuildError, RequestError};
use crate::rate_limit::{RateLimit, RateLimiter};
use crate::request::{ApiRequest, CONTENT_TYPE_JSON, HEADER_ACCESS_KEY};
use crate::response;
use crate::retry::{RetryPolicy, RetryTransport};
use crate::service::ApiService;

const DEFAULT_USER_AGENT: &str = concat!("ensync/", env!("CARGO_PKG_VERSION"));

/// Client for the EnSync management API.
///
/// One instance may be shared across tasks: the access key sits behind a lock and
/// the rate limiter is internally synchronised.
pub struct Client {
    base_url: Url,
    access_key: RwLock<String>,
    transport: RetryTransport,
    rate_limiter: Option<RateLimiter>,
    timeout: Option<Duration>,
    logger: Dispatch,
}

impl Debug for Client {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Client")
            .field("base_url", &self.base_url.as_str())
            .field("access_key", &"<redacted>")
            .field("rate_limit", &self.rate_limiter.as_ref().map(RateLimiter::limit))
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Start configuring a client for `base_url`.
    #[must_use]
    pub fn builder(base_url: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(base_url)
    }

    /// Base URL every request path is appended to.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Replace the access key sent with subsequent requests.
    pub fn set_access_key(&self, access_key: &str) {
        let mut guard = self
            .access_key
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        access_key.clone_into(&mut guard);
    }

    /// Access key currently sent with requests; empty when none has been set.
    #[must_use]
    pub fn access_key(&self) -> String {
        self.access_key
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Run `request` through the pipeline and return the raw success body.
    ///
    /// Waits on the rate limiter, sends with retries, then classifies the response.
    /// Log events go to the client's logger.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::RateLimitExceeded`] when `cancel` fires while waiting
    /// for a token, [`RequestError::Cancelled`] when it fires during the exchange,
    /// [`RequestError::Timeout`] when the configured deadline elapses, and
    /// [`RequestError::Status`] for responses of 400 and above.
    pub async fn execute(
        &self,
        cancel: &CancellationToken,
        request: ApiRequest,
    ) -> Result<Bytes, RequestError> {
        self.run(cancel, request)
            .with_subscriber(self.logger.clone())
            .await
    }

    async fn run(
        &self,
        cancel: &CancellationToken,
        request: ApiRequest,
    ) -> Result<Bytes, RequestError> {
        if let Some(limiter) = &self.rate_limiter {
            limiter
                .acquire(cancel)
                .await
                .map_err(|source| RequestError::RateLimitExceeded { source })?;
        }

        let url = request.url(&self.base_url)?;
        let method = request.method().clone();
        let path = request.path();
        debug!(%method, %path, %url, query = ?request.query(), "sending request");

        let http_request = self.build_request(request, url)?;
        let exchange = async {
            let response = self.transport.send(http_request).await?;
            response::read_body(response).await
        };

        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(RequestError::Cancelled),
            outcome = self.within_deadline(exchange) => outcome,
        };
        let (status, body) = match outcome {
            Ok(received) => received,
            Err(err) => {
                warn!(%method, %path, error = %err, "request failed");
                return Err(err);
            }
        };

        debug!(
            %method,
            %path,
            status = status.as_u16(),
            body_size = body.len(),
            "received response"
        );
        if status.is_server_error() {
            error!(%method, %path, status = status.as_u16(), "server error");
        } else if status.is_client_error() {
            warn!(%method, %path, status = status.as_u16(), "client error");
        }

        response::classify(status, body).map_err(RequestError::from)
    }

    fn build_request(
        &self,
        request: ApiRequest,
        url: Url,
    ) -> Result<reqwest::Request, RequestError> {
        let mut builder = self
            .transport
            .client()
            .request(request.method().clone(), url)
            .header(HEADER_ACCESS_KEY, self.access_key())
            .header(ACCEPT, CONTENT_TYPE_JSON);
        if let Some(body) = request.into_body() {
            builder = builder.header(CONTENT_TYPE, CONTENT_TYPE_JSON).body(body);
        }
        builder
            .build()
            .map_err(|source| RequestError::Build { source })
    }

    async fn within_deadline<F, T>(&self, future: F) -> Result<T, RequestError>
    where
        F: Future<Output = Result<T, RequestError>>,
    {
        match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, future)
                .await
                .map_err(|_| RequestError::Timeout { timeout })?,
            None => future.await,
        }
    }

    /// Execute `request` and decode the JSON body into `T`.
    pub(crate) async fn fetch<T: DeserializeOwned>(
        &self,
        cancel: &CancellationToken,
        operation: Operation,
        request: ApiRequest,
    ) -> ApiResult<T> {
        let body = match self.execute(cancel, request).await {
            Ok(body) => body,
            Err(source) => return Err(operation.failed(source)),
        };
        response::decode(&body).map_err(|source| operation.undecodable(source))
    }

    /// Execute `request` and discard the body.
    pub(crate) async fn send(
        &self,
        cancel: &CancellationToken,
        operation: Operation,
        request: ApiRequest,
    ) -> ApiResult<()> {
        self.execute(cancel, request)
            .await
            .map(drop)
            .map_err(|source| operation.failed(source))
    }
}

impl ApiService for Client {
    fn set_access_key(&self, access_key: &str) {
        Self::set_access_key(self, access_key);
    }
}

/// Name and target of an API operation, attached to its errors.
#[derive(Debug, Clone)]
pub(crate) struct Operation {
    name: &'static str,
    target: Option<String>,
}

impl Operation {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self { name, target: None }
    }

    pub(crate) fn on(name: &'static str, target: impl Into<String>) -> Self {
        Self {
            name,
            target: Some(target.into()),
        }
    }

    /// Attach this operation's context to a request that failed to encode.
    pub(crate) fn prepare(
        &self,
        request: Result<ApiRequest, RequestError>,
    ) -> ApiResult<ApiRequest> {
        request.map_err(|source| self.clone().failed(source))
    }

    fn failed(self, source: RequestError) -> ApiError {
        ApiError::Request {
            operation: self.name,
            target: self.target,
            source,
        }
    }

    fn undecodable(self, source: serde_json::Error) -> ApiError {
        ApiError::Decode {
            operation: self.name,
            target: self.target,
            source,
        }
    }
}

/// Builder for [`Client`].
#[derive(Debug)]
pub struct ClientBuilder {
    base_url: String,
    access_key: String,
    timeout: Option<Duration>,
    rate_limit: Option<(f64, u32)>,
    retry: RetryPolicy,
    default_headers: Vec<(String, String)>,
    user_agent: String,
    logger: Dispatch,
}

impl ClientBuilder {
    fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            access_key: String::new(),
            timeout: None,
            rate_limit: None,
            retry: RetryPolicy::default(),
            default_headers: Vec::new(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            logger: Dispatch::none(),
        }
    }

    /// Initial access key.
    #[must_use]
    pub fn access_key(mut self, access_key: impl Into<String>) -> Self {
        self.access_key = access_key.into();
        self
    }

    /// Deadline for the whole exchange, retries and body read included.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Pace requests to `requests_per_second` with room for `burst`.
    #[must_use]
    pub fn rate_limit(mut self, requests_per_second: f64, burst: u32) -> Self {
        self.rate_limit = Some((requests_per_second, burst));
        self
    }

    /// Retry policy for network failures and 5xx responses.
    #[must_use]
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Header added to every request.
    #[must_use]
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// User agent sent with every request.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Logger receiving the client's log events. Defaults to a no-op dispatcher.
    #[must_use]
    pub fn logger(mut self, logger: Dispatch) -> Self {
        self.logger = logger;
        self
    }

    /// Validate settings and build the client.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientBuildError`] for an unusable base URL, rate limit, or header.
    pub fn build(self) -> Result<Client, ClientBuildError> {
        let base_url = Url::parse(&self.base_url).map_err(|source| {
            ClientBuildError::InvalidBaseUrl {
                url: self.base_url.clone(),
                source,
            }
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ClientBuildError::UnsupportedBaseUrl { url: self.base_url });
        }

        let rate_limiter = self
            .rate_limit
            .map(|(requests_per_second, burst)| RateLimit::per_second(requests_per_second, burst))
            .transpose()
            .map_err(|source| ClientBuildError::RateLimit { source })?
            .map(RateLimiter::new);

        let mut headers = HeaderMap::new();
        for (name, value) in &self.default_headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ClientBuildError::Header { name: name.clone() })?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| ClientBuildError::Header { name: name.clone() })?;
            headers.insert(header_name, header_value);
        }

        let http = reqwest::Client::builder()
            .user_agent(self.user_agent)
            .default_headers(headers)
            .build()
            .map_err(|source| ClientBuildError::Http { source })?;

        Ok(Client {
            base_url,
            access_key: RwLock::new(self.access_key),
            transport: RetryTransport::new(http, self.retry),
            rate_limiter,
            timeout: self.timeout,
            logger: self.logger,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use serde_json::json;

    fn client() -> Result<Client> {
        Ok(Client::builder("http://localhost:9/api/")
            .access_key("key-1")
            .default_header("x-request-id", "req-1")
            .build()?)
    }

    #[test]
    fn bodyless_requests_omit_content_type() -> Result<()> {
        let client = client()?;
        let request = ApiRequest::get(["event"]);
        let url = request.url(client.base_url())?;
        let built = client.build_request(request, url)?;

        assert_eq!(built.url().as_str(), "http://localhost:9/api/event");
        assert_eq!(built.headers()[HEADER_ACCESS_KEY], "key-1");
        assert_eq!(built.headers()[ACCEPT], CONTENT_TYPE_JSON);
        assert!(built.headers().get(CONTENT_TYPE).is_none());
        assert!(built.body().is_none());
        Ok(())
    }

    #[test]
    fn json_requests_carry_content_type() -> Result<()> {
        let client = client()?;
        let request = ApiRequest::post(["workspace"]).with_json(&json!({"name": "gms"}))?;
        let url = request.url(client.base_url())?;
        let built = client.build_request(request, url)?;

        assert_eq!(built.headers()[CONTENT_TYPE], CONTENT_TYPE_JSON);
        assert_eq!(
            built.body().and_then(reqwest::Body::as_bytes),
            Some(br#"{"name":"gms"}"#.as_slice())
        );
        Ok(())
    }

    #[test]
    fn access_key_can_be_replaced() -> Result<()> {
        let client = client()?;
        client.set_access_key("rotated");
        assert_eq!(client.access_key(), "rotated");
        assert!(!format!("{client:?}").contains("rotated"));
        Ok(())
    }

    #[test]
    fn builder_rejects_bad_settings() {
        assert!(matches!(
            Client::builder("not a url").build(),
            Err(ClientBuildError::InvalidBaseUrl { .. })
        ));
        assert!(matches!(
            Client::builder("mailto:ops@example.com").build(),
            Err(ClientBuildError::UnsupportedBaseUrl { .. })
        ));
        assert!(matches!(
            Client::builder("http://localhost").rate_limit(0.0, 1).build(),
            Err(ClientBuildError::RateLimit { .. })
        ));
        assert!(matches!(
            Client::builder("http://localhost")
                .default_header("bad header", "x")
                .build(),
            Err(ClientBuildError::Header { .. })
        ));
    }
}

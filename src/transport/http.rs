//! HTTP transport implementation.
//!
//! This module provides the reqwest-backed [`TransactionEndpoint`] that talks
//! to the transactional Cypher endpoint over plain HTTP or HTTPS.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, LOCATION};
use reqwest::Url;
use std::time::Duration;
use tracing::trace;

use crate::connection::auth::Credentials;
use crate::error::TransportError;

use super::messages::TxRequest;
use super::protocol::{EndpointParams, RawResponse, TransactionEndpoint};

const JSON_UTF8: &str = "application/json; charset=UTF-8";

/// HTTP transport implementation.
///
/// Each call performs one request with a fresh response; the underlying
/// client pools TCP connections between calls.
pub struct HttpTransport {
    /// HTTP client (None once closed)
    client: Option<reqwest::Client>,
    /// Endpoint parameters
    params: EndpointParams,
    /// Basic authentication credentials
    credentials: Option<Credentials>,
}

impl HttpTransport {
    /// Create a new HTTP transport.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Connect` if the endpoint parameters do not
    /// form a valid URL, or `TransportError::TlsError` if the client cannot
    /// be built (e.g. the TLS backend fails to initialize).
    pub fn new(
        params: EndpointParams,
        credentials: Option<&Credentials>,
    ) -> Result<Self, TransportError> {
        let url = params.transaction_url();
        Url::parse(&url).map_err(|e| {
            TransportError::Connect(format!("invalid endpoint URL '{}': {}", url, e))
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_UTF8));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_UTF8));
        headers.insert("x-stream", HeaderValue::from_static("true"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(params.timeout_ms))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| TransportError::TlsError(e.to_string()))?;

        Ok(Self {
            client: Some(client),
            params,
            credentials: credentials.cloned(),
        })
    }

    fn client(&self) -> Result<&reqwest::Client, TransportError> {
        self.client
            .as_ref()
            .ok_or_else(|| TransportError::Connect("Transport is closed".to_string()))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.credentials {
            Some(c) => request.basic_auth(c.username(), Some(c.password())),
            None => request,
        }
    }

    async fn read_response(
        &self,
        response: reqwest::Response,
    ) -> Result<RawResponse, TransportError> {
        let status = response.status().as_u16();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(|v| resolve_location(response.url(), v));
        let body = response.text().await?;

        trace!(status, body_len = body.len(), "received response");

        let raw = RawResponse::new(status, body);
        Ok(match location {
            Some(location) => raw.with_location(location),
            None => raw,
        })
    }
}

#[async_trait]
impl TransactionEndpoint for HttpTransport {
    fn params(&self) -> &EndpointParams {
        &self.params
    }

    async fn post(&mut self, url: &str, request: &TxRequest) -> Result<RawResponse, TransportError> {
        let body = serde_json::to_string(request)?;
        trace!(url, statements = request.len(), "POST");

        let builder = self.authorize(self.client()?.post(url).body(body));
        let response = builder.send().await?;
        self.read_response(response).await
    }

    async fn delete(&mut self, url: &str) -> Result<RawResponse, TransportError> {
        trace!(url, "DELETE");

        let builder = self.authorize(self.client()?.delete(url));
        let response = builder.send().await?;
        self.read_response(response).await
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.client = None;
        Ok(())
    }
}

/// Resolve a `Location` header against the URL of the request that
/// returned it. Unresolvable values are kept as sent.
fn resolve_location(request_url: &Url, location: &str) -> String {
    request_url
        .join(location)
        .map(String::from)
        .unwrap_or_else(|_| location.to_string())
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("endpoint", &self.params.transaction_url())
            .field("credentials", &self.credentials)
            .field("closed", &self.client.is_none())
            .finish()
    }
}

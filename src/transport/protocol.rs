//! Transport protocol abstraction trait.
//!
//! This module defines the `TransactionEndpoint` trait that abstracts the
//! HTTP exchange with the transactional query endpoint. The session decides
//! *which* URL to call; the endpoint only performs one request/response
//! cycle per call and never retries.

use crate::error::TransportError;
use async_trait::async_trait;

use super::messages::TxRequest;

/// Parameters for the transport connection.
#[derive(Debug, Clone)]
pub struct EndpointParams {
    /// Database host
    pub host: String,
    /// Database HTTP port
    pub port: u16,
    /// Use TLS/SSL
    pub use_tls: bool,
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
    /// Database name for the `/db/{name}/tx` endpoint family
    pub database: Option<String>,
}

impl EndpointParams {
    /// Create new endpoint parameters.
    pub fn new(host: String, port: u16) -> Self {
        Self {
            host,
            port,
            use_tls: false,
            timeout_ms: 30_000,
            database: None,
        }
    }

    /// Set whether to use TLS.
    pub fn with_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = use_tls;
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Target a named database instead of the legacy endpoint.
    pub fn with_database(mut self, database: Option<String>) -> Self {
        self.database = database;
        self
    }

    /// Build the server base URL from parameters.
    ///
    /// IPv6 literals are bracketed.
    pub fn base_url(&self) -> String {
        let scheme = if self.use_tls { "https" } else { "http" };
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("{}://[{}]:{}", scheme, self.host, self.port)
        } else {
            format!("{}://{}:{}", scheme, self.host, self.port)
        }
    }

    /// URL that opens a new transaction.
    pub fn transaction_url(&self) -> String {
        match &self.database {
            Some(db) => format!("{}/db/{}/tx", self.base_url(), db),
            None => format!("{}/db/data/transaction", self.base_url()),
        }
    }

    /// URL that opens, executes and commits in one request.
    pub fn autocommit_url(&self) -> String {
        format!("{}/commit", self.transaction_url())
    }
}

/// Raw HTTP response handed to the codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,
    /// `Location` header, present when a transaction was opened
    pub location: Option<String>,
    /// Response body
    pub body: String,
}

impl RawResponse {
    /// Create a response without a `Location` header.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            location: None,
            body: body.into(),
        }
    }

    /// Attach a `Location` header.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// Transport trait for the transactional HTTP endpoint.
///
/// Implementations perform exactly one HTTP exchange per call.
#[async_trait]
pub trait TransactionEndpoint: Send + Sync {
    /// Endpoint parameters (used to derive the endpoint URLs).
    fn params(&self) -> &EndpointParams;

    /// POST a statement batch to `url`.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the exchange fails. Errors for which
    /// [`TransportError::is_ambiguous`] is true may have reached the server.
    async fn post(&mut self, url: &str, request: &TxRequest)
        -> Result<RawResponse, TransportError>;

    /// DELETE `url` (rolls back the transaction it names).
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the exchange fails.
    async fn delete(&mut self, url: &str) -> Result<RawResponse, TransportError>;

    /// Release the underlying client.
    async fn close(&mut self) -> Result<(), TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_params_default() {
        let params = EndpointParams::new("localhost".to_string(), 7474);
        assert_eq!(params.host, "localhost");
        assert_eq!(params.port, 7474);
        assert!(!params.use_tls);
        assert_eq!(params.timeout_ms, 30_000);
        assert!(params.database.is_none());
    }

    #[test]
    fn test_endpoint_params_builder() {
        let params = EndpointParams::new("db.example.com".to_string(), 7473)
            .with_tls(true)
            .with_timeout(60_000)
            .with_database(Some("movies".to_string()));

        assert!(params.use_tls);
        assert_eq!(params.timeout_ms, 60_000);
        assert_eq!(params.database.as_deref(), Some("movies"));
    }

    #[test]
    fn test_legacy_urls() {
        let params = EndpointParams::new("localhost".to_string(), 7474);
        assert_eq!(params.base_url(), "http://localhost:7474");
        assert_eq!(
            params.transaction_url(),
            "http://localhost:7474/db/data/transaction"
        );
        assert_eq!(
            params.autocommit_url(),
            "http://localhost:7474/db/data/transaction/commit"
        );
    }

    #[test]
    fn test_database_urls_with_tls() {
        let params = EndpointParams::new("localhost".to_string(), 7473)
            .with_tls(true)
            .with_database(Some("neo4j".to_string()));
        assert_eq!(params.transaction_url(), "https://localhost:7473/db/neo4j/tx");
        assert_eq!(
            params.autocommit_url(),
            "https://localhost:7473/db/neo4j/tx/commit"
        );
    }

    #[test]
    fn test_ipv6_urls_parse() {
        let params = EndpointParams::new("::1".to_string(), 7474)
            .with_database(Some("neo4j".to_string()));
        assert_eq!(params.base_url(), "http://[::1]:7474");

        let url = reqwest::Url::parse(&params.transaction_url()).unwrap();
        assert_eq!(url.host_str(), Some("[::1]"));
        assert_eq!(url.path(), "/db/neo4j/tx");
    }

    #[test]
    fn test_bracketed_host_is_kept() {
        let params = EndpointParams::new("[fe80::1]".to_string(), 7474);
        assert_eq!(params.base_url(), "http://[fe80::1]:7474");
    }

    #[test]
    fn test_raw_response_location() {
        let response = RawResponse::new(201, "{}").with_location("http://h/db/data/transaction/3");
        assert_eq!(response.status, 201);
        assert_eq!(
            response.location.as_deref(),
            Some("http://h/db/data/transaction/3")
        );
    }
}

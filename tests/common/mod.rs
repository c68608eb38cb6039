//! Common test utilities for neo4j-http-tx integration tests.
//!
//! # Scripted endpoint
//!
//! Most integration tests run against [`ScriptedEndpoint`], an in-memory
//! `TransactionEndpoint` that answers from a queue of canned responses and
//! records every round trip. Tests assert on the exact number and shape of
//! round trips through the shared [`CallLog`].
//!
//! # Live server configuration
//!
//! Tests in `live_tests.rs` need a running Neo4j server:
//!
//! ```bash
//! docker run -d --name neo4j-test -p 7474:7474 \
//!   -e NEO4J_AUTH=neo4j/password neo4j:4.4
//! ```
//!
//! | Default Constant   | Environment Variable | Default Value |
//! |--------------------|----------------------|---------------|
//! | `DEFAULT_HOST`     | `NEO4J_HOST`         | "localhost"   |
//! | `DEFAULT_PORT`     | `NEO4J_PORT`         | 7474          |
//! | `DEFAULT_USER`     | `NEO4J_USER`         | "neo4j"       |
//! | `DEFAULT_PASSWORD` | `NEO4J_PASSWORD`     | "password"    |

#![allow(dead_code)]

use async_trait::async_trait;
use neo4j_http_tx::connection::ConnectionBuilder;
use neo4j_http_tx::error::TransportError;
use neo4j_http_tx::transport::{EndpointParams, RawResponse, TransactionEndpoint, TxRequest};
use neo4j_http_tx::Connection;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::env;
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Scripted endpoint
// ============================================================================

/// Base of the legacy endpoint family for `localhost:7474`.
pub const TX_BASE: &str = "http://localhost:7474/db/data/transaction";

/// Expiry header value used by scripted transaction responses.
pub const EXPIRES: &str = "Mon, 19 Oct 2026 10:00:00 +0000";

/// One recorded round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// `POST` or `DELETE`
    pub method: &'static str,
    /// Target URL
    pub url: String,
    /// Statement texts of the request, empty for `DELETE`
    pub statements: Vec<String>,
}

/// Shared log of round trips.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<RecordedCall>>>);

impl CallLog {
    /// Number of round trips so far.
    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    /// Snapshot of all recorded round trips.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.0.lock().unwrap().clone()
    }

    /// Most recent round trip.
    pub fn last(&self) -> Option<RecordedCall> {
        self.0.lock().unwrap().last().cloned()
    }

    /// Number of `DELETE` round trips.
    pub fn deletes(&self) -> usize {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.method == "DELETE")
            .count()
    }

    fn push(&self, call: RecordedCall) {
        self.0.lock().unwrap().push(call);
    }
}

/// Canned reaction to one round trip.
pub enum Scripted {
    /// Answer with a response
    Reply(RawResponse),
    /// Fail with a transport error
    Fail(TransportError),
    /// Never answer
    Stall,
}

/// In-memory endpoint answering from a queue.
///
/// An exhausted queue answers with a non-ambiguous connect error.
pub struct ScriptedEndpoint {
    params: EndpointParams,
    script: VecDeque<Scripted>,
    log: CallLog,
}

impl ScriptedEndpoint {
    /// Create an endpoint for `localhost:7474` with the given script.
    pub fn new(script: Vec<Scripted>) -> (Self, CallLog) {
        let log = CallLog::default();
        let endpoint = Self {
            params: EndpointParams::new("localhost".to_string(), 7474),
            script: script.into(),
            log: log.clone(),
        };
        (endpoint, log)
    }

    async fn answer(&mut self) -> Result<RawResponse, TransportError> {
        match self.script.pop_front() {
            Some(Scripted::Reply(raw)) => Ok(raw),
            Some(Scripted::Fail(e)) => Err(e),
            Some(Scripted::Stall) => std::future::pending().await,
            None => Err(TransportError::Connect("script exhausted".to_string())),
        }
    }
}

#[async_trait]
impl TransactionEndpoint for ScriptedEndpoint {
    fn params(&self) -> &EndpointParams {
        &self.params
    }

    async fn post(&mut self, url: &str, request: &TxRequest) -> Result<RawResponse, TransportError> {
        self.log.push(RecordedCall {
            method: "POST",
            url: url.to_string(),
            statements: request
                .statements
                .iter()
                .map(|s| s.statement.clone())
                .collect(),
        });
        self.answer().await
    }

    async fn delete(&mut self, url: &str) -> Result<RawResponse, TransportError> {
        self.log.push(RecordedCall {
            method: "DELETE",
            url: url.to_string(),
            statements: Vec::new(),
        });
        self.answer().await
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

/// Install a debug-level subscriber writing through the test harness.
///
/// Safe to call from every test; only the first call installs it.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Connection over a scripted endpoint.
pub fn scripted_connection(auto_commit: bool, script: Vec<Scripted>) -> (Connection, CallLog) {
    let params = ConnectionBuilder::new()
        .host("localhost")
        .auto_commit(auto_commit)
        .build()
        .unwrap();
    let (endpoint, log) = ScriptedEndpoint::new(script);
    (Connection::with_endpoint(params, Box::new(endpoint)), log)
}

/// Transaction URL for `id`.
pub fn tx_url(id: u64) -> String {
    format!("{}/{}", TX_BASE, id)
}

// ============================================================================
// Result bodies
// ============================================================================

/// Result of a write statement creating `nodes` nodes and `rels` relationships.
pub fn created(nodes: i64, rels: i64) -> Value {
    json!({
        "columns": [],
        "data": [],
        "stats": {
            "contains_updates": nodes + rels > 0,
            "nodes_created": nodes,
            "relationships_created": rels
        }
    })
}

/// Result with one column and one row per value.
pub fn rows(column: &str, values: &[Value]) -> Value {
    let data: Vec<Value> = values.iter().map(|v| json!({ "row": [v] })).collect();
    json!({ "columns": [column], "data": data })
}

// ============================================================================
// Responses
// ============================================================================

/// 201 response that opens transaction `id`.
pub fn opened(id: u64, results: Vec<Value>) -> Scripted {
    let body = json!({
        "commit": format!("{}/commit", tx_url(id)),
        "results": results,
        "transaction": { "expires": EXPIRES },
        "errors": []
    });
    Scripted::Reply(RawResponse::new(201, body.to_string()).with_location(tx_url(id)))
}

/// 200 response inside open transaction `id`.
pub fn in_tx(id: u64, results: Vec<Value>) -> Scripted {
    let body = json!({
        "commit": format!("{}/commit", tx_url(id)),
        "results": results,
        "transaction": { "expires": EXPIRES },
        "errors": []
    });
    Scripted::Reply(RawResponse::new(200, body.to_string()))
}

/// 200 response with no transaction left open.
pub fn ok(results: Vec<Value>) -> Scripted {
    let body = json!({ "results": results, "errors": [] });
    Scripted::Reply(RawResponse::new(200, body.to_string()))
}

/// 200 response reporting `code` after `results` executed.
pub fn failed(results: Vec<Value>, code: &str) -> Scripted {
    let body = json!({
        "results": results,
        "errors": [{ "code": code, "message": "scripted failure" }]
    });
    Scripted::Reply(RawResponse::new(200, body.to_string()))
}

/// 404 response for a transaction the server no longer knows.
pub fn not_found() -> Scripted {
    let body = json!({
        "results": [],
        "errors": [{
            "code": "Neo.ClientError.Transaction.TransactionNotFound",
            "message": "Unrecognized transaction id. Transaction may have timed out and been rolled back."
        }]
    });
    Scripted::Reply(RawResponse::new(404, body.to_string()))
}

/// Syntax error code.
pub const SYNTAX_ERROR: &str = "Neo.ClientError.Statement.SyntaxError";

// ============================================================================
// Live server configuration
// ============================================================================

/// Default host for the live server.
pub const DEFAULT_HOST: &str = "localhost";

/// Default HTTP port for the live server.
pub const DEFAULT_PORT: u16 = 7474;

/// Default username for the live server.
pub const DEFAULT_USER: &str = "neo4j";

/// Default password for the live server.
pub const DEFAULT_PASSWORD: &str = "password";

const ENV_NEO4J_HOST: &str = "NEO4J_HOST";
const ENV_NEO4J_PORT: &str = "NEO4J_PORT";
const ENV_NEO4J_USER: &str = "NEO4J_USER";
const ENV_NEO4J_PASSWORD: &str = "NEO4J_PASSWORD";

/// Host from `NEO4J_HOST` or the default.
pub fn get_host() -> String {
    env::var(ENV_NEO4J_HOST).unwrap_or_else(|_| DEFAULT_HOST.to_string())
}

/// Port from `NEO4J_PORT` or the default. Invalid values fall back to the default.
pub fn get_port() -> u16 {
    env::var(ENV_NEO4J_PORT)
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

/// Username from `NEO4J_USER` or the default.
pub fn get_user() -> String {
    env::var(ENV_NEO4J_USER).unwrap_or_else(|_| DEFAULT_USER.to_string())
}

/// Password from `NEO4J_PASSWORD` or the default.
pub fn get_password() -> String {
    env::var(ENV_NEO4J_PASSWORD).unwrap_or_else(|_| DEFAULT_PASSWORD.to_string())
}

/// Connection URL for the live server.
pub fn get_test_connection_string() -> String {
    format!(
        "jdbc:neo4j:http://{}:{}@{}:{}",
        get_user(),
        get_password(),
        get_host(),
        get_port()
    )
}

/// Check if a server accepts TCP connections at the configured address.
pub fn is_neo4j_available() -> bool {
    let addr = format!("{}:{}", get_host(), get_port());
    let socket_addrs: Vec<_> = match addr.to_socket_addrs() {
        Ok(addrs) => addrs.collect(),
        Err(_) => return false,
    };
    socket_addrs
        .iter()
        .any(|a| TcpStream::connect_timeout(a, Duration::from_secs(2)).is_ok())
}

/// Skip a test if no server is reachable.
#[macro_export]
macro_rules! skip_if_no_neo4j {
    () => {
        if !$crate::common::is_neo4j_available() {
            eprintln!(
                "Skipping test: Neo4j not available at {}:{}",
                $crate::common::get_host(),
                $crate::common::get_port()
            );
            return;
        }
    };
}

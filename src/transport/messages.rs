//! JSON message types for the transactional HTTP endpoint.
//!
//! This module defines the request and response bodies exchanged with the
//! Neo4j transactional Cypher endpoint.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::deserialize::rows_from_data;

/// Request body: an ordered list of statements.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct TxRequest {
    /// Statements, executed by the server in array order
    pub statements: Vec<WireStatement>,
}

impl TxRequest {
    /// Create a request with no statements (used to open a transaction).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a request from wire statements.
    pub fn new(statements: Vec<WireStatement>) -> Self {
        Self { statements }
    }

    /// Number of statements in the request.
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// Whether the request carries no statements.
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

/// One statement in a request.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WireStatement {
    /// Cypher text
    pub statement: String,
    /// Parameters, keyed by name
    pub parameters: Map<String, Value>,
    /// Ask the server to report mutation counters
    pub include_stats: bool,
    /// Result formats requested
    pub result_data_contents: Vec<String>,
}

impl WireStatement {
    /// Create a new wire statement requesting row data.
    pub fn new(statement: String, parameters: Map<String, Value>, include_stats: bool) -> Self {
        Self {
            statement,
            parameters,
            include_stats,
            result_data_contents: vec!["row".to_string()],
        }
    }
}

/// Response body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TxResponse {
    /// Commit URL, present while a transaction is open
    #[serde(default)]
    pub commit: Option<String>,
    /// One result per successfully executed statement
    #[serde(default)]
    pub results: Vec<WireResult>,
    /// Transaction information, present while a transaction is open
    #[serde(default)]
    pub transaction: Option<TransactionInfo>,
    /// Errors; at most one statement fails per request
    #[serde(default)]
    pub errors: Vec<WireError>,
}

/// Result of one statement.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireResult {
    /// Column names
    #[serde(default)]
    pub columns: Vec<String>,
    /// Row-major cell values
    #[serde(default, deserialize_with = "rows_from_data")]
    pub data: Vec<Vec<Value>>,
    /// Mutation counters (only when requested)
    #[serde(default)]
    pub stats: Option<WireStats>,
}

/// Mutation counters reported by the server.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WireStats {
    pub contains_updates: bool,
    pub nodes_created: i64,
    pub nodes_deleted: i64,
    pub relationships_created: i64,
    // The server spells this one in the singular.
    #[serde(alias = "relationships_deleted")]
    pub relationship_deleted: i64,
    pub properties_set: i64,
    pub labels_added: i64,
    pub labels_removed: i64,
    pub indexes_added: i64,
    pub indexes_removed: i64,
    pub constraints_added: i64,
    pub constraints_removed: i64,
}

/// Transaction information.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionInfo {
    /// Expiry timestamp (RFC 1123)
    #[serde(default)]
    pub expires: Option<String>,
}

/// Server-reported error.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct WireError {
    /// Status code, e.g. `Neo.ClientError.Statement.SyntaxError`
    pub code: String,
    /// Human-readable message
    #[serde(default)]
    pub message: String,
}

//! Statement results.
//!
//! A `ResultEnvelope` is the parsed outcome of one statement: its columns,
//! rows and optional mutation counters. Envelopes are returned in the order
//! the statements were submitted.

use crate::transport::messages::{WireResult, WireStats};
use serde_json::Value;

/// Mutation counters for one statement.
///
/// Missing counters are zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphStats {
    pub contains_updates: bool,
    pub nodes_created: i64,
    pub nodes_deleted: i64,
    pub relationships_created: i64,
    pub relationship_deleted: i64,
    pub properties_set: i64,
    pub labels_added: i64,
    pub labels_removed: i64,
    pub indexes_added: i64,
    pub indexes_removed: i64,
    pub constraints_added: i64,
    pub constraints_removed: i64,
}

impl GraphStats {
    /// Number of graph elements created or deleted.
    ///
    /// Property, label, index and constraint changes are not counted.
    pub fn update_count(&self) -> i64 {
        self.nodes_created
            + self.nodes_deleted
            + self.relationships_created
            + self.relationship_deleted
    }

    /// Look up a counter by its wire name.
    pub fn get(&self, key: &str) -> Option<i64> {
        let value = match key {
            "nodes_created" => self.nodes_created,
            "nodes_deleted" => self.nodes_deleted,
            "relationships_created" => self.relationships_created,
            "relationship_deleted" | "relationships_deleted" => self.relationship_deleted,
            "properties_set" => self.properties_set,
            "labels_added" => self.labels_added,
            "labels_removed" => self.labels_removed,
            "indexes_added" => self.indexes_added,
            "indexes_removed" => self.indexes_removed,
            "constraints_added" => self.constraints_added,
            "constraints_removed" => self.constraints_removed,
            _ => return None,
        };
        Some(value)
    }
}

impl From<WireStats> for GraphStats {
    fn from(stats: WireStats) -> Self {
        Self {
            contains_updates: stats.contains_updates,
            nodes_created: stats.nodes_created,
            nodes_deleted: stats.nodes_deleted,
            relationships_created: stats.relationships_created,
            relationship_deleted: stats.relationship_deleted,
            properties_set: stats.properties_set,
            labels_added: stats.labels_added,
            labels_removed: stats.labels_removed,
            indexes_added: stats.indexes_added,
            indexes_removed: stats.indexes_removed,
            constraints_added: stats.constraints_added,
            constraints_removed: stats.constraints_removed,
        }
    }
}

/// Error reported by the server for one statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerError {
    /// Status code
    pub code: String,
    /// Message
    pub message: String,
}

impl ServerError {
    /// Whether the code says the transaction is unknown to the server.
    pub fn is_transaction_not_found(&self) -> bool {
        matches!(
            self.code.as_str(),
            "Neo.ClientError.Transaction.TransactionNotFound"
                | "Neo.ClientError.Transaction.UnknownId"
        )
    }
}

/// Parsed outcome of one statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultEnvelope {
    /// Column names, in projection order
    pub columns: Vec<String>,
    /// Rows of cell values
    pub rows: Vec<Vec<Value>>,
    /// Mutation counters, present when requested
    pub stats: Option<GraphStats>,
    /// Error, present on the envelope of a failed statement
    pub error: Option<ServerError>,
}

impl ResultEnvelope {
    /// Build an envelope from a wire result, keeping at most `max_rows`
    /// rows (`0` keeps all).
    pub(crate) fn from_wire(result: WireResult, max_rows: usize) -> Self {
        let mut rows = result.data;
        if max_rows > 0 && rows.len() > max_rows {
            rows.truncate(max_rows);
        }
        Self {
            columns: result.columns,
            rows,
            stats: result.stats.map(GraphStats::from),
            error: None,
        }
    }

    /// Envelope for a statement the server rejected.
    pub(crate) fn failed(error: ServerError) -> Self {
        Self {
            error: Some(error),
            ..Default::default()
        }
    }

    /// Whether this statement produced a tabular result.
    pub fn has_result_set(&self) -> bool {
        !self.columns.is_empty()
    }

    /// Update count, or `-1` if the statement produced a result set.
    pub fn update_count(&self) -> i64 {
        if self.has_result_set() {
            return -1;
        }
        self.stats.as_ref().map(GraphStats::update_count).unwrap_or(0)
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Index of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell value at `row`, column `name`.
    pub fn value(&self, row: usize, name: &str) -> Option<&Value> {
        let col = self.column_index(name)?;
        self.rows.get(row)?.get(col)
    }
}

/// Aggregated response of one round trip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResponse {
    /// One envelope per statement that executed
    pub results: Vec<ResultEnvelope>,
    /// Transaction that remains open after this round trip, if any
    pub open_transaction_id: Option<u64>,
}

impl QueryResponse {
    /// First envelope, if any statement executed.
    pub fn first(&self) -> Option<&ResultEnvelope> {
        self.results.first()
    }

    /// Whether any statement in the round trip reported an error.
    pub fn has_errors(&self) -> bool {
        self.results.iter().any(|r| r.error.is_some())
    }
}

//! Error types for neo4j-http-tx.
//!
//! This module defines domain-specific error types organized by functional area.

use std::fmt;
use thiserror::Error;

/// Top-level error type encompassing all possible errors.
#[derive(Error, Debug)]
pub enum Neo4jError {
    /// Connection-related errors
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Transaction session errors
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Batch execution errors
    #[error(transparent)]
    Batch(#[from] BatchError),

    /// Transport protocol errors
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Errors related to connection setup and configuration.
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// Failed to establish connection to the database
    #[error("Failed to connect to {host}:{port}: {message}")]
    ConnectionFailed {
        host: String,
        port: u16,
        message: String,
    },

    /// Invalid connection parameters
    #[error("Invalid connection parameter '{parameter}': {message}")]
    InvalidParameter { parameter: String, message: String },

    /// Connection string parsing error
    #[error("Failed to parse connection string: {0}")]
    ParseError(String),

    /// No registered driver accepts the connection string
    #[error("No driver accepts connection string '{0}'")]
    NoSuitableDriver(String),
}

/// Errors raised by the transaction session.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Operation attempted after the session was closed
    #[error("Session is closed")]
    Closed,

    /// Operation is not legal in the current session state
    #[error("Invalid session state: {0}")]
    InvalidState(String),

    /// Malformed or unexpected server response
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// One statement of a round trip failed on the server
    #[error(transparent)]
    Statement(#[from] StatementFailure),

    /// The round trip failed after the request may have reached the server
    #[error("Outcome of {operation} is unknown: {message}")]
    AmbiguousOutcome { operation: String, message: String },

    /// Statement rejected by the read-only guard before any round trip
    #[error("Mutating query in read-only mode: {query}")]
    ReadOnlyViolation { query: String },

    /// The server no longer knows the transaction (expired or rolled back)
    #[error("Transaction {tx_id} no longer exists on the server")]
    TransactionExpired { tx_id: u64 },

    /// Transport failure that provably never reached the server
    #[error(transparent)]
    Transport(TransportError),
}

/// A statement that failed server-side, together with the results of the
/// statements that completed before it in the same round trip.
#[derive(Error, Debug, Clone)]
#[error("Statement {index} failed: {code}: {message}")]
pub struct StatementFailure {
    /// Position of the failed statement within its round trip (0-based)
    pub index: usize,
    /// Server status code, e.g. `Neo.ClientError.Statement.SyntaxError`
    pub code: String,
    /// Server error message
    pub message: String,
    /// Results of statements `0..index`
    pub completed: Vec<crate::query::results::ResultEnvelope>,
}

/// Aggregate failure of a batch, carrying the update counts of the
/// statements the server applied before the failing one.
#[derive(Error, Debug)]
#[error("Batch failed at statement {failed_index} after {} successful statements: {source}", .update_counts.len())]
pub struct BatchError {
    /// Update counts for statements `0..failed_index`
    pub update_counts: Vec<i64>,
    /// Index of the statement that failed, if the failure is attributable
    pub failed_index: usize,
    /// Underlying session error
    #[source]
    pub source: SessionError,
}

/// Errors related to the HTTP transport.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Could not connect; the request was never sent
    #[error("Connection error: {0}")]
    Connect(String),

    /// Request timed out after it was sent
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Network I/O failure while the request was in flight
    #[error("Network I/O error: {0}")]
    IoError(String),

    /// Message serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Response body could not be read after the request was sent
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// Invalid response from server
    #[error("Invalid server response: {0}")]
    InvalidResponse(String),

    /// TLS/SSL error
    #[error("TLS error: {0}")]
    TlsError(String),
}

impl TransportError {
    /// Whether the server may have received and applied the request.
    pub fn is_ambiguous(&self) -> bool {
        matches!(
            self,
            TransportError::Timeout(_)
                | TransportError::IoError(_)
                | TransportError::DeserializationError(_)
        )
    }
}

/// Coarse error codes for callers that dispatch on error class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Unknown error
    Unknown = 0,
    /// Connection error
    Connection = 1,
    /// Invalid argument
    InvalidArgument = 2,
    /// Invalid state
    InvalidState = 3,
    /// Malformed server response
    Protocol = 4,
    /// Statement rejected by the server
    Statement = 5,
    /// Outcome unknown, do not blindly retry
    Ambiguous = 6,
    /// Read-only violation
    ReadOnly = 7,
    /// Timeout
    Timeout = 8,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Unknown => write!(f, "UNKNOWN"),
            ErrorCode::Connection => write!(f, "CONNECTION"),
            ErrorCode::InvalidArgument => write!(f, "INVALID_ARGUMENT"),
            ErrorCode::InvalidState => write!(f, "INVALID_STATE"),
            ErrorCode::Protocol => write!(f, "PROTOCOL"),
            ErrorCode::Statement => write!(f, "STATEMENT"),
            ErrorCode::Ambiguous => write!(f, "AMBIGUOUS"),
            ErrorCode::ReadOnly => write!(f, "READ_ONLY"),
            ErrorCode::Timeout => write!(f, "TIMEOUT"),
        }
    }
}

impl Neo4jError {
    /// Map to error code.
    pub fn to_error_code(&self) -> ErrorCode {
        match self {
            Neo4jError::Connection(e) => e.to_error_code(),
            Neo4jError::Session(e) => e.to_error_code(),
            Neo4jError::Batch(e) => e.source.to_error_code(),
            Neo4jError::Transport(e) => e.to_error_code(),
        }
    }
}

impl ConnectionError {
    /// Map to error code.
    pub fn to_error_code(&self) -> ErrorCode {
        match self {
            ConnectionError::InvalidParameter { .. } | ConnectionError::ParseError(_) => {
                ErrorCode::InvalidArgument
            }
            _ => ErrorCode::Connection,
        }
    }
}

impl SessionError {
    /// Map to error code.
    pub fn to_error_code(&self) -> ErrorCode {
        match self {
            SessionError::Closed | SessionError::InvalidState(_) => ErrorCode::InvalidState,
            SessionError::TransactionExpired { .. } => ErrorCode::InvalidState,
            SessionError::Protocol(_) => ErrorCode::Protocol,
            SessionError::Statement(_) => ErrorCode::Statement,
            SessionError::AmbiguousOutcome { .. } => ErrorCode::Ambiguous,
            SessionError::ReadOnlyViolation { .. } => ErrorCode::ReadOnly,
            SessionError::Transport(e) => e.to_error_code(),
        }
    }
}

impl TransportError {
    /// Map to error code.
    pub fn to_error_code(&self) -> ErrorCode {
        match self {
            TransportError::Timeout(_) => ErrorCode::Timeout,
            TransportError::InvalidResponse(_) | TransportError::DeserializationError(_) => {
                ErrorCode::Protocol
            }
            TransportError::SerializationError(_) => ErrorCode::InvalidArgument,
            _ => ErrorCode::Connection,
        }
    }
}

// Conversions from external error types
impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        TransportError::SerializationError(err.to_string())
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else if err.is_builder() {
            TransportError::SerializationError(err.to_string())
        } else if err.is_decode() {
            TransportError::DeserializationError(err.to_string())
        } else {
            TransportError::IoError(err.to_string())
        }
    }
}

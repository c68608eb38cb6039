//! Batch execution.
//!
//! A batch is submitted in a single round trip whatever the transaction mode.
//! In autocommit mode the server commits it atomically. In explicit mode it
//! runs inside the open transaction and the caller still has to commit.

use crate::connection::session::TransactionSession;
use crate::error::{BatchError, SessionError};
use crate::query::results::ResultEnvelope;
use crate::query::statement::StatementDescriptor;
use tracing::debug;

/// Update count per envelope: `-1` for statements that produced a result
/// set, otherwise the number of nodes and relationships created or deleted.
pub fn update_counts(results: &[ResultEnvelope]) -> Vec<i64> {
    results.iter().map(ResultEnvelope::update_count).collect()
}

/// Execute `descriptors` as one batch and return one update count each.
///
/// # Errors
///
/// Returns `BatchError` carrying the update counts of the statements that
/// executed before the failure. Statements at or after the failed index are
/// never counted.
pub async fn execute_batch(
    session: &mut TransactionSession,
    descriptors: &[StatementDescriptor],
) -> Result<Vec<i64>, BatchError> {
    if descriptors.is_empty() {
        return Ok(Vec::new());
    }

    debug!(statements = descriptors.len(), auto_commit = session.auto_commit(), "executing batch");

    match session.execute(descriptors).await {
        Ok(results) => Ok(update_counts(&results)),
        Err(SessionError::Statement(failure)) => Err(BatchError {
            update_counts: update_counts(&failure.completed),
            failed_index: failure.index,
            source: SessionError::Statement(failure),
        }),
        Err(source) => Err(BatchError {
            update_counts: Vec::new(),
            failed_index: 0,
            source,
        }),
    }
}

/// Pending statements accumulated for one batch.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    pending: Vec<StatementDescriptor>,
}

impl Batch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a statement.
    pub fn push(&mut self, descriptor: StatementDescriptor) {
        self.pending.push(descriptor);
    }

    /// Drop all pending statements.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Number of pending statements.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether no statement is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Pending statements, in insertion order.
    pub fn descriptors(&self) -> &[StatementDescriptor] {
        &self.pending
    }

    /// Execute and clear the pending statements.
    ///
    /// The batch is cleared whether or not execution succeeds.
    pub async fn execute(
        &mut self,
        session: &mut TransactionSession,
    ) -> Result<Vec<i64>, BatchError> {
        let pending = std::mem::take(&mut self.pending);
        execute_batch(session, &pending).await
    }
}

//! Statements, results and batch execution.
//!
//! # Overview
//!
//! The query module is organized into:
//! - `statement` - statement descriptors and parameter values
//! - `results` - per-statement result envelopes and mutation counters
//! - `guard` - read-only keyword guard
//! - `batch` - batch execution and update counts
//!
//! # Example
//!
//! ```no_run
//! use neo4j_http_tx::connection::{SessionConfig, TransactionSession};
//! use neo4j_http_tx::query::{execute_batch, Parameter, StatementDescriptor};
//! use neo4j_http_tx::transport::{EndpointParams, HttpTransport};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = HttpTransport::new(EndpointParams::new("localhost".to_string(), 7474), None)?;
//! let mut session = TransactionSession::new(Box::new(transport), SessionConfig::default());
//!
//! let batch = vec![
//!     StatementDescriptor::positional("CREATE (:User {name: ?})", vec![Parameter::from("Ada")], true),
//!     StatementDescriptor::positional("CREATE (:User {name: ?})", vec![Parameter::from("Alan")], true),
//! ];
//! let counts = execute_batch(&mut session, &batch).await?;
//! assert_eq!(counts, vec![1, 1]);
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod guard;
pub mod results;
pub mod statement;

// Re-export commonly used types
pub use batch::{execute_batch, update_counts, Batch};
pub use guard::{check_read_only, is_mutating};
pub use results::{GraphStats, QueryResponse, ResultEnvelope, ServerError};
pub use statement::{rewrite_placeholders, Parameter, ParameterMap, StatementDescriptor};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_exports() {
        // Compile-time check that key types are exported
        let _: Option<Parameter> = None;
        let _: Option<ResultEnvelope> = None;
        let _batch = Batch::new();
        let _ = StatementDescriptor::new("RETURN 1");
    }
}

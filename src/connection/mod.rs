//! Connection parameters, credentials and the transaction session.
//!
//! # Example
//!
//! ```no_run
//! # use neo4j_http_tx::connection::{ConnectionBuilder, ConnectionParams};
//! # use std::str::FromStr;
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Using ConnectionBuilder
//! let params = ConnectionBuilder::new()
//!     .host("localhost")
//!     .port(7474)
//!     .username("neo4j")
//!     .password("secret")
//!     .auto_commit(false)
//!     .timeout(std::time::Duration::from_secs(10))
//!     .build()?;
//!
//! // Or parse from a connection URL
//! let params = ConnectionParams::from_str(
//!     "jdbc:neo4j:http://localhost:7474?user=neo4j,password=secret,autocommit=false"
//! )?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod params;
pub mod session;

pub use auth::Credentials;
pub use params::{ConnectionBuilder, ConnectionParams};
pub use session::{SessionConfig, TransactionSession, TxState};

//! Transport layer for the Neo4j transactional HTTP endpoint.
//!
//! # Architecture
//!
//! The transport layer is organized into:
//! - `protocol` - `TransactionEndpoint` trait and endpoint URL derivation
//! - `messages` - JSON request/response bodies
//! - `deserialize` - row flattening for the `data` member of a result
//! - `codec` - pure translation between descriptors, envelopes and raw responses
//! - `http` - reqwest-backed endpoint implementation
//!
//! # Example
//!
//! ```no_run
//! use neo4j_http_tx::transport::{codec, EndpointParams, HttpTransport, TransactionEndpoint};
//! use neo4j_http_tx::StatementDescriptor;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let params = EndpointParams::new("localhost".to_string(), 7474);
//! let mut transport = HttpTransport::new(params, None)?;
//!
//! let request = codec::encode(&[StatementDescriptor::new("RETURN 1")])?;
//! let url = transport.params().autocommit_url();
//! let raw = transport.post(&url, &request).await?;
//! let decoded = codec::decode(raw, &request, 0)?;
//! println!("{:?}", decoded.results);
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod deserialize;
pub mod http;
pub mod messages;
pub mod protocol;

// Re-export commonly used types
pub use codec::DecodedResponse;
pub use http::HttpTransport;
pub use messages::{TxRequest, TxResponse, WireStatement};
pub use protocol::{EndpointParams, RawResponse, TransactionEndpoint};

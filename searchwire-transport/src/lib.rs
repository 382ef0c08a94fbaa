//! # Searchwire Transport
//!
//! Blocking REST transport for Elasticsearch-compatible search clusters.
//!
//! ## Features
//!
//! - **Node pool**: manually configured or autodetected cluster members,
//!   with one randomly selected active node per open/close cycle
//! - **Lazy lifecycle**: connections open on first use, re-opening is a
//!   no-op, closing releases the transport handle deterministically
//! - **Verb methods**: `get`/`head`/`post`/`put`/`delete` over literal or
//!   segment-built paths, with 404 surfaced as `None`/`false` instead of
//!   an error
//! - **Response negotiation**: JSON and plain-text decoding by content
//!   type, with raw passthrough on request
//! - **Instrumentation**: `tracing` logging plus a pluggable profiler
//!   bracketing every request
//!
//! One request at a time, no retries, no pooling: the command layer above
//! decides what to do with failures and absences.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use searchwire_transport::{Connection, ConnectionConfig, RequestPath};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConnectionConfig::builder()
//!         .node("127.0.0.1:9200")
//!         .build();
//!     let mut conn = Connection::new(config)?;
//!
//!     let health = conn.get(
//!         RequestPath::segments(["_cluster", "health"]),
//!         &[],
//!         None,
//!         false,
//!     )?;
//!     println!("{health:?}");
//!     Ok(())
//! }
//! ```

mod config;
mod connection;
mod error;
mod node;
mod path;
mod profile;
mod response;

pub use config::{ConnectionConfig, ConnectionConfigBuilder};
pub use connection::Connection;
pub use error::{ClientError, Result};
pub use node::{BasicAuth, Node, NodeAuth, NodePool, NodeSpec, Protocol};
pub use path::{RequestPath, Segment};
pub use profile::{NoopProfiler, ProfileContext, Profiler};
pub use response::{Payload, ResponseParts};

// Re-export common types
pub use http::{Method, StatusCode};

/// Prelude for common imports.
///
/// ```
/// use searchwire_transport::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{ConnectionConfig, ConnectionConfigBuilder};
    pub use crate::connection::Connection;
    pub use crate::error::{ClientError, Result};
    pub use crate::node::{BasicAuth, Node, NodeAuth, NodeSpec, Protocol};
    pub use crate::path::{RequestPath, Segment};
    pub use crate::profile::{NoopProfiler, ProfileContext, Profiler};
    pub use crate::response::{Payload, ResponseParts};
}

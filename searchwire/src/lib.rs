//! # Searchwire
//!
//! REST commands for Elasticsearch-compatible search clusters, layered
//! over the blocking [`searchwire_transport`] connection.
//!
//! The transport owns node management, URL construction and the HTTP
//! lifecycle; this crate maps the per-endpoint surface — documents,
//! search and scroll, indices, aliases, mappings, templates — onto the
//! five transport verbs, branching document addressing on the configured
//! DSL generation (`[index, "_doc", id]` from generation 7 on,
//! `[index, type, id]` before).
//!
//! # Example
//!
//! ```rust,no_run
//! use searchwire::{Command, Connection, ConnectionConfig};
//! use serde_json::json;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConnectionConfig::builder()
//!         .node("127.0.0.1:9200")
//!         .build();
//!     let mut conn = Connection::new(config)?;
//!
//!     let mut command = Command::new(&mut conn).index("customer");
//!     command.insert(Some("1"), &json!({"name": "John Doe"}))?;
//!
//!     if let Some(doc) = command.get("1")? {
//!         println!("{doc}");
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod command;

pub use command::Command;

// The transport surface, re-exported so callers need a single dependency.
pub use searchwire_transport::{
    BasicAuth, ClientError, Connection, ConnectionConfig, ConnectionConfigBuilder, Node, NodeAuth,
    NodeSpec, Payload, ProfileContext, Profiler, Protocol, RequestPath, Result, Segment,
};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::command::Command;
    pub use searchwire_transport::prelude::*;
}

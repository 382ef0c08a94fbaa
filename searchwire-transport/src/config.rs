//! Connection configuration.

use crate::node::{BasicAuth, NodeSpec, Protocol};
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_user_agent() -> String {
    format!("searchwire/{}", env!("CARGO_PKG_VERSION"))
}

fn default_dsl_version() -> u32 {
    8
}

/// Connection configuration.
///
/// This is the persistable surface of a connection: it carries no live
/// transport state, so it can be serialized freely and turned back into
/// a (closed) [`crate::Connection`] that reopens lazily on first use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Candidate cluster nodes.
    pub nodes: Vec<NodeSpec>,
    /// Protocol for nodes that do not specify one.
    #[serde(default)]
    pub default_protocol: Protocol,
    /// Query DSL generation; `>= 7` selects typeless document addressing.
    #[serde(default = "default_dsl_version")]
    pub dsl_version: u32,
    /// Global Basic credentials, inherited by nodes unless overridden.
    #[serde(default)]
    pub auth: Option<BasicAuth>,
    /// Connect timeout, enforced natively by the transport.
    #[serde(default)]
    pub connect_timeout: Option<Duration>,
    /// Data-read timeout for the whole request.
    #[serde(default)]
    pub read_timeout: Option<Duration>,
    /// Replace the configured node list by querying the cluster on open.
    #[serde(default)]
    pub auto_detect: bool,
    /// User-agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Extra headers merged into every request. Caller-supplied values
    /// win over built-in defaults, except `Content-Type` which is fixed
    /// to `application/json`.
    #[serde(default)]
    pub default_headers: Vec<(String, String)>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            default_protocol: Protocol::Http,
            dsl_version: default_dsl_version(),
            auth: None,
            connect_timeout: None,
            read_timeout: None,
            auto_detect: false,
            user_agent: default_user_agent(),
            default_headers: Vec::new(),
        }
    }
}

impl ConnectionConfig {
    /// Configuration for a single node address.
    pub fn single_node(address: impl Into<String>) -> Self {
        Self {
            nodes: vec![NodeSpec::new(address)],
            ..Self::default()
        }
    }

    /// Create a configuration builder.
    pub fn builder() -> ConnectionConfigBuilder {
        ConnectionConfigBuilder::default()
    }
}

/// Builder for [`ConnectionConfig`].
#[derive(Debug, Default)]
pub struct ConnectionConfigBuilder {
    config: ConnectionConfig,
}

impl ConnectionConfigBuilder {
    /// Add a node by address.
    pub fn node(mut self, address: impl Into<String>) -> Self {
        self.config.nodes.push(NodeSpec::new(address));
        self
    }

    /// Add a fully-specified node.
    pub fn node_spec(mut self, spec: NodeSpec) -> Self {
        self.config.nodes.push(spec);
        self
    }

    /// Set the default protocol for nodes without one.
    pub fn default_protocol(mut self, protocol: Protocol) -> Self {
        self.config.default_protocol = protocol;
        self
    }

    /// Select the query DSL generation (default 8).
    pub fn dsl_version(mut self, version: u32) -> Self {
        self.config.dsl_version = version;
        self
    }

    /// Set global Basic credentials.
    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.auth = Some(BasicAuth::new(username, password));
        self
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = Some(timeout);
        self
    }

    /// Set the data-read timeout.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = Some(timeout);
        self
    }

    /// Enable or disable cluster autodetection on open.
    pub fn auto_detect(mut self, enable: bool) -> Self {
        self.config.auto_detect = enable;
        self
    }

    /// Override the user-agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Add a header sent with every request.
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config
            .default_headers
            .push((name.into(), value.into()));
        self
    }

    /// Build the configuration.
    pub fn build(self) -> ConnectionConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConnectionConfig::default();
        assert_eq!(config.dsl_version, 8);
        assert_eq!(config.default_protocol, Protocol::Http);
        assert!(!config.auto_detect);
        assert!(config.auth.is_none());
        assert!(config.user_agent.starts_with("searchwire/"));
    }

    #[test]
    fn test_builder() {
        let config = ConnectionConfig::builder()
            .node("127.0.0.1:9200")
            .node("127.0.0.1:9201")
            .default_protocol(Protocol::Https)
            .dsl_version(6)
            .basic_auth("elastic", "secret")
            .connect_timeout(Duration::from_secs(3))
            .read_timeout(Duration::from_secs(30))
            .auto_detect(true)
            .default_header("x-opaque-id", "searchwire-tests")
            .build();

        assert_eq!(config.nodes.len(), 2);
        assert_eq!(config.default_protocol, Protocol::Https);
        assert_eq!(config.dsl_version, 6);
        assert_eq!(config.auth.as_ref().unwrap().username, "elastic");
        assert_eq!(config.connect_timeout, Some(Duration::from_secs(3)));
        assert!(config.auto_detect);
        assert_eq!(config.default_headers.len(), 1);
    }

    #[test]
    fn test_config_round_trips_through_serde() {
        let config = ConnectionConfig::builder()
            .node("127.0.0.1:9200")
            .basic_auth("elastic", "secret")
            .read_timeout(Duration::from_secs(10))
            .build();

        let encoded = serde_json::to_string(&config).unwrap();
        let decoded: ConnectionConfig = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.nodes, config.nodes);
        assert_eq!(decoded.auth, config.auth);
        assert_eq!(decoded.read_timeout, config.read_timeout);
    }
}

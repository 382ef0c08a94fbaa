//! Cluster nodes and the pool of connection candidates.

use crate::error::{ClientError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Wire protocol used to reach a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Plain HTTP.
    #[default]
    Http,
    /// HTTP over TLS.
    Https,
}

impl Protocol {
    /// Parse a protocol name; anything other than `http`/`https` is rejected.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "http" => Some(Protocol::Http),
            "https" => Some(Protocol::Https),
            _ => None,
        }
    }

    /// Get the scheme string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Basic authentication credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicAuth {
    /// Username.
    pub username: String,
    /// Password.
    pub password: String,
}

impl BasicAuth {
    /// Create a credential pair. Emptiness is checked when the
    /// credentials are actually applied to a request, not here.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Per-node authentication override.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeAuth {
    /// Use the connection's global credentials, if any.
    #[default]
    Inherit,
    /// Explicitly disable inherited credentials for this node.
    Disabled,
    /// Node-specific credentials.
    Basic(BasicAuth),
}

/// A node as supplied at configuration time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    /// Address in `host:port` form, or the autodetection-wrapped
    /// `inet[/host:port]` form.
    pub http_address: String,
    /// Protocol; falls back to the connection default when absent.
    #[serde(default)]
    pub protocol: Option<Protocol>,
    /// Authentication override.
    #[serde(default)]
    pub auth: NodeAuth,
}

impl NodeSpec {
    /// Create a spec for the given address.
    pub fn new(http_address: impl Into<String>) -> Self {
        Self {
            http_address: http_address.into(),
            protocol: None,
            auth: NodeAuth::Inherit,
        }
    }

    /// Set an explicit protocol.
    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = Some(protocol);
        self
    }

    /// Set node-specific credentials.
    pub fn with_auth(mut self, auth: BasicAuth) -> Self {
        self.auth = NodeAuth::Basic(auth);
        self
    }

    /// Suppress inherited credentials for this node.
    pub fn without_auth(mut self) -> Self {
        self.auth = NodeAuth::Disabled;
        self
    }
}

/// A validated cluster node.
///
/// Invariant: `http_address` is non-empty and `protocol` is http/https.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Publish address, possibly in the `inet[/host:port]` wrapped form.
    pub http_address: String,
    /// Protocol used to reach this node.
    pub protocol: Protocol,
    /// Authentication override.
    pub auth: NodeAuth,
    /// Free-form metadata (name, version, host) populated by autodetection.
    pub attributes: HashMap<String, Value>,
}

impl Node {
    pub(crate) fn from_spec(spec: &NodeSpec, default_protocol: Protocol) -> Result<Self> {
        if spec.http_address.is_empty() {
            return Err(ClientError::Config(
                "node configuration requires an http_address".to_string(),
            ));
        }
        Ok(Self {
            http_address: spec.http_address.clone(),
            protocol: spec.protocol.unwrap_or(default_protocol),
            auth: spec.auth.clone(),
            attributes: HashMap::new(),
        })
    }

    /// The `host:port` component, with any `inet[/host:port]`
    /// autodetection wrapper stripped.
    pub fn host(&self) -> &str {
        strip_address_wrapper(&self.http_address)
    }
}

/// Strip the `inet[/host:port]` wrapper some cluster responses use.
pub(crate) fn strip_address_wrapper(address: &str) -> &str {
    if let Some(inner) = address
        .strip_prefix("inet[")
        .and_then(|rest| rest.strip_suffix(']'))
    {
        inner.strip_prefix('/').unwrap_or(inner)
    } else {
        address
    }
}

/// Ordered collection of candidate nodes plus the active selection.
///
/// The node list is either supplied at configuration time or replaced
/// wholesale by cluster discovery; it is never mutated entry by entry,
/// so observers see the old list or the fully-replaced one.
#[derive(Debug, Clone, Default)]
pub struct NodePool {
    nodes: Vec<Node>,
    active: Option<usize>,
}

impl NodePool {
    /// Validate and adopt a configured node list.
    ///
    /// Fails with [`ClientError::Config`] when the list is empty or any
    /// entry is missing its address.
    pub fn configure(specs: &[NodeSpec], default_protocol: Protocol) -> Result<Self> {
        if specs.is_empty() {
            return Err(ClientError::Config(
                "at least one node must be configured".to_string(),
            ));
        }
        let nodes = specs
            .iter()
            .map(|spec| Node::from_spec(spec, default_protocol))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            nodes,
            active: None,
        })
    }

    /// Number of known nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the pool holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All known nodes, in configuration or discovery order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// The first node, used as the discovery seed.
    pub fn first(&self) -> Option<&Node> {
        self.nodes.first()
    }

    /// Atomically replace the node list with a discovery result.
    /// Clears the active selection.
    pub(crate) fn replace(&mut self, nodes: Vec<Node>) {
        self.nodes = nodes;
        self.active = None;
    }

    /// Pick one node uniformly at random and record it as active.
    /// Returns `None` when the pool is empty.
    pub(crate) fn select_active(&mut self) -> Option<usize> {
        use rand::Rng;
        if self.nodes.is_empty() {
            return None;
        }
        let index = rand::rng().random_range(0..self.nodes.len());
        self.active = Some(index);
        Some(index)
    }

    /// The currently active node, if a connection is open.
    pub fn active(&self) -> Option<&Node> {
        self.active.and_then(|i| self.nodes.get(i))
    }

    /// Index of the active node.
    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub(crate) fn clear_active(&mut self) {
        self.active = None;
    }

    /// Attach a metadata value to whichever node is currently active.
    pub fn set_active_attribute(&mut self, key: impl Into<String>, value: Value) -> Result<()> {
        let index = self.active.ok_or_else(|| {
            ClientError::Config("no active node to attach the attribute to".to_string())
        })?;
        if let Some(node) = self.nodes.get_mut(index) {
            node.attributes.insert(key.into(), value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_configure_valid_nodes() {
        let specs = vec![
            NodeSpec::new("127.0.0.1:9200"),
            NodeSpec::new("10.0.0.2:9200").with_protocol(Protocol::Https),
        ];
        let pool = NodePool::configure(&specs, Protocol::Http).unwrap();
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.nodes()[0].protocol, Protocol::Http);
        assert_eq!(pool.nodes()[1].protocol, Protocol::Https);
        assert!(pool.active().is_none());
    }

    #[test]
    fn test_configure_rejects_missing_address() {
        let specs = vec![NodeSpec::new("")];
        let err = NodePool::configure(&specs, Protocol::Http).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn test_configure_rejects_empty_list() {
        let err = NodePool::configure(&[], Protocol::Http).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn test_protocol_parse() {
        assert_eq!(Protocol::parse("http"), Some(Protocol::Http));
        assert_eq!(Protocol::parse("https"), Some(Protocol::Https));
        assert_eq!(Protocol::parse("ftp"), None);
        assert_eq!(Protocol::parse("HTTP"), None);
    }

    #[test]
    fn test_strip_address_wrapper() {
        assert_eq!(
            strip_address_wrapper("inet[/127.0.0.1:9200]"),
            "127.0.0.1:9200"
        );
        assert_eq!(
            strip_address_wrapper("inet[localhost/127.0.0.1:9200]"),
            "localhost/127.0.0.1:9200"
        );
        assert_eq!(strip_address_wrapper("127.0.0.1:9200"), "127.0.0.1:9200");
    }

    #[test]
    fn test_select_active_in_range() {
        let specs: Vec<NodeSpec> = (0..5)
            .map(|i| NodeSpec::new(format!("10.0.0.{i}:9200")))
            .collect();
        let mut pool = NodePool::configure(&specs, Protocol::Http).unwrap();
        for _ in 0..20 {
            let index = pool.select_active().unwrap();
            assert!(index < 5);
            assert_eq!(pool.active_index(), Some(index));
        }
    }

    #[test]
    fn test_select_active_on_empty_pool() {
        let mut pool = NodePool::default();
        assert_eq!(pool.select_active(), None);
    }

    #[test]
    fn test_set_active_attribute() {
        let specs = vec![NodeSpec::new("127.0.0.1:9200")];
        let mut pool = NodePool::configure(&specs, Protocol::Http).unwrap();

        let err = pool.set_active_attribute("name", json!("a")).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));

        pool.select_active().unwrap();
        pool.set_active_attribute("name", json!("es-node-1")).unwrap();
        assert_eq!(
            pool.active().unwrap().attributes.get("name"),
            Some(&json!("es-node-1"))
        );
    }

    #[test]
    fn test_replace_clears_active() {
        let specs = vec![NodeSpec::new("127.0.0.1:9200")];
        let mut pool = NodePool::configure(&specs, Protocol::Http).unwrap();
        pool.select_active().unwrap();

        let replacement = Node {
            http_address: "10.1.1.1:9200".to_string(),
            protocol: Protocol::Http,
            auth: NodeAuth::Inherit,
            attributes: HashMap::new(),
        };
        pool.replace(vec![replacement]);
        assert_eq!(pool.len(), 1);
        assert!(pool.active().is_none());
        assert_eq!(pool.nodes()[0].http_address, "10.1.1.1:9200");
    }
}

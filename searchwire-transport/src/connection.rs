//! The connection: open/close lifecycle, cluster autodetection, and the
//! blocking request dispatch routine shared by all verbs.

use crate::config::ConnectionConfig;
use crate::error::{ClientError, Result};
use crate::node::{strip_address_wrapper, BasicAuth, Node, NodeAuth, NodePool};
use crate::path::RequestPath;
use crate::profile::{ProfileContext, Profiler};
use crate::response::{Payload, ResponseParts};
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Live state of an open connection. Presence of a session is the Open
/// state; `None` is Closed. The client handle is owned exclusively here
/// and dropped on close.
struct Session {
    client: reqwest::blocking::Client,
}

/// A blocking connection to one search cluster.
///
/// One logical request at a time: every verb takes `&mut self`, so
/// exclusive access is enforced by the borrow checker rather than by
/// internal locking. Opening is lazy (any verb call opens on demand)
/// and re-opening an open connection is a no-op. All requests of one
/// open/close cycle go to a single randomly selected active node.
pub struct Connection {
    config: ConnectionConfig,
    pool: NodePool,
    session: Option<Session>,
    profiler: Option<Arc<dyn Profiler>>,
}

impl Connection {
    /// Validate the configured node list and create a closed connection.
    pub fn new(config: ConnectionConfig) -> Result<Self> {
        let pool = NodePool::configure(&config.nodes, config.default_protocol)?;
        Ok(Self {
            config,
            pool,
            session: None,
            profiler: None,
        })
    }

    /// Attach a profiler receiving begin/end events around each request.
    pub fn with_profiler(mut self, profiler: Arc<dyn Profiler>) -> Self {
        self.profiler = Some(profiler);
        self
    }

    /// The configuration this connection was built from.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Query DSL generation used for document addressing.
    pub fn dsl_version(&self) -> u32 {
        self.config.dsl_version
    }

    /// Whether the connection is open (active node selected, handle live).
    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// All currently known nodes.
    pub fn nodes(&self) -> &[Node] {
        self.pool.nodes()
    }

    /// The active node, if the connection is open.
    pub fn active_node(&self) -> Option<&Node> {
        self.pool.active()
    }

    /// Attach a metadata value to the currently active node.
    pub fn set_active_node_attribute(
        &mut self,
        key: impl Into<String>,
        value: Value,
    ) -> Result<()> {
        self.pool.set_active_attribute(key, value)
    }

    /// Open the connection: create the transport handle, optionally run
    /// cluster autodetection, and select the active node. A no-op when
    /// already open.
    pub fn open(&mut self) -> Result<()> {
        if self.session.is_some() {
            return Ok(());
        }
        let client = self.build_client()?;
        if self.config.auto_detect {
            // A discovery failure drops `client` on the way out, so the
            // connection stays closed with no live handle.
            let nodes = self.detect_nodes(&client)?;
            self.pool.replace(nodes);
        }
        let Some(index) = self.pool.select_active() else {
            return Err(ClientError::ClusterDiscovery(
                "no active node found".to_string(),
            ));
        };
        debug!(
            node = %self.pool.nodes()[index].http_address,
            "connection opened"
        );
        self.session = Some(Session { client });
        Ok(())
    }

    /// Close the connection, releasing the transport handle. Idempotent.
    pub fn close(&mut self) {
        if let Some(session) = self.session.take() {
            let address = self
                .pool
                .active()
                .map(|node| node.http_address.clone())
                .unwrap_or_default();
            info!(node = %address, "closing connection");
            self.pool.clear_active();
            drop(session);
        }
    }

    /// Issue a GET request.
    ///
    /// Returns `Ok(None)` on HTTP 404; all other non-2xx statuses are
    /// errors.
    pub fn get(
        &mut self,
        path: impl Into<RequestPath>,
        options: &[(String, String)],
        body: Option<String>,
        raw: bool,
    ) -> Result<Option<Payload>> {
        self.request(Method::GET, path.into(), options, body, raw, "Connection::get")
    }

    /// Issue a HEAD probe: `true` on 2xx, `false` on 404.
    pub fn head(&mut self, path: impl Into<RequestPath>, options: &[(String, String)]) -> Result<bool> {
        let parts = self.perform(Method::HEAD, &path.into(), options, None, "Connection::head")?;
        Ok(parts.is_some())
    }

    /// Issue a POST request. See [`Connection::get`] for result mapping.
    pub fn post(
        &mut self,
        path: impl Into<RequestPath>,
        options: &[(String, String)],
        body: Option<String>,
        raw: bool,
    ) -> Result<Option<Payload>> {
        self.request(Method::POST, path.into(), options, body, raw, "Connection::post")
    }

    /// Issue a PUT request. See [`Connection::get`] for result mapping.
    pub fn put(
        &mut self,
        path: impl Into<RequestPath>,
        options: &[(String, String)],
        body: Option<String>,
        raw: bool,
    ) -> Result<Option<Payload>> {
        self.request(Method::PUT, path.into(), options, body, raw, "Connection::put")
    }

    /// Issue a DELETE request. See [`Connection::get`] for result mapping.
    pub fn delete(
        &mut self,
        path: impl Into<RequestPath>,
        options: &[(String, String)],
        body: Option<String>,
        raw: bool,
    ) -> Result<Option<Payload>> {
        self.request(
            Method::DELETE,
            path.into(),
            options,
            body,
            raw,
            "Connection::delete",
        )
    }

    fn request(
        &mut self,
        method: Method,
        path: RequestPath,
        options: &[(String, String)],
        body: Option<String>,
        raw: bool,
        caller: &'static str,
    ) -> Result<Option<Payload>> {
        match self.perform(method, &path, options, body, caller)? {
            Some(parts) => Ok(Some(parts.payload(raw)?)),
            None => Ok(None),
        }
    }

    /// The shared round-trip routine: open on demand, build the URL,
    /// configure the request, execute, classify the status.
    ///
    /// Returns `Ok(None)` for 404, the raw parts for 2xx, and an error
    /// for everything else.
    fn perform(
        &mut self,
        method: Method,
        path: &RequestPath,
        options: &[(String, String)],
        body: Option<String>,
        caller: &'static str,
    ) -> Result<Option<ResponseParts>> {
        self.open()?;
        let client = match &self.session {
            Some(session) => session.client.clone(),
            None => {
                return Err(ClientError::ClusterDiscovery(
                    "no active node found".to_string(),
                ));
            }
        };
        let node = match self.pool.active() {
            Some(node) => node.clone(),
            None => {
                return Err(ClientError::ClusterDiscovery(
                    "no active node found".to_string(),
                ));
            }
        };

        let url = build_url(&node, path, options);
        let mut request = client
            .request(method.clone(), &url)
            .headers(self.request_headers()?);
        if let Some(auth) = self.resolve_auth(&node)? {
            request = request.basic_auth(&auth.username, Some(&auth.password));
        }
        info!(
            method = %method,
            url = %url,
            body = body.as_deref().unwrap_or(""),
            "dispatching request"
        );
        if let Some(body) = body {
            request = request.body(body);
        }

        let token = format!("{method} {url}");
        let mut ctx = ProfileContext {
            method: caller,
            error: None,
        };
        if let Some(profiler) = &self.profiler {
            profiler.begin(&token, &ctx);
        }
        let outcome = request.send();
        if let Err(err) = &outcome {
            ctx.error = Some(err.to_string());
        }
        if let Some(profiler) = &self.profiler {
            profiler.end(&token, &ctx);
        }

        let parts = ResponseParts::read(outcome?)?;
        let status = parts.status();
        if status.is_success() {
            Ok(Some(parts))
        } else if status == http::StatusCode::NOT_FOUND {
            Ok(None)
        } else {
            Err(ClientError::Request {
                status: status.as_u16(),
                body: parts.text(),
            })
        }
    }

    /// Fixed and configured headers for every request. `Content-Type`
    /// cannot be overridden.
    fn request_headers(&self) -> Result<http::HeaderMap> {
        let mut headers = http::HeaderMap::new();
        for (name, value) in &self.config.default_headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ClientError::Config(format!("invalid header name: {name}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| ClientError::Config(format!("invalid value for header {name}")))?;
            headers.insert(name, value);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// Resolve the credentials for a node: a per-node override beats the
    /// global pair, and `Disabled` suppresses both. Empty usernames or
    /// passwords fail before any I/O happens.
    fn resolve_auth<'a>(&'a self, node: &'a Node) -> Result<Option<&'a BasicAuth>> {
        let auth = match &node.auth {
            NodeAuth::Disabled => None,
            NodeAuth::Basic(auth) => Some(auth),
            NodeAuth::Inherit => self.config.auth.as_ref(),
        };
        if let Some(auth) = auth
            && (auth.username.is_empty() || auth.password.is_empty())
        {
            return Err(ClientError::AuthConfig(
                "username and password must both be non-empty".to_string(),
            ));
        }
        Ok(auth)
    }

    fn build_client(&self) -> Result<reqwest::blocking::Client> {
        let mut builder =
            reqwest::blocking::Client::builder().user_agent(&self.config.user_agent);
        if let Some(timeout) = self.config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        builder = builder.timeout(self.config.read_timeout);
        Ok(builder.build()?)
    }

    /// Query the seed node for the cluster member list.
    ///
    /// Entries without an `http.publish_address` are discarded (some
    /// hosted providers omit the field); survivors get the connection's
    /// default protocol stamped on.
    fn detect_nodes(&self, client: &reqwest::blocking::Client) -> Result<Vec<Node>> {
        let seed = self.pool.first().ok_or_else(|| {
            ClientError::Config("at least one node must be configured".to_string())
        })?;
        let url = format!("{}://{}/_nodes/http", seed.protocol, seed.host());
        info!(url = %url, "detecting cluster nodes");

        let mut request = client.get(&url).headers(self.request_headers()?);
        if let Some(auth) = self.resolve_auth(seed)? {
            request = request.basic_auth(&auth.username, Some(&auth.password));
        }
        let parts = ResponseParts::read(request.send()?)?;
        if !parts.status().is_success() {
            return Err(ClientError::Request {
                status: parts.status().as_u16(),
                body: parts.text(),
            });
        }
        let info: NodesInfo = serde_json::from_slice(parts.body())?;

        let nodes: Vec<Node> = info
            .nodes
            .into_iter()
            .filter_map(|(id, entry)| {
                let address = entry.http.and_then(|http| http.publish_address)?;
                let mut attributes = HashMap::new();
                attributes.insert("id".to_string(), json!(id));
                if let Some(name) = entry.name {
                    attributes.insert("name".to_string(), json!(name));
                }
                if let Some(version) = entry.version {
                    attributes.insert("version".to_string(), json!(version));
                }
                if let Some(host) = entry.host {
                    attributes.insert("host".to_string(), json!(host));
                }
                Some(Node {
                    http_address: address,
                    protocol: self.config.default_protocol,
                    auth: NodeAuth::Inherit,
                    attributes,
                })
            })
            .collect();

        if nodes.is_empty() {
            return Err(ClientError::ClusterDiscovery(
                "no active node found".to_string(),
            ));
        }
        debug!(count = nodes.len(), "cluster nodes detected");
        Ok(nodes)
    }
}

impl TryFrom<ConnectionConfig> for Connection {
    type Error = ClientError;

    fn try_from(config: ConnectionConfig) -> Result<Self> {
        Connection::new(config)
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("nodes", &self.pool.len())
            .field("active", &self.pool.active_index())
            .field("open", &self.session.is_some())
            .finish()
    }
}

fn build_url(node: &Node, path: &RequestPath, options: &[(String, String)]) -> String {
    format!(
        "{}://{}/{}",
        node.protocol,
        strip_address_wrapper(&node.http_address),
        path.assemble(options)
    )
}

#[derive(Debug, Deserialize)]
struct NodesInfo {
    #[serde(default)]
    nodes: HashMap<String, NodeEntry>,
}

#[derive(Debug, Deserialize)]
struct NodeEntry {
    name: Option<String>,
    version: Option<String>,
    host: Option<String>,
    http: Option<NodeHttp>,
}

#[derive(Debug, Deserialize)]
struct NodeHttp {
    publish_address: Option<String>,
}

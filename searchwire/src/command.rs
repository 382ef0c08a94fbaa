//! Per-endpoint REST commands.
//!
//! A [`Command`] borrows a connection exclusively, carries an index/type
//! context plus collected query options, and maps each endpoint onto the
//! transport verbs. Absence (HTTP 404) surfaces as `None`/`false`, per
//! endpoint semantics; serialization of request documents happens here,
//! never in the transport.

use searchwire_transport::{ClientError, Connection, Payload, RequestPath, Result, Segment};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

/// Builder-style handle for issuing endpoint commands.
pub struct Command<'a> {
    conn: &'a mut Connection,
    index: Option<String>,
    doc_type: Option<String>,
    options: Vec<(String, String)>,
}

impl<'a> Command<'a> {
    /// Create a command bound to a connection.
    pub fn new(conn: &'a mut Connection) -> Self {
        Self {
            conn,
            index: None,
            doc_type: None,
            options: Vec::new(),
        }
    }

    /// Target index (or comma-joinable alias) for subsequent operations.
    pub fn index(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }

    /// Document type, only meaningful for DSL versions before 7.
    pub fn doc_type(mut self, doc_type: impl Into<String>) -> Self {
        self.doc_type = Some(doc_type.into());
        self
    }

    /// Add a query-string option (e.g. `refresh`, `scroll`, `timeout`).
    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.push((key.into(), value.into()));
        self
    }

    // =========================================================================
    // Document Operations
    // =========================================================================

    /// Index a document. With an id this is a PUT (upsert at the id);
    /// without, a POST with a server-generated id.
    pub fn insert(&mut self, id: Option<&str>, document: &impl Serialize) -> Result<Option<Value>> {
        let path = RequestPath::Segments(self.doc_segments(id)?);
        let body = Some(encode(document)?);
        debug!(index = self.index.as_deref().unwrap_or(""), "indexing document");
        let payload = match id {
            Some(_) => self.conn.put(path, &self.options, body, false)?,
            None => self.conn.post(path, &self.options, body, false)?,
        };
        Ok(payload.map(Payload::into_value))
    }

    /// Fetch a document by id; `None` when it does not exist.
    pub fn get(&mut self, id: &str) -> Result<Option<Value>> {
        let path = RequestPath::Segments(self.doc_segments(Some(id))?);
        let payload = self.conn.get(path, &self.options, None, false)?;
        Ok(payload.map(Payload::into_value))
    }

    /// Fetch only the `_source` of a document.
    pub fn source(&mut self, id: &str) -> Result<Option<Value>> {
        let index = self.require_index()?;
        let segments = if self.legacy_dsl() {
            let doc_type = self.require_doc_type()?;
            vec![
                Segment::from(index),
                Segment::from(doc_type),
                Segment::from(id),
                Segment::from("_source"),
            ]
        } else {
            vec![
                Segment::from(index),
                Segment::from("_source"),
                Segment::from(id),
            ]
        };
        let payload = self
            .conn
            .get(RequestPath::Segments(segments), &self.options, None, false)?;
        Ok(payload.map(Payload::into_value))
    }

    /// Check whether a document exists.
    pub fn exists(&mut self, id: &str) -> Result<bool> {
        let path = RequestPath::Segments(self.doc_segments(Some(id))?);
        self.conn.head(path, &self.options)
    }

    /// Apply a partial update to a document; `None` when it is missing.
    pub fn update(&mut self, id: &str, document: &impl Serialize) -> Result<Option<Value>> {
        let index = self.require_index()?;
        let segments = if self.legacy_dsl() {
            let doc_type = self.require_doc_type()?;
            vec![
                Segment::from(index),
                Segment::from(doc_type),
                Segment::from(id),
                Segment::from("_update"),
            ]
        } else {
            vec![
                Segment::from(index),
                Segment::from("_update"),
                Segment::from(id),
            ]
        };
        let body = json!({ "doc": serde_json::to_value(document)? });
        let payload = self.conn.post(
            RequestPath::Segments(segments),
            &self.options,
            Some(body.to_string()),
            false,
        )?;
        Ok(payload.map(Payload::into_value))
    }

    /// Delete a document; `None` means there was nothing to delete.
    pub fn delete(&mut self, id: &str) -> Result<Option<Value>> {
        let path = RequestPath::Segments(self.doc_segments(Some(id))?);
        debug!(index = self.index.as_deref().unwrap_or(""), id, "deleting document");
        let payload = self.conn.delete(path, &self.options, None, false)?;
        Ok(payload.map(Payload::into_value))
    }

    /// Fetch several documents by id in one round-trip.
    pub fn mget(&mut self, ids: &[&str]) -> Result<Option<Value>> {
        let mut segments = self.base_segments()?;
        segments.push(Segment::from("_mget"));
        let body = json!({ "ids": ids }).to_string();
        let payload = self.conn.get(
            RequestPath::Segments(segments),
            &self.options,
            Some(body),
            false,
        )?;
        Ok(payload.map(Payload::into_value))
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Run a search. The query, if any, is the full request body
    /// (`query`, `sort`, `aggs`, ...).
    pub fn search(&mut self, query: Option<&Value>) -> Result<Option<Value>> {
        let mut segments = self.base_segments().unwrap_or_default();
        segments.push(Segment::from("_search"));
        let body = query.map(Value::to_string);
        let payload = self
            .conn
            .post(RequestPath::Segments(segments), &self.options, body, false)?;
        Ok(payload.map(Payload::into_value))
    }

    /// Run a suggester and return the `suggest` section of the response.
    pub fn suggest(&mut self, suggester: &Value) -> Result<Option<Value>> {
        let mut segments = self.base_segments().unwrap_or_default();
        segments.push(Segment::from("_search"));
        let body = json!({ "suggest": suggester }).to_string();
        let payload = self.conn.post(
            RequestPath::Segments(segments),
            &self.options,
            Some(body),
            false,
        )?;
        Ok(payload.map(|p| {
            let mut value = p.into_value();
            value
                .get_mut("suggest")
                .map(Value::take)
                .unwrap_or(Value::Null)
        }))
    }

    /// Continue a server-side scroll cursor.
    pub fn scroll(&mut self, scroll_id: &str, keep_alive: Option<&str>) -> Result<Option<Value>> {
        let mut body = json!({ "scroll_id": scroll_id });
        if let Some(keep_alive) = keep_alive {
            body["scroll"] = json!(keep_alive);
        }
        let payload = self.conn.post(
            RequestPath::segments(["_search", "scroll"]),
            &self.options,
            Some(body.to_string()),
            false,
        )?;
        Ok(payload.map(Payload::into_value))
    }

    /// Release a scroll cursor early.
    pub fn clear_scroll(&mut self, scroll_id: &str) -> Result<Option<Value>> {
        let body = json!({ "scroll_id": scroll_id }).to_string();
        let payload = self.conn.delete(
            RequestPath::segments(["_search", "scroll"]),
            &self.options,
            Some(body),
            false,
        )?;
        Ok(payload.map(Payload::into_value))
    }

    /// Delete documents matching a query. Best-effort passthrough; the
    /// body must carry a `query` key, everything else is forwarded as-is.
    pub fn delete_by_query(&mut self, body: &Value) -> Result<Option<Value>> {
        if body.get("query").is_none() {
            return Err(ClientError::Config(
                "delete_by_query requires a `query` key in the request body".to_string(),
            ));
        }
        let mut segments = self.base_segments()?;
        segments.push(Segment::from("_delete_by_query"));
        let payload = self.conn.post(
            RequestPath::Segments(segments),
            &self.options,
            Some(body.to_string()),
            false,
        )?;
        Ok(payload.map(Payload::into_value))
    }

    // =========================================================================
    // Index Management
    // =========================================================================

    /// Create an index, optionally with settings and mappings.
    pub fn create_index(&mut self, index: &str, body: Option<&Value>) -> Result<Option<Value>> {
        debug!(index, "creating index");
        let payload = self.conn.put(
            RequestPath::segments([index]),
            &self.options,
            body.map(Value::to_string),
            false,
        )?;
        Ok(payload.map(Payload::into_value))
    }

    /// Delete an index; `None` means it did not exist.
    pub fn delete_index(&mut self, index: &str) -> Result<Option<Value>> {
        debug!(index, "deleting index");
        let payload = self
            .conn
            .delete(RequestPath::segments([index]), &self.options, None, false)?;
        Ok(payload.map(Payload::into_value))
    }

    /// Check whether an index exists.
    pub fn index_exists(&mut self, index: &str) -> Result<bool> {
        self.conn.head(RequestPath::segments([index]), &self.options)
    }

    /// Check whether a mapping type exists. Legacy DSL only; typed
    /// mappings were removed in generation 7.
    pub fn type_exists(&mut self, index: &str, doc_type: &str) -> Result<bool> {
        if !self.legacy_dsl() {
            return Err(ClientError::Config(
                "mapping types are not supported for DSL versions 7 and later".to_string(),
            ));
        }
        self.conn.head(
            RequestPath::segments([index, "_mapping", doc_type]),
            &self.options,
        )
    }

    /// Open a closed index.
    pub fn open_index(&mut self, index: &str) -> Result<Option<Value>> {
        let payload = self.conn.post(
            RequestPath::segments([index, "_open"]),
            &self.options,
            None,
            false,
        )?;
        Ok(payload.map(Payload::into_value))
    }

    /// Close an index.
    pub fn close_index(&mut self, index: &str) -> Result<Option<Value>> {
        let payload = self.conn.post(
            RequestPath::segments([index, "_close"]),
            &self.options,
            None,
            false,
        )?;
        Ok(payload.map(Payload::into_value))
    }

    /// Refresh one index, or all of them, making recent writes visible.
    pub fn refresh_index(&mut self, index: Option<&str>) -> Result<Option<Value>> {
        let path = match index {
            Some(index) => RequestPath::segments([index, "_refresh"]),
            None => RequestPath::segments(["_refresh"]),
        };
        let payload = self.conn.post(path, &self.options, None, false)?;
        Ok(payload.map(Payload::into_value))
    }

    /// Flush one index, or all of them.
    pub fn flush_index(&mut self, index: Option<&str>) -> Result<Option<Value>> {
        let path = match index {
            Some(index) => RequestPath::segments([index, "_flush"]),
            None => RequestPath::segments(["_flush"]),
        };
        let payload = self.conn.post(path, &self.options, None, false)?;
        Ok(payload.map(Payload::into_value))
    }

    /// Fetch index statistics.
    pub fn index_stats(&mut self, index: Option<&str>) -> Result<Option<Value>> {
        let path = match index {
            Some(index) => RequestPath::segments([index, "_stats"]),
            None => RequestPath::segments(["_stats"]),
        };
        let payload = self.conn.get(path, &self.options, None, false)?;
        Ok(payload.map(Payload::into_value))
    }

    // =========================================================================
    // Aliases
    // =========================================================================

    /// Point an alias at an index.
    pub fn add_alias(&mut self, index: &str, alias: &str) -> Result<Option<Value>> {
        let payload = self.conn.put(
            RequestPath::segments([index, "_alias", alias]),
            &self.options,
            None,
            false,
        )?;
        Ok(payload.map(Payload::into_value))
    }

    /// Remove an alias from an index; `None` means it was not set.
    pub fn remove_alias(&mut self, index: &str, alias: &str) -> Result<Option<Value>> {
        let payload = self.conn.delete(
            RequestPath::segments([index, "_alias", alias]),
            &self.options,
            None,
            false,
        )?;
        Ok(payload.map(Payload::into_value))
    }

    /// Check whether any index carries the alias.
    pub fn alias_exists(&mut self, alias: &str) -> Result<bool> {
        self.conn
            .head(RequestPath::segments(["_alias", alias]), &self.options)
    }

    /// Fetch the full alias map.
    pub fn aliases(&mut self) -> Result<Option<Value>> {
        let payload =
            self.conn
                .get(RequestPath::segments(["_aliases"]), &self.options, None, false)?;
        Ok(payload.map(Payload::into_value))
    }

    // =========================================================================
    // Mappings and Templates
    // =========================================================================

    /// Install a mapping on the context index.
    pub fn set_mapping(&mut self, mapping: &Value) -> Result<Option<Value>> {
        let index = self.require_index()?;
        let segments = if self.legacy_dsl() {
            let doc_type = self.require_doc_type()?;
            vec![
                Segment::from(index),
                Segment::from("_mapping"),
                Segment::from(doc_type),
            ]
        } else {
            vec![Segment::from(index), Segment::from("_mapping")]
        };
        let payload = self.conn.put(
            RequestPath::Segments(segments),
            &self.options,
            Some(mapping.to_string()),
            false,
        )?;
        Ok(payload.map(Payload::into_value))
    }

    /// Fetch the mapping of the context index.
    pub fn get_mapping(&mut self) -> Result<Option<Value>> {
        let index = self.require_index()?;
        let payload = self.conn.get(
            RequestPath::segments([index, "_mapping"]),
            &self.options,
            None,
            false,
        )?;
        Ok(payload.map(Payload::into_value))
    }

    /// Create or replace an index template.
    pub fn create_template(&mut self, name: &str, body: &Value) -> Result<Option<Value>> {
        let payload = self.conn.put(
            RequestPath::segments(["_template", name]),
            &self.options,
            Some(body.to_string()),
            false,
        )?;
        Ok(payload.map(Payload::into_value))
    }

    /// Delete an index template; `None` means it did not exist.
    pub fn delete_template(&mut self, name: &str) -> Result<Option<Value>> {
        let payload = self.conn.delete(
            RequestPath::segments(["_template", name]),
            &self.options,
            None,
            false,
        )?;
        Ok(payload.map(Payload::into_value))
    }

    /// Check whether an index template exists.
    pub fn template_exists(&mut self, name: &str) -> Result<bool> {
        self.conn
            .head(RequestPath::segments(["_template", name]), &self.options)
    }

    /// Fetch an index template; `None` when absent.
    pub fn get_template(&mut self, name: &str) -> Result<Option<Value>> {
        let payload = self.conn.get(
            RequestPath::segments(["_template", name]),
            &self.options,
            None,
            false,
        )?;
        Ok(payload.map(Payload::into_value))
    }

    // =========================================================================
    // Path helpers
    // =========================================================================

    fn legacy_dsl(&self) -> bool {
        self.conn.dsl_version() < 7
    }

    fn require_index(&self) -> Result<&str> {
        self.index
            .as_deref()
            .ok_or_else(|| ClientError::Config("no index set on the command".to_string()))
    }

    fn require_doc_type(&self) -> Result<&str> {
        self.doc_type.as_deref().ok_or_else(|| {
            ClientError::Config(
                "a document type is required for DSL versions before 7".to_string(),
            )
        })
    }

    /// `[index]` or `[index, type]` (legacy with a type set); errors
    /// without an index.
    fn base_segments(&self) -> Result<Vec<Segment>> {
        let index = self.require_index()?;
        let mut segments = vec![Segment::from(index)];
        if self.legacy_dsl()
            && let Some(doc_type) = self.doc_type.as_deref()
        {
            segments.push(Segment::from(doc_type));
        }
        Ok(segments)
    }

    /// Document address: `[index, "_doc", id]` for DSL 7+,
    /// `[index, type, id]` before.
    fn doc_segments(&self, id: Option<&str>) -> Result<Vec<Segment>> {
        let index = self.require_index()?;
        let mut segments = vec![Segment::from(index)];
        if self.legacy_dsl() {
            segments.push(Segment::from(self.require_doc_type()?));
        } else {
            segments.push(Segment::from("_doc"));
        }
        if let Some(id) = id {
            segments.push(Segment::from(id));
        }
        Ok(segments)
    }
}

fn encode(document: &impl Serialize) -> Result<String> {
    Ok(serde_json::to_string(document)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use searchwire_transport::ConnectionConfig;

    fn connection(dsl_version: u32) -> Connection {
        let config = ConnectionConfig::builder()
            .node("127.0.0.1:9200")
            .dsl_version(dsl_version)
            .build();
        Connection::new(config).unwrap()
    }

    #[test]
    fn test_doc_segments_modern_dsl() {
        let mut conn = connection(8);
        let command = Command::new(&mut conn).index("customer").doc_type("external");
        let segments = command.doc_segments(Some("1")).unwrap();
        assert_eq!(
            segments,
            vec![
                Segment::from("customer"),
                Segment::from("_doc"),
                Segment::from("1")
            ]
        );
    }

    #[test]
    fn test_doc_segments_legacy_dsl() {
        let mut conn = connection(6);
        let command = Command::new(&mut conn).index("customer").doc_type("external");
        let segments = command.doc_segments(Some("1")).unwrap();
        assert_eq!(
            segments,
            vec![
                Segment::from("customer"),
                Segment::from("external"),
                Segment::from("1")
            ]
        );
    }

    #[test]
    fn test_legacy_dsl_requires_doc_type() {
        let mut conn = connection(6);
        let command = Command::new(&mut conn).index("customer");
        let err = command.doc_segments(Some("1")).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn test_doc_segments_require_index() {
        let mut conn = connection(8);
        let command = Command::new(&mut conn);
        let err = command.doc_segments(None).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn test_delete_by_query_requires_query_key() {
        let mut conn = connection(8);
        let mut command = Command::new(&mut conn).index("customer");
        let err = command
            .delete_by_query(&serde_json::json!({"size": 10}))
            .unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn test_type_exists_rejected_on_modern_dsl() {
        let mut conn = connection(8);
        let mut command = Command::new(&mut conn);
        let err = command.type_exists("customer", "external").unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn test_base_segments_legacy_includes_type_when_set() {
        let mut conn = connection(6);
        let command = Command::new(&mut conn).index("customer").doc_type("external");
        assert_eq!(
            command.base_segments().unwrap(),
            vec![Segment::from("customer"), Segment::from("external")]
        );

        let mut conn = connection(8);
        let command = Command::new(&mut conn).index("customer").doc_type("external");
        assert_eq!(
            command.base_segments().unwrap(),
            vec![Segment::from("customer")]
        );
    }
}

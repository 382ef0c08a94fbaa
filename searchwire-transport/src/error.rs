//! Transport error types.

use thiserror::Error;

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors raised by the connection and dispatch layer.
///
/// None of these are retried or recovered internally; every failure
/// propagates to the immediate caller. HTTP 404 is deliberately absent:
/// it surfaces as `None`/`false` from the verb methods so existence
/// checks can treat absence as normal control flow.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Malformed node entry (missing address, invalid protocol) or empty
    /// node list. Raised at configuration time.
    #[error("configuration error: {0}")]
    Config(String),

    /// Cluster autodetection produced zero usable nodes. The transport
    /// handle is released before this is raised.
    #[error("cluster discovery failed: {0}")]
    ClusterDiscovery(String),

    /// Authentication requested but username or password is empty.
    /// Raised before any request is sent.
    #[error("authentication misconfigured: {0}")]
    AuthConfig(String),

    /// Underlying connection, DNS, or socket failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx, non-404 HTTP status. Carries the raw response body;
    /// [`ClientError::error_reason`] attempts to extract a diagnostic
    /// from it.
    #[error("request failed with status {status}: {body}")]
    Request {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The advertised content-length exceeds the bytes actually received.
    #[error("incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse {
        /// Bytes advertised by the `content-length` header.
        expected: u64,
        /// Bytes actually delivered.
        received: u64,
    },

    /// Response content type is neither JSON nor plain text.
    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),

    /// A response body advertised as JSON failed to decode.
    #[error("JSON decode error: {0}")]
    Json(#[from] serde_json::Error),

    /// A request URL could not be built.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ClientError {
    /// Get the HTTP status code if this is a response error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Request { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Best-effort extraction of the server-side `error` field from a
    /// [`ClientError::Request`] body.
    pub fn error_reason(&self) -> Option<String> {
        let Self::Request { body, .. } = self else {
            return None;
        };
        let value: serde_json::Value = serde_json::from_str(body).ok()?;
        let error = value.get("error")?;
        if let Some(text) = error.as_str() {
            return Some(text.to_string());
        }
        error
            .get("reason")
            .and_then(|r| r.as_str())
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code() {
        let err = ClientError::Request {
            status: 503,
            body: "busy".to_string(),
        };
        assert_eq!(err.status_code(), Some(503));
        assert_eq!(ClientError::Config("bad".to_string()).status_code(), None);
    }

    #[test]
    fn test_error_reason_structured() {
        let err = ClientError::Request {
            status: 400,
            body: r#"{"error":{"type":"parsing_exception","reason":"unknown key"}}"#.to_string(),
        };
        assert_eq!(err.error_reason().as_deref(), Some("unknown key"));
    }

    #[test]
    fn test_error_reason_flat_string() {
        let err = ClientError::Request {
            status: 400,
            body: r#"{"error":"IndexMissingException"}"#.to_string(),
        };
        assert_eq!(err.error_reason().as_deref(), Some("IndexMissingException"));
    }

    #[test]
    fn test_error_reason_unparseable_body() {
        let err = ClientError::Request {
            status: 502,
            body: "<html>bad gateway</html>".to_string(),
        };
        assert_eq!(err.error_reason(), None);
    }
}

//! Response accumulation and payload decoding.

use crate::error::{ClientError, Result};
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde_json::Value;

/// Accumulated state of one HTTP round-trip: status, headers, and the
/// fully-read body. Built fresh for every request; no per-call state
/// outlives it.
#[derive(Debug)]
pub struct ResponseParts {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl ResponseParts {
    /// Assemble parts directly, mainly for decoding tests.
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Drain a blocking response into an accumulator.
    pub(crate) fn read(response: reqwest::blocking::Response) -> Result<Self> {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes()?;
        Ok(Self {
            status,
            headers,
            body,
        })
    }

    /// HTTP status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Raw body bytes.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body as (lossy) UTF-8 text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Advertised `content-length`, if present and parseable.
    pub fn content_length(&self) -> Option<u64> {
        self.headers
            .get(http::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
    }

    /// The `content-type` header, if present.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// Decode the body according to its content type.
    ///
    /// JSON bodies decode to [`Payload::Json`], `text/plain` bodies split
    /// into non-empty [`Payload::Lines`]; with `raw` set, either comes
    /// back verbatim as [`Payload::Text`]. A body shorter than the
    /// advertised `content-length` fails with
    /// [`ClientError::IncompleteResponse`], and any other content type
    /// fails with [`ClientError::UnsupportedContentType`].
    pub fn payload(&self, raw: bool) -> Result<Payload> {
        if let Some(expected) = self.content_length() {
            let received = self.body.len() as u64;
            if expected > received {
                return Err(ClientError::IncompleteResponse { expected, received });
            }
        }
        match self.content_type() {
            Some(content_type) if content_type.starts_with("application/json") => {
                if raw {
                    Ok(Payload::Text(self.text()))
                } else {
                    Ok(Payload::Json(serde_json::from_slice(&self.body)?))
                }
            }
            Some(content_type) if content_type.starts_with("text/plain") => {
                if raw {
                    Ok(Payload::Text(self.text()))
                } else {
                    Ok(Payload::Lines(
                        self.text()
                            .lines()
                            .filter(|line| !line.is_empty())
                            .map(str::to_string)
                            .collect(),
                    ))
                }
            }
            other => Err(ClientError::UnsupportedContentType(
                other.unwrap_or("<missing>").to_string(),
            )),
        }
    }
}

/// A decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Structured JSON value.
    Json(Value),
    /// Verbatim body text (the `raw` path).
    Text(String),
    /// Non-empty lines of a `text/plain` body.
    Lines(Vec<String>),
}

impl Payload {
    /// Borrow the JSON value, if this is a JSON payload.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Payload::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Take the JSON value, if this is a JSON payload.
    pub fn into_json(self) -> Option<Value> {
        match self {
            Payload::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Borrow the verbatim text, if this is a raw payload.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Convert into a JSON value without loss: text becomes a string,
    /// lines become an array of strings.
    pub fn into_value(self) -> Value {
        match self {
            Payload::Json(value) => value,
            Payload::Text(text) => Value::String(text),
            Payload::Lines(lines) => Value::Array(lines.into_iter().map(Value::String).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
    use serde_json::json;

    fn parts(content_type: Option<&str>, body: &str) -> ResponseParts {
        let mut headers = HeaderMap::new();
        if let Some(ct) = content_type {
            headers.insert(CONTENT_TYPE, ct.parse().unwrap());
        }
        ResponseParts::new(
            StatusCode::OK,
            headers,
            Bytes::copy_from_slice(body.as_bytes()),
        )
    }

    #[test]
    fn test_json_decoded() {
        let payload = parts(Some("application/json"), r#"{"a":1}"#)
            .payload(false)
            .unwrap();
        assert_eq!(payload, Payload::Json(json!({"a": 1})));
    }

    #[test]
    fn test_json_with_charset_decoded() {
        let payload = parts(Some("application/json; charset=UTF-8"), r#"{"a":1}"#)
            .payload(false)
            .unwrap();
        assert_eq!(payload.as_json(), Some(&json!({"a": 1})));
    }

    #[test]
    fn test_json_raw_returns_literal_text() {
        let payload = parts(Some("application/json"), r#"{"a":1}"#)
            .payload(true)
            .unwrap();
        assert_eq!(payload, Payload::Text(r#"{"a":1}"#.to_string()));
    }

    #[test]
    fn test_plain_text_split_into_lines() {
        let payload = parts(Some("text/plain"), "green open idx-a\n\ngreen open idx-b\n")
            .payload(false)
            .unwrap();
        assert_eq!(
            payload,
            Payload::Lines(vec![
                "green open idx-a".to_string(),
                "green open idx-b".to_string()
            ])
        );
    }

    #[test]
    fn test_plain_text_raw_keeps_newlines() {
        let payload = parts(Some("text/plain"), "a\n\nb\n").payload(true).unwrap();
        assert_eq!(payload, Payload::Text("a\n\nb\n".to_string()));
    }

    #[test]
    fn test_unsupported_content_type() {
        let err = parts(Some("text/html"), "<html/>").payload(false).unwrap_err();
        match err {
            ClientError::UnsupportedContentType(ct) => assert_eq!(ct, "text/html"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_content_type() {
        let err = parts(None, "{}").payload(false).unwrap_err();
        assert!(matches!(err, ClientError::UnsupportedContentType(_)));
    }

    #[test]
    fn test_short_body_is_incomplete() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, "application/json".parse().unwrap());
        headers.insert(CONTENT_LENGTH, "100".parse().unwrap());
        let parts = ResponseParts::new(StatusCode::OK, headers, Bytes::from_static(b"{}"));

        let err = parts.payload(false).unwrap_err();
        match err {
            ClientError::IncompleteResponse { expected, received } => {
                assert_eq!(expected, 100);
                assert_eq!(received, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_into_value_lossless() {
        assert_eq!(Payload::Json(json!([1])).into_value(), json!([1]));
        assert_eq!(
            Payload::Text("x".to_string()).into_value(),
            Value::String("x".to_string())
        );
        assert_eq!(
            Payload::Lines(vec!["a".to_string()]).into_value(),
            json!(["a"])
        );
    }
}

//! Request path construction.
//!
//! Endpoints address resources either with a literal pre-built path
//! string or with a sequence of segments. Segments are percent-encoded
//! individually and joined with `/`; multi-valued segments (multi-index,
//! multi-id addressing) are comma-joined before encoding.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Characters escaped within a single path segment. Mirrors the URL
/// path-segment set, plus `/` and `%` so segment boundaries survive.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'%');

/// One path segment: a single value or a comma-joined list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// A single path component.
    One(String),
    /// Components comma-joined into one path position.
    Many(Vec<String>),
}

impl Segment {
    fn encoded(&self) -> String {
        match self {
            Segment::One(part) => utf8_percent_encode(part, SEGMENT).to_string(),
            Segment::Many(parts) => utf8_percent_encode(&parts.join(","), SEGMENT).to_string(),
        }
    }
}

impl From<&str> for Segment {
    fn from(value: &str) -> Self {
        Segment::One(value.to_string())
    }
}

impl From<String> for Segment {
    fn from(value: String) -> Self {
        Segment::One(value)
    }
}

impl From<u64> for Segment {
    fn from(value: u64) -> Self {
        Segment::One(value.to_string())
    }
}

impl From<i64> for Segment {
    fn from(value: i64) -> Self {
        Segment::One(value.to_string())
    }
}

impl From<Vec<String>> for Segment {
    fn from(value: Vec<String>) -> Self {
        Segment::Many(value)
    }
}

impl From<&[&str]> for Segment {
    fn from(value: &[&str]) -> Self {
        Segment::Many(value.iter().map(|s| s.to_string()).collect())
    }
}

/// A request path: a literal string or a segment sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestPath {
    /// A pre-built path, taken verbatim (may already carry a query string).
    Raw(String),
    /// Segments to be encoded and `/`-joined.
    Segments(Vec<Segment>),
}

impl RequestPath {
    /// Build a segment path from anything convertible to segments.
    pub fn segments<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Segment>,
    {
        RequestPath::Segments(parts.into_iter().map(Into::into).collect())
    }

    /// Render the path with query options appended.
    ///
    /// Segment paths always append options as `?key=value&...`; raw paths
    /// that already contain `?` get them appended with `&`.
    pub(crate) fn assemble(&self, options: &[(String, String)]) -> String {
        let (path, joiner) = match self {
            RequestPath::Raw(path) => {
                let joiner = if path.contains('?') { '&' } else { '?' };
                (path.clone(), joiner)
            }
            RequestPath::Segments(segments) => {
                let joined = segments
                    .iter()
                    .map(Segment::encoded)
                    .collect::<Vec<_>>()
                    .join("/");
                (joined, '?')
            }
        };
        if options.is_empty() {
            return path;
        }
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(options.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .finish();
        format!("{path}{joiner}{query}")
    }
}

impl From<&str> for RequestPath {
    fn from(value: &str) -> Self {
        RequestPath::Raw(value.to_string())
    }
}

impl From<String> for RequestPath {
    fn from(value: String) -> Self {
        RequestPath::Raw(value)
    }
}

impl From<Vec<Segment>> for RequestPath {
    fn from(value: Vec<Segment>) -> Self {
        RequestPath::Segments(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_segment_join() {
        let path = RequestPath::segments(["customer", "external", "1", "_update"]);
        assert_eq!(path.assemble(&[]), "customer/external/1/_update");
    }

    #[test]
    fn test_numeric_segments_stringified() {
        let path = RequestPath::Segments(vec![
            Segment::from("customer"),
            Segment::from("external"),
            Segment::from(1u64),
        ]);
        assert_eq!(path.assemble(&[]), "customer/external/1");
    }

    #[test]
    fn test_multi_valued_segment_comma_joined() {
        let path = RequestPath::Segments(vec![
            Segment::from(vec!["idx-a".to_string(), "idx-b".to_string()]),
            Segment::from("_search"),
        ]);
        assert_eq!(path.assemble(&[]), "idx-a,idx-b/_search");
    }

    #[test]
    fn test_segments_percent_encoded() {
        let path = RequestPath::segments(["an index", "a/b"]);
        assert_eq!(path.assemble(&[]), "an%20index/a%2Fb");
    }

    #[test]
    fn test_options_appended_to_segments() {
        let path = RequestPath::segments(["_search", "scroll"]);
        assert_eq!(
            path.assemble(&opts(&[("scroll", "1m"), ("timeout", "30s")])),
            "_search/scroll?scroll=1m&timeout=30s"
        );
    }

    #[test]
    fn test_options_appended_to_raw_path_without_query() {
        let path = RequestPath::from("customer/_search");
        assert_eq!(
            path.assemble(&opts(&[("size", "10")])),
            "customer/_search?size=10"
        );
    }

    #[test]
    fn test_options_appended_to_raw_path_with_query() {
        let path = RequestPath::from("customer/_search?q=tag:wow");
        assert_eq!(
            path.assemble(&opts(&[("size", "10")])),
            "customer/_search?q=tag:wow&size=10"
        );
    }

    #[test]
    fn test_option_values_encoded() {
        let path = RequestPath::segments(["_search"]);
        assert_eq!(
            path.assemble(&opts(&[("q", "a b&c")])),
            "_search?q=a+b%26c"
        );
    }
}

//! Transport-agnostic description of one remote call.

use std::fmt;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use reqwest::Method;
use serde_json::Value;

/// Characters escaped inside a single path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// One logical unit of remote work: method, API-relative path, query, body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Append a query pair.
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Append a query pair only when `value` is present.
    pub fn query_opt<T: ToString>(self, key: &str, value: Option<T>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }
}

impl fmt::Display for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Percent-encode a value for use as one path segment.
///
/// `.` and `..` are escaped as well; URL normalization would otherwise
/// resolve them and move the request onto a different resource.
pub fn encode_segment(segment: &str) -> String {
    match segment {
        "." => "%2E".to_string(),
        ".." => "%2E%2E".to_string(),
        _ => utf8_percent_encode(segment, PATH_SEGMENT).to_string(),
    }
}

/// Build `/{resource}/{id}` with the id encoded.
pub fn resource_path(resource: &str, id: &str) -> String {
    format!("/{resource}/{}", encode_segment(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_reserved_characters_in_ids() {
        assert_eq!(resource_path("users", "a b/c?d"), "/users/a%20b%2Fc%3Fd");
        assert_eq!(resource_path("workflows", "Xy12"), "/workflows/Xy12");
    }

    #[test]
    fn dot_segments_cannot_escape_the_resource() {
        assert_eq!(resource_path("credentials/schema", ".."), "/credentials/schema/%2E%2E");
        assert_eq!(resource_path("executions", "."), "/executions/%2E");
        assert_eq!(resource_path("tags", "v1.2"), "/tags/v1.2");
    }

    #[test]
    fn optional_query_pairs_are_skipped() {
        let request = ApiRequest::get("/executions")
            .query_opt("workflowId", Some("7"))
            .query_opt::<u32>("limit", None)
            .query("includeData", false);
        assert_eq!(
            request.query,
            vec![
                ("workflowId".to_string(), "7".to_string()),
                ("includeData".to_string(), "false".to_string())
            ]
        );
        assert_eq!(request.to_string(), "GET /executions");
    }
}

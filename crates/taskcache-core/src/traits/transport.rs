//! External collaborators: HTTP transport, credentials and user notices

use async_trait::async_trait;
use serde_json::Value;

use crate::TransportError;

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }

    /// Whether the request changes server state
    pub fn is_write(&self) -> bool {
        !matches!(self, Method::Get)
    }
}

/// A request handed to the transport
///
/// Query parameters are kept apart from the path; encoding them is the
/// transport's job.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            headers: Vec::new(),
        }
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Look up a header, case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Look up a query parameter
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Asynchronous HTTP transport to the backend
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Execute a request and return the decoded JSON body
    ///
    /// Empty bodies are returned as `Value::Null`.
    async fn request(&self, request: Request) -> Result<Value, TransportError>;
}

/// Supplies the bearer credential attached to outgoing requests
pub trait TokenProvider: Send + Sync + 'static {
    /// Current token, if the user is signed in
    fn bearer_token(&self) -> Option<String>;
}

/// A fixed token
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

impl TokenProvider for StaticToken {
    fn bearer_token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Kind of user-facing notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeKind {
    Success,
    Info,
    Error,
}

/// Receives user-facing messages
pub trait Notifier: Send + Sync + 'static {
    fn report(&self, message: &str, kind: NoticeKind);
}

/// Discards every notice
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    #[inline]
    fn report(&self, _message: &str, _kind: NoticeKind) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = Request::new(Method::Get, "/api/tasks")
            .with_query(vec![("page".into(), "0".into())])
            .with_header("Authorization", "Bearer abc");

        assert_eq!(request.header("authorization"), Some("Bearer abc"));
        assert_eq!(request.query_param("page"), Some("0"));
        assert!(request.body.is_none());
    }

    #[test]
    fn test_method_classification() {
        assert!(!Method::Get.is_write());
        assert!(Method::Delete.is_write());
        assert_eq!(Method::Put.as_str(), "PUT");
    }

    #[test]
    fn test_static_token() {
        assert_eq!(StaticToken("t".into()).bearer_token().as_deref(), Some("t"));
    }
}

//! Error types for cache and transport operations

use thiserror::Error;

/// Main error type for all cache operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Serialization failed
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Stored payload could not be decoded
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Backing medium operation failed
    #[error("backend error: {0}")]
    Backend(String),

    /// Backing medium is full
    #[error("capacity exceeded")]
    CapacityExceeded,

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// Whether the error came from a full backing medium
    pub fn is_capacity(&self) -> bool {
        matches!(self, CacheError::CapacityExceeded)
    }
}

/// Errors reported by the HTTP transport collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connection failed before a response arrived
    #[error("network error: {0}")]
    Network(String),

    /// Request timed out
    #[error("request timed out")]
    Timeout,

    /// Server answered with a 4xx/5xx status
    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },
}

impl TransportError {
    /// Build a server error from a status code and message
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        TransportError::Server {
            status,
            message: message.into(),
        }
    }

    /// Numeric status, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// 4xx response
    pub fn is_client_error(&self) -> bool {
        matches!(self.status(), Some(400..=499))
    }

    /// 5xx response
    pub fn is_server_error(&self) -> bool {
        matches!(self.status(), Some(500..=599))
    }
}

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CacheError::Deserialization("bad json".to_string());
        assert_eq!(err.to_string(), "deserialization error: bad json");

        let err = TransportError::server(404, "task not found");
        assert_eq!(err.to_string(), "server error 404: task not found");

        assert_eq!(TransportError::Timeout.to_string(), "request timed out");
    }

    #[test]
    fn test_status_classification() {
        assert!(TransportError::server(403, "forbidden").is_client_error());
        assert!(TransportError::server(503, "unavailable").is_server_error());
        assert_eq!(TransportError::Network("reset".into()).status(), None);
        assert!(!TransportError::Timeout.is_server_error());
    }

    #[test]
    fn test_capacity_predicate() {
        assert!(CacheError::CapacityExceeded.is_capacity());
        assert!(!CacheError::Backend("io".into()).is_capacity());
    }
}

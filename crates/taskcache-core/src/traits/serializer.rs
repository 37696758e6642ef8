//! Pluggable serialization trait

use crate::CacheError;
use serde::{de::DeserializeOwned, Serialize};

/// Trait for pluggable text serialization formats
///
/// The key-value medium stores strings, so formats must produce text.
pub trait Serializer: Send + Sync + Clone + 'static {
    /// Name of the serializer (for debugging/metrics)
    fn name(&self) -> &str;

    /// Serialize a value to text
    fn serialize<T: Serialize>(&self, value: &T) -> Result<String, CacheError>;

    /// Deserialize text to a value
    fn deserialize<T: DeserializeOwned>(&self, text: &str) -> Result<T, CacheError>;
}

/// JSON serializer (default)
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn name(&self) -> &str {
        "json"
    }

    fn serialize<T: Serialize>(&self, value: &T) -> Result<String, CacheError> {
        serde_json::to_string(value).map_err(|e| CacheError::Serialization(e.to_string()))
    }

    fn deserialize<T: DeserializeOwned>(&self, text: &str) -> Result<T, CacheError> {
        serde_json::from_str(text).map_err(|e| CacheError::Deserialization(e.to_string()))
    }
}

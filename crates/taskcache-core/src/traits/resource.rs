//! Entity types served by a REST collection endpoint

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::FilterCriteria;

/// A backend entity with a collection endpoint and a cache prefix
pub trait Resource: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Human-readable name used in notices
    const NAME: &'static str;

    /// Collection path, e.g. `/api/tasks`
    const PATH: &'static str;

    /// Prefix shared by every cache key of this entity type
    const CACHE_PREFIX: &'static str;

    /// Prefixes of other entity types whose cached pages embed this one
    /// and must be invalidated with it
    const DEPENDENT_PREFIXES: &'static [&'static str] = &[];

    /// Backend identity; `None` before the entity is created
    fn id(&self) -> Option<u64>;

    /// Body sent on create and update
    fn write_payload(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    /// Path of a single entity
    fn item_path(id: u64) -> String {
        format!("{}/{}", Self::PATH, id)
    }

    /// Endpoint that serves a listing under `filter`
    fn list_path(_filter: &FilterCriteria) -> String {
        Self::PATH.to_string()
    }
}

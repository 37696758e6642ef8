//! Errors surfaced by collection services

use taskcache_core::{CacheError, TransportError};
use thiserror::Error;

/// Error returned by collection reads and writes
///
/// `Clone` so one result can be handed to every coalesced caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// The transport failed or the server rejected the request
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Cache failure that could not be absorbed
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The response body did not match the expected shape
    #[error("unexpected response payload: {0}")]
    Decode(String),

    /// The request this caller joined was dropped before finishing
    #[error("in-flight request for {0} was abandoned")]
    Abandoned(String),

    /// The entity has no identity yet
    #[error("{0} has no id")]
    MissingId(&'static str),
}

impl SyncError {
    /// Numeric status if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            SyncError::Transport(err) => err.status(),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Decode(err.to_string())
    }
}

/// Result alias for collection operations
pub type SyncResult<T> = std::result::Result<T, SyncError>;

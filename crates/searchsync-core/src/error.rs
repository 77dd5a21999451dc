use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Syncing index '{index}' failed after {attempts} attempts: {source}")]
    IndexSyncFailure {
        index: String,
        attempts: u32,
        #[source]
        source: EngineError,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failure reported by a search engine backend.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("engine responded with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed engine response: {0}")]
    Decode(String),

    #[error("local index error: {0}")]
    Local(String),
}

/// Why a page could not be loaded. Never retried automatically.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("search session stalled: no page after {0:?}")]
    Stalled(Duration),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

//! Typed errors for the ingestion library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use thiserror::Error;

/// Errors that can occur during ingestion operations.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Feed fetch failed
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// AI service unavailable or failed
    #[error("AI service error: {0}")]
    Ai(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Statistics service unavailable or returned an unusable result
    #[error("wage statistics error: {0}")]
    Stats(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Storage operation failed
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Downstream notification delivery failed
    #[error("notification error: {0}")]
    Notify(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Unique-key collision that retries could not resolve
    #[error("unique key conflict on {entity} after {attempts} attempts: {key}")]
    Conflict {
        entity: &'static str,
        key: String,
        attempts: u32,
    },

    /// Record not found where one was required
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),

    /// Operation was cancelled
    #[error("operation cancelled")]
    Cancelled,
}

/// Errors that can occur while fetching a source feed.
///
/// A fetch error is fatal to that source's current run only; the
/// scheduler records it on the source and moves on.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Non-success HTTP status
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// Invalid URL format
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// Connection timeout
    #[error("timeout fetching: {url}")]
    Timeout { url: String },

    /// Feed body could not be parsed into postings
    #[error("malformed feed: {reason}")]
    Malformed { reason: String },
}

/// Unexpected failure inside a single filter stage.
///
/// Stages surface failure explicitly through their return type; the
/// pipeline engine decides the fail-open policy, not the stage.
#[derive(Debug, Error)]
pub enum StageError {
    /// AI service error while filtering
    #[error("AI service error: {0}")]
    Ai(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Anything else a stage cannot recover from
    #[error("stage failure: {0}")]
    Internal(String),
}

/// Result type alias for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

/// Result type alias for feed fetches.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for filter stages.
pub type StageResult<T> = std::result::Result<T, StageError>;

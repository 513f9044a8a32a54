//! Error types for the oracle pipeline.

use thiserror::Error;

/// Errors from a judge implementation. Every variant funnels into the
/// random-fallback path; none of them ever reaches the tick loop.
#[derive(Debug, Error)]
pub enum JudgeError {
    /// Network or protocol failure talking to the oracle.
    #[error("oracle request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The oracle answered with no usable text.
    #[error("oracle returned an empty reply")]
    EmptyReply,
}

/// Errors persisting the verdict cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

//! Error types for the lessonbook data layer.

use thiserror::Error;

use crate::store::remote::RemoteError;

/// Errors surfaced by data-layer operations.
///
/// Remote failures are only wrapped here when an operation has no
/// local fallback; best-effort mirroring logs and swallows them.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("cache error: {0}")]
    Cache(#[from] sqlx::Error),

    #[error("failed to encode or decode stored record: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("lesson plan not found: {0}")]
    PlanNotFound(String),
}

//! Errors raised while walking a version graph or reading stored diffs

use strata_core::GraphError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("git: {0}")]
    Git(#[from] git2::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// The live state no longer matches its diff history. Aborts the walk.
    #[error("graph consistency: {0}")]
    Graph(#[from] GraphError),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("manifest: {0}")]
    Manifest(String),

    #[error("unknown version '{0}'")]
    UnknownVersion(String),

    #[error("live state is at {actual}, expected {expected}")]
    StateMismatch { expected: String, actual: String },
}

pub type HistoryResult<T> = Result<T, HistoryError>;

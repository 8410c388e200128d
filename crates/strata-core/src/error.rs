//! Graph consistency errors

use crate::model::Triple;
use thiserror::Error;

/// Raised when the live relation graph no longer agrees with its diff history.
///
/// Any of these aborts a traversal: continuing would corrupt every later diff.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("relation {0} is already linked")]
    DoubleLink(Triple),

    #[error("relation {0} is not linked")]
    MissingLink(Triple),

    #[error("malformed diff: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type GraphResult<T> = Result<T, GraphError>;

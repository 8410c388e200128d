//! The single live relation graph and the version it currently reflects

use strata_core::RelationGraph;

use crate::error::{HistoryError, HistoryResult};
use crate::vcs::VersionId;

/// Structural facts of exactly one version at a time.
#[derive(Debug, Default)]
pub struct LiveState {
    graph: RelationGraph,
    at: Option<VersionId>,
}

impl LiveState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn graph(&self) -> &RelationGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut RelationGraph {
        &mut self.graph
    }

    /// Version the graph reflects; `None` for the empty state.
    pub fn at(&self) -> Option<&str> {
        self.at.as_deref()
    }

    /// Drop every fact and return to the empty state.
    pub fn reset(&mut self) {
        self.graph.clear();
        self.at = None;
    }

    /// Precondition for applying an edge: the graph must reflect `version`.
    pub fn expect_at(&self, version: Option<&str>) -> HistoryResult<()> {
        if self.at() == version {
            return Ok(());
        }
        Err(HistoryError::StateMismatch {
            expected: version.unwrap_or("<empty>").to_string(),
            actual: self.at().unwrap_or("<empty>").to_string(),
        })
    }

    pub fn advance_to(&mut self, version: &str) {
        self.at = Some(version.to_string());
    }
}

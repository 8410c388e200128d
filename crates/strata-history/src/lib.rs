//! Version-graph walking, differential storage and replay

pub mod analysis;
pub mod error;
pub mod replay;
pub mod state;
pub mod store;
pub mod vcs;
pub mod walker;


pub use analysis::{analyze, EdgeSummary, HistoryAnalysis, MethodChurn};
pub use error::{HistoryError, HistoryResult};
pub use replay::{first_parent_chain, outline, reconstruct, ClassOutline, MethodOutline, ModuleOutline};
pub use state::LiveState;
pub use store::{clear_output, DifferentialStore, EdgeRecord, Manifest, VersionEntry};
pub use vcs::{short_id, ChangeStatus, ChangedFile, GitSource, VersionId, VersionRecord, VersionSource, EMPTY_TREE};
pub use walker::{DagWalker, WalkOptions, WalkStats};

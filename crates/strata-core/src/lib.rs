//! Strata Core: identities, relation graph, reversible diffs and the state comparator

pub mod compare;
pub mod diff;
pub mod error;
pub mod graph;
pub mod model;
pub mod record;
pub mod store;


pub use compare::compare_module;
pub use diff::{Diff, Direction, Operation, OperationKind, RelationCounts};
pub use error::{GraphError, GraphResult};
pub use graph::{RelationGraph, Symbol};
pub use model::{ClassEntry, Identity, MethodEntry, ModuleEntry, RelationKind, Triple};
pub use record::Recording;
pub use store::RelationStore;

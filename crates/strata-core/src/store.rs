//! Relation store capability

use crate::error::GraphResult;
use crate::model::{Identity, RelationKind, Triple};

/// The operations the comparator and diff replay need from a relation store.
pub trait RelationStore {
    /// Add a relation. Linking an existing relation is a consistency error.
    fn link(&mut self, triple: Triple) -> GraphResult<()>;

    /// Remove a relation. Unlinking a missing relation is a consistency error.
    fn unlink(&mut self, triple: Triple) -> GraphResult<()>;

    fn contains(&self, triple: &Triple) -> bool;

    /// Objects linked from `subject` under `relation`, in identity order.
    fn objects(&self, subject: Identity, relation: RelationKind) -> Vec<Identity>;

    /// Release `identity` if nothing points to or from it. Returns whether it was released.
    fn collect(&mut self, identity: Identity) -> bool;

    fn label(&self, identity: Identity) -> Option<String>;

    /// Attach a human-readable label, creating the identity if needed.
    fn set_label(&mut self, identity: Identity, label: &str);
}

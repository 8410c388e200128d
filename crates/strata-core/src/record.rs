//! Recording view over a relation store

use crate::diff::{Diff, OperationKind};
use crate::error::GraphResult;
use crate::model::{Identity, RelationKind, Triple};
use crate::store::RelationStore;

/// Forwards every operation to the wrapped store and keeps a [`Diff`] of them.
pub struct Recording<'a, S: RelationStore + ?Sized> {
    store: &'a mut S,
    diff: Diff,
}

impl<'a, S: RelationStore + ?Sized> Recording<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Recording {
            store,
            diff: Diff::new(),
        }
    }

    pub fn finish(self) -> Diff {
        self.diff
    }

    fn remember_labels(&mut self, triple: &Triple) {
        let subject = self.store.label(triple.subject);
        let object = self.store.label(triple.object);
        self.diff.record_label(triple.subject, subject);
        self.diff.record_label(triple.object, object);
    }
}

impl<S: RelationStore + ?Sized> RelationStore for Recording<'_, S> {
    fn link(&mut self, triple: Triple) -> GraphResult<()> {
        self.store.link(triple)?;
        self.remember_labels(&triple);
        self.diff.push(OperationKind::Link, triple);
        Ok(())
    }

    fn unlink(&mut self, triple: Triple) -> GraphResult<()> {
        self.remember_labels(&triple);
        self.store.unlink(triple)?;
        self.diff.push(OperationKind::Unlink, triple);
        Ok(())
    }

    fn contains(&self, triple: &Triple) -> bool {
        self.store.contains(triple)
    }

    fn objects(&self, subject: Identity, relation: RelationKind) -> Vec<Identity> {
        self.store.objects(subject, relation)
    }

    fn collect(&mut self, identity: Identity) -> bool {
        self.store.collect(identity)
    }

    fn label(&self, identity: Identity) -> Option<String> {
        self.store.label(identity)
    }

    fn set_label(&mut self, identity: Identity, label: &str) {
        self.store.set_label(identity, label);
    }
}

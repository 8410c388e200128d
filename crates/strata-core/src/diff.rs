//! Reversible relation diffs

use crate::error::GraphResult;
use crate::model::{Identity, RelationKind, Triple};
use crate::store::RelationStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Link,
    Unlink,
}

impl OperationKind {
    pub fn inverse(self) -> Self {
        match self {
            OperationKind::Link => OperationKind::Unlink,
            OperationKind::Unlink => OperationKind::Link,
        }
    }
}

/// One recorded link or unlink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub kind: OperationKind,
    #[serde(flatten)]
    pub triple: Triple,
}

/// Which way to replay a diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Inverse,
}

/// An ordered sequence of relation operations between two adjacent states.
///
/// Applying it in [`Direction::Inverse`] undoes a forward application exactly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diff {
    pub operations: Vec<Operation>,
    /// Labels of every identity the operations touch, so replay can recreate them.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<Identity, String>,
}

/// Link and unlink counts per relation kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationCounts {
    pub module: usize,
    pub class: usize,
    pub method: usize,
    pub method_body: usize,
}

impl RelationCounts {
    pub fn bump(&mut self, relation: RelationKind) {
        match relation {
            RelationKind::Module => self.module += 1,
            RelationKind::Class => self.class += 1,
            RelationKind::Method => self.method += 1,
            RelationKind::MethodBody => self.method_body += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.module + self.class + self.method + self.method_body
    }
}

impl Diff {
    pub fn new() -> Self {
        Diff::default()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn push(&mut self, kind: OperationKind, triple: Triple) {
        self.operations.push(Operation { kind, triple });
    }

    pub fn record_label(&mut self, identity: Identity, label: Option<String>) {
        if let Some(label) = label {
            self.labels.insert(identity, label);
        }
    }

    /// The diff that undoes this one: reversed order, link and unlink swapped.
    pub fn inverse(&self) -> Diff {
        Diff {
            operations: self
                .operations
                .iter()
                .rev()
                .map(|op| Operation {
                    kind: op.kind.inverse(),
                    triple: op.triple,
                })
                .collect(),
            labels: self.labels.clone(),
        }
    }

    /// Replay onto `store`. Identities left without relations are released.
    pub fn apply<S: RelationStore + ?Sized>(&self, store: &mut S, direction: Direction) -> GraphResult<()> {
        let operations: Box<dyn Iterator<Item = Operation> + '_> = match direction {
            Direction::Forward => Box::new(self.operations.iter().copied()),
            Direction::Inverse => Box::new(self.operations.iter().rev().map(|op| Operation {
                kind: op.kind.inverse(),
                triple: op.triple,
            })),
        };
        for op in operations {
            let Triple { subject, object, .. } = op.triple;
            match op.kind {
                OperationKind::Link => {
                    for identity in [subject, object] {
                        if let Some(label) = self.labels.get(&identity) {
                            store.set_label(identity, label);
                        }
                    }
                    store.link(op.triple)?;
                }
                OperationKind::Unlink => {
                    store.unlink(op.triple)?;
                    store.collect(object);
                    store.collect(subject);
                }
            }
        }
        Ok(())
    }

    /// (links, unlinks) per relation kind.
    pub fn counts(&self) -> (RelationCounts, RelationCounts) {
        let mut links = RelationCounts::default();
        let mut unlinks = RelationCounts::default();
        for op in &self.operations {
            match op.kind {
                OperationKind::Link => links.bump(op.triple.relation),
                OperationKind::Unlink => unlinks.bump(op.triple.relation),
            }
        }
        (links, unlinks)
    }

    pub fn to_json(&self) -> GraphResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> GraphResult<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

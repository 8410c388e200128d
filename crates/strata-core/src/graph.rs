//! Relation graph backed by petgraph::StableDiGraph, indexed by Identity

use crate::error::{GraphError, GraphResult};
use crate::model::{Identity, RelationKind, Triple};
use crate::store::RelationStore;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{BTreeSet, HashMap};

/// A node of the relation graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub identity: Identity,
    pub label: Option<String>,
}

/// The live structural state: identities connected by typed relations.
pub struct RelationGraph {
    inner: StableDiGraph<Symbol, RelationKind>,
    index: HashMap<Identity, NodeIndex>,
}

impl std::fmt::Debug for RelationGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelationGraph")
            .field("identity_count", &self.inner.node_count())
            .field("triple_count", &self.inner.edge_count())
            .finish()
    }
}

impl RelationGraph {
    pub fn new() -> Self {
        RelationGraph {
            inner: StableDiGraph::new(),
            index: HashMap::new(),
        }
    }

    /// Number of identities currently alive.
    pub fn identity_count(&self) -> usize {
        self.inner.node_count()
    }

    /// Number of relations currently linked.
    pub fn triple_count(&self) -> usize {
        self.inner.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.node_count() == 0
    }

    pub fn has_identity(&self, identity: Identity) -> bool {
        self.index.contains_key(&identity)
    }

    /// All relations, ordered. Two graphs hold the same state iff these are equal.
    pub fn triples(&self) -> BTreeSet<Triple> {
        self.inner
            .edge_indices()
            .filter_map(|idx| {
                let (source, target) = self.inner.edge_endpoints(idx)?;
                Some(Triple::new(
                    self.inner[source].identity,
                    self.inner[idx],
                    self.inner[target].identity,
                ))
            })
            .collect()
    }

    /// Drop every identity and relation.
    pub fn clear(&mut self) {
        self.inner.clear();
        self.index.clear();
    }

    fn node_for(&mut self, identity: Identity) -> NodeIndex {
        if let Some(idx) = self.index.get(&identity) {
            return *idx;
        }
        let idx = self.inner.add_node(Symbol { identity, label: None });
        self.index.insert(identity, idx);
        idx
    }

    fn find_edge(&self, triple: &Triple) -> Option<EdgeIndex> {
        let source = *self.index.get(&triple.subject)?;
        let target = *self.index.get(&triple.object)?;
        self.inner
            .edges_directed(source, Direction::Outgoing)
            .find(|e| e.target() == target && *e.weight() == triple.relation)
            .map(|e| e.id())
    }

    fn is_unreferenced(&self, idx: NodeIndex) -> bool {
        self.inner.edges_directed(idx, Direction::Outgoing).next().is_none()
            && self.inner.edges_directed(idx, Direction::Incoming).next().is_none()
    }
}

impl RelationStore for RelationGraph {
    fn link(&mut self, triple: Triple) -> GraphResult<()> {
        if self.find_edge(&triple).is_some() {
            return Err(GraphError::DoubleLink(triple));
        }
        let source = self.node_for(triple.subject);
        let target = self.node_for(triple.object);
        self.inner.add_edge(source, target, triple.relation);
        Ok(())
    }

    fn unlink(&mut self, triple: Triple) -> GraphResult<()> {
        let edge = self.find_edge(&triple).ok_or(GraphError::MissingLink(triple))?;
        self.inner.remove_edge(edge);
        Ok(())
    }

    fn contains(&self, triple: &Triple) -> bool {
        self.find_edge(triple).is_some()
    }

    fn objects(&self, subject: Identity, relation: RelationKind) -> Vec<Identity> {
        let Some(&source) = self.index.get(&subject) else {
            return Vec::new();
        };
        let mut objects: Vec<Identity> = self
            .inner
            .edges_directed(source, Direction::Outgoing)
            .filter(|e| *e.weight() == relation)
            .map(|e| self.inner[e.target()].identity)
            .collect();
        objects.sort();
        objects
    }

    fn collect(&mut self, identity: Identity) -> bool {
        let Some(&idx) = self.index.get(&identity) else {
            return false;
        };
        if !self.is_unreferenced(idx) {
            return false;
        }
        self.inner.remove_node(idx);
        self.index.remove(&identity);
        true
    }

    fn label(&self, identity: Identity) -> Option<String> {
        let idx = self.index.get(&identity)?;
        self.inner[*idx].label.clone()
    }

    fn set_label(&mut self, identity: Identity, label: &str) {
        let idx = self.node_for(identity);
        self.inner[idx].label = Some(label.to_string());
    }
}

impl Default for RelationGraph {
    fn default() -> Self {
        Self::new()
    }
}

//! Rebuild the structural state of any recorded version

use serde::Serialize;
use strata_core::{Direction, Identity, RelationGraph, RelationKind, RelationStore};

use crate::error::{HistoryError, HistoryResult};
use crate::store::DifferentialStore;
use crate::vcs::VersionId;

/// Versions from the orphan down to `version`, following first parents.
pub fn first_parent_chain(store: &DifferentialStore, version: &str) -> HistoryResult<Vec<VersionId>> {
    let mut chain = vec![store.resolve(version)?.to_string()];
    loop {
        let Some(tip) = chain.last() else { break };
        let Some(parent) = store.entry(tip)?.parents.first() else { break };
        if chain.len() > store.manifest().versions.len() {
            return Err(HistoryError::Manifest(format!("parent cycle through {parent}")));
        }
        chain.push(parent.clone());
    }
    chain.reverse();
    Ok(chain)
}

/// Replay the orphan snapshot and every first-parent edge diff up to `version`.
pub fn reconstruct(store: &DifferentialStore, version: &str) -> HistoryResult<RelationGraph> {
    let chain = first_parent_chain(store, version)?;
    let mut graph = RelationGraph::new();
    let Some(root) = chain.first() else {
        return Ok(graph);
    };

    store.snapshot_diff(root)?.apply(&mut graph, Direction::Forward)?;
    for pair in chain.windows(2) {
        store.edge_diff(&pair[0], &pair[1])?.apply(&mut graph, Direction::Forward)?;
    }
    tracing::debug!(
        "Replayed {} edges: {} identities, {} triples",
        chain.len() - 1,
        graph.identity_count(),
        graph.triple_count()
    );
    Ok(graph)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodOutline {
    pub name: String,
    pub body: Identity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassOutline {
    pub name: String,
    pub methods: Vec<MethodOutline>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleOutline {
    pub path: String,
    pub classes: Vec<ClassOutline>,
}

/// Human-readable view of a state: modules, their classes and methods.
pub fn outline(graph: &RelationGraph) -> Vec<ModuleOutline> {
    let label = |id: Identity| graph.label(id).unwrap_or_else(|| id.to_string());

    let mut modules: Vec<ModuleOutline> = graph
        .objects(Identity::ROOT, RelationKind::Module)
        .into_iter()
        .map(|module| {
            let mut classes: Vec<ClassOutline> = graph
                .objects(module, RelationKind::Class)
                .into_iter()
                .map(|class| {
                    let mut methods: Vec<MethodOutline> = graph
                        .objects(class, RelationKind::Method)
                        .into_iter()
                        .filter_map(|method| {
                            let body = graph.objects(method, RelationKind::MethodBody).first().copied()?;
                            Some(MethodOutline { name: label(method), body })
                        })
                        .collect();
                    methods.sort_by(|a, b| a.name.cmp(&b.name));
                    ClassOutline { name: label(class), methods }
                })
                .collect();
            classes.sort_by(|a, b| a.name.cmp(&b.name));
            ModuleOutline { path: label(module), classes }
        })
        .collect();
    modules.sort_by(|a, b| a.path.cmp(&b.path));
    modules
}

//! Statistics over a recorded history

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use strata_core::{Identity, OperationKind, RelationCounts, RelationKind};

use crate::error::HistoryResult;
use crate::store::DifferentialStore;
use crate::vcs::VersionId;

/// Operation counts of one stored edge diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeSummary {
    pub parent: VersionId,
    pub child: VersionId,
    pub links: RelationCounts,
    pub unlinks: RelationCounts,
}

/// How many edges touched one method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodChurn {
    pub method: String,
    pub edges: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HistoryAnalysis {
    /// Non-empty edges only, in manifest order.
    pub edges: Vec<EdgeSummary>,
    pub links: RelationCounts,
    pub unlinks: RelationCounts,
    /// Most frequently changed methods first.
    pub churn: Vec<MethodChurn>,
}

pub fn analyze(store: &DifferentialStore) -> HistoryResult<HistoryAnalysis> {
    let mut analysis = HistoryAnalysis::default();
    let mut touched: BTreeMap<Identity, (String, usize)> = BTreeMap::new();

    for (child, entry) in &store.manifest().versions {
        for parent in entry.edges.keys() {
            let diff = store.edge_diff(parent, child)?;
            if diff.is_empty() {
                continue;
            }
            let (links, unlinks) = diff.counts();
            add(&mut analysis.links, &links);
            add(&mut analysis.unlinks, &unlinks);
            analysis.edges.push(EdgeSummary {
                parent: parent.clone(),
                child: child.clone(),
                links,
                unlinks,
            });

            let methods: BTreeSet<Identity> = diff
                .operations
                .iter()
                .filter_map(|op| match op.triple.relation {
                    RelationKind::Method => Some(op.triple.object),
                    RelationKind::MethodBody if op.kind == OperationKind::Link => Some(op.triple.subject),
                    _ => None,
                })
                .collect();
            for method in methods {
                let name = diff.labels.get(&method).cloned().unwrap_or_else(|| method.to_string());
                touched.entry(method).or_insert((name, 0)).1 += 1;
            }
        }
    }

    analysis.churn = touched
        .into_values()
        .map(|(method, edges)| MethodChurn { method, edges })
        .collect();
    analysis
        .churn
        .sort_by(|a, b| b.edges.cmp(&a.edges).then_with(|| a.method.cmp(&b.method)));
    Ok(analysis)
}

fn add(total: &mut RelationCounts, counts: &RelationCounts) {
    total.module += counts.module;
    total.class += counts.class;
    total.method += counts.method;
    total.method_body += counts.method_body;
}

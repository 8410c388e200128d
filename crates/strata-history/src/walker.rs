//! Version-graph walker
//!
//! Visits every parent -> child edge once while keeping a single live state.
//! The walk runs forward along a path until it reaches a leaf or a merge that
//! still waits for other parents, then reverts stored diffs back to the last
//! fork that has unvisited children. When no fork is left it restarts from the
//! next orphan with an empty state.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use indicatif::ProgressBar;
use serde::Serialize;
use strata_core::{compare_module, Diff, Direction, Recording};
use strata_parser::{is_source_file, parse_module};
use tracing::{info, warn};

use crate::error::HistoryResult;
use crate::state::LiveState;
use crate::store::DifferentialStore;
use crate::vcs::{short_id, ChangeStatus, VersionId, VersionRecord, VersionSource};

/// Traversal counters reported at the end of a walk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WalkStats {
    pub vertices: usize,
    pub orphans: usize,
    pub edges: usize,
    /// Edges diffed and applied forward.
    pub forward: usize,
    /// Edges reverted while backtracking.
    pub backward: usize,
    /// Times a version was left with more than one unvisited child.
    pub forks: usize,
    /// Edges whose diff was not empty.
    pub changed_edges: usize,
    /// Files that failed to parse and kept their earlier facts.
    pub skipped_files: usize,
}

impl WalkStats {
    /// Edge applications per diffed edge; 1.0 means no backtracking at all.
    pub fn ratio(&self) -> f64 {
        if self.forward == 0 {
            return 1.0;
        }
        (self.forward + self.backward) as f64 / self.forward as f64
    }
}

impl fmt::Display for WalkStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "vertices={}, orphans={}, edges={}, forward={}, backward={}, forks={}, changed={}, skipped_files={}, ratio={:.3}",
            self.vertices,
            self.orphans,
            self.edges,
            self.forward,
            self.backward,
            self.forks,
            self.changed_edges,
            self.skipped_files,
            self.ratio()
        )
    }
}

#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// File extensions that are parsed; every other path is ignored.
    pub extensions: Vec<String>,
    pub progress: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        WalkOptions {
            extensions: vec!["js".to_string(), "mjs".to_string()],
            progress: true,
        }
    }
}

struct VersionNode {
    id: VersionId,
    parents: Vec<usize>,
    parents_left: usize,
    children_left: VecDeque<usize>,
    visited: bool,
}

pub struct DagWalker<'a, S: VersionSource + ?Sized> {
    source: &'a S,
    store: &'a mut DifferentialStore,
    options: WalkOptions,
    nodes: Vec<VersionNode>,
    state: LiveState,
    stats: WalkStats,
    /// Versions on the current path that still have unvisited children.
    pending_forks: usize,
    bar: ProgressBar,
}

impl<'a, S: VersionSource + ?Sized> DagWalker<'a, S> {
    pub fn new(source: &'a S, store: &'a mut DifferentialStore, options: WalkOptions) -> Self {
        DagWalker {
            source,
            store,
            options,
            nodes: Vec::new(),
            state: LiveState::new(),
            stats: WalkStats::default(),
            pending_forks: 0,
            bar: ProgressBar::hidden(),
        }
    }

    /// Live state after the last applied edge.
    pub fn state(&self) -> &LiveState {
        &self.state
    }

    /// Walk every version reachable from `start` and record all edge diffs.
    ///
    /// Graph consistency errors abort the walk; files that fail to parse are
    /// logged and skipped.
    pub fn walk(&mut self, start: &str) -> HistoryResult<WalkStats> {
        let records = self.source.versions(start)?;
        self.load(records);
        info!(
            "Walking {} versions, {} edges",
            self.stats.vertices, self.stats.edges
        );
        if self.options.progress {
            self.bar = ProgressBar::new(self.stats.edges as u64);
            self.bar.set_message("Diffing edges");
        }

        while let Some(orphan) = self.next_orphan() {
            self.reset_at(orphan)?;
            let mut path = vec![orphan];
            loop {
                self.track_until_merge(&mut path)?;
                if self.pending_forks == 0 {
                    break;
                }
                self.backtrack_until_fork(&mut path)?;
            }
        }

        self.bar.finish_with_message("Walk complete");
        if self.stats.forward != self.stats.edges {
            warn!(
                "Only {} of {} edges were reached",
                self.stats.forward, self.stats.edges
            );
        }
        info!("{}", self.stats);
        Ok(self.stats.clone())
    }

    fn load(&mut self, records: Vec<VersionRecord>) {
        let index: HashMap<&str, usize> = records
            .iter()
            .enumerate()
            .map(|(i, record)| (record.id.as_str(), i))
            .collect();

        let mut nodes: Vec<VersionNode> = records
            .iter()
            .map(|record| {
                // shallow histories can name parents that were never fetched
                let parents: Vec<usize> = record
                    .parents
                    .iter()
                    .filter_map(|p| index.get(p.as_str()).copied())
                    .collect();
                VersionNode {
                    id: record.id.clone(),
                    parents_left: parents.len(),
                    parents,
                    children_left: VecDeque::new(),
                    visited: false,
                }
            })
            .collect();

        for child in 0..nodes.len() {
            for parent in nodes[child].parents.clone() {
                nodes[parent].children_left.push_back(child);
            }
        }

        for node in &nodes {
            let parents: Vec<VersionId> = node.parents.iter().map(|&p| nodes[p].id.clone()).collect();
            self.store.register_version(&node.id, &parents);
        }

        self.stats.vertices = nodes.len();
        self.stats.edges = nodes.iter().map(|n| n.parents.len()).sum();
        self.nodes = nodes;
    }

    fn next_orphan(&self) -> Option<usize> {
        self.nodes
            .iter()
            .position(|node| node.parents.is_empty() && !node.visited)
    }

    /// Clear the live state and rebuild it for `orphan` from scratch.
    fn reset_at(&mut self, orphan: usize) -> HistoryResult<()> {
        let id = self.nodes[orphan].id.clone();
        info!("Reset at {}", short_id(&id));
        self.stats.orphans += 1;
        self.pending_forks = 0;
        self.state.reset();
        self.nodes[orphan].visited = true;

        let diff = self.compute_diff(None, &id)?;
        self.state.advance_to(&id);
        self.store.record_snapshot(&id, &diff)?;
        Ok(())
    }

    fn track_until_merge(&mut self, path: &mut Vec<usize>) -> HistoryResult<()> {
        let Some(&start) = path.last() else {
            return Ok(());
        };
        let mut tip = start;
        loop {
            let node = &mut self.nodes[tip];
            if node.parents_left > 0 {
                // a merge that still waits for its other parents
                return Ok(());
            }
            if node.children_left.len() > 1 {
                self.pending_forks += 1;
                self.stats.forks += 1;
            }
            let Some(child) = node.children_left.pop_front() else {
                return Ok(());
            };
            self.nodes[child].parents_left -= 1;
            self.stats.forward += 1;
            self.process_edge(tip, child)?;
            self.bar.inc(1);
            path.push(child);
            tip = child;
        }
    }

    fn backtrack_until_fork(&mut self, path: &mut Vec<usize>) -> HistoryResult<()> {
        let Some(mut child) = path.pop() else {
            return Ok(());
        };
        while let Some(parent) = path.pop() {
            let parent_id = self.nodes[parent].id.clone();
            let child_id = self.nodes[child].id.clone();
            self.stats.backward += 1;
            info!("{} <-- {}", short_id(&parent_id), short_id(&child_id));

            self.state.expect_at(Some(child_id.as_str()))?;
            let diff = self.store.edge_diff(&parent_id, &child_id)?;
            diff.apply(self.state.graph_mut(), Direction::Inverse)?;
            self.state.advance_to(&parent_id);

            if !self.nodes[parent].children_left.is_empty() {
                self.pending_forks = self.pending_forks.saturating_sub(1);
                path.push(parent);
                return Ok(());
            }
            child = parent;
        }
        Ok(())
    }

    fn process_edge(&mut self, parent: usize, child: usize) -> HistoryResult<()> {
        let parent_id = self.nodes[parent].id.clone();
        let child_id = self.nodes[child].id.clone();
        info!("{} --> {}", short_id(&parent_id), short_id(&child_id));

        self.state.expect_at(Some(parent_id.as_str()))?;
        let diff = self.compute_diff(Some(parent_id.as_str()), &child_id)?;
        self.state.advance_to(&child_id);
        self.nodes[child].visited = true;

        if !diff.is_empty() {
            self.stats.changed_edges += 1;
        }
        let merge = self.nodes[child].parents.len() > 1;
        self.store.record_edge(&parent_id, &child_id, diff, merge)
    }

    /// Parse the files changed between `parent` and `child` and fold them
    /// into the live state, returning the recorded operations.
    fn compute_diff(&mut self, parent: Option<&str>, child: &str) -> HistoryResult<Diff> {
        // every read happens before the live state is touched
        let files = self.fetch(parent, child)?;

        let mut recording = Recording::new(self.state.graph_mut());
        for (path, content) in files {
            let entry = match content.as_deref().map(|text| parse_module(&path, text)) {
                None => None,
                Some(Ok(module)) => Some(module),
                Some(Err(err)) => {
                    warn!("Skipping {} at {}: {}", path, short_id(child), err);
                    self.stats.skipped_files += 1;
                    continue;
                }
            };
            compare_module(&mut recording, &path, entry.as_ref())?;
        }
        Ok(recording.finish())
    }

    /// Contents of every changed source file at `child`; `None` marks removal.
    fn fetch(&self, parent: Option<&str>, child: &str) -> HistoryResult<Vec<(String, Option<String>)>> {
        let tracked = |path: &str| is_source_file(path, &self.options.extensions);
        let mut files = Vec::new();
        for change in self.source.changed_files(parent, child)? {
            match change.status {
                ChangeStatus::Deleted => {
                    if tracked(&change.path) {
                        files.push((change.path, None));
                    }
                }
                ChangeStatus::Renamed { from } => {
                    if tracked(&from) {
                        files.push((from, None));
                    }
                    if tracked(&change.path) {
                        let content = self.source.file_content(child, &change.path)?;
                        files.push((change.path, content));
                    }
                }
                ChangeStatus::Added | ChangeStatus::Modified => {
                    if tracked(&change.path) {
                        let content = self.source.file_content(child, &change.path)?;
                        files.push((change.path, content));
                    }
                }
            }
        }
        Ok(files)
    }
}

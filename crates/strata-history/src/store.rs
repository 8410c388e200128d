//! Differential store: per-edge diffs and the version-graph manifest on disk

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strata_core::Diff;

use crate::error::{HistoryError, HistoryResult};
use crate::vcs::{VersionId, EMPTY_TREE};

/// Diff artifacts directory inside the output directory
pub const DIFFERENTIALS_DIR: &str = "differentials";

/// Version-graph manifest file inside the output directory
pub const MANIFEST_FILE: &str = "versionDAG.json";

/// Where the diff for one edge lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EdgeRecord {
    /// The edge changed no structural fact; nothing is stored.
    Empty,
    /// Diff kept in the manifest itself.
    Inline { diff: Diff },
    /// Diff written to `differentials/{file}`.
    Artifact { file: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VersionEntry {
    pub parents: Vec<VersionId>,
    /// Diff from the empty state, recorded for orphans.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<EdgeRecord>,
    /// One record per parent edge, keyed by parent id.
    #[serde(default)]
    pub edges: BTreeMap<VersionId, EdgeRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default)]
    pub generated_at: String,
    pub versions: BTreeMap<VersionId, VersionEntry>,
}

impl Manifest {
    /// Total number of parent edges recorded.
    pub fn edge_count(&self) -> usize {
        self.versions.values().map(|v| v.edges.len()).sum()
    }
}

/// Artifact name for the diff of `parent -> child`.
pub fn artifact_name(parent: &str, child: &str) -> String {
    format!("{parent}-{child}.json")
}

/// Get manifest file path
pub fn manifest_path(dir: &Path) -> PathBuf {
    dir.join(MANIFEST_FILE)
}

/// Remove a previous output directory, if any
pub fn clear_output(dir: &Path) -> std::io::Result<()> {
    if dir.exists() {
        std::fs::remove_dir_all(dir)?;
    }
    Ok(())
}

pub struct DifferentialStore {
    dir: PathBuf,
    manifest: Manifest,
}

impl DifferentialStore {
    /// Start a fresh store, discarding whatever `dir` held before.
    pub fn create(dir: impl Into<PathBuf>) -> HistoryResult<Self> {
        let dir = dir.into();
        clear_output(&dir)?;
        std::fs::create_dir_all(dir.join(DIFFERENTIALS_DIR))?;
        tracing::debug!("Created differential store at {}", dir.display());
        Ok(DifferentialStore {
            dir,
            manifest: Manifest::default(),
        })
    }

    /// Open a store written by an earlier walk.
    pub fn open(dir: impl Into<PathBuf>) -> HistoryResult<Self> {
        let dir = dir.into();
        let path = manifest_path(&dir);
        if !path.exists() {
            return Err(HistoryError::Manifest(format!("no manifest at {}", path.display())));
        }
        let json = std::fs::read_to_string(&path)?;
        let manifest = serde_json::from_str(&json)?;
        tracing::debug!("Manifest loaded from: {}", path.display());
        Ok(DifferentialStore { dir, manifest })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn register_version(&mut self, id: &str, parents: &[VersionId]) {
        self.manifest.versions.entry(id.to_string()).or_default().parents = parents.to_vec();
    }

    /// Full id for `version`, which may be a unique prefix.
    pub fn resolve(&self, version: &str) -> HistoryResult<&str> {
        if let Some((id, _)) = self.manifest.versions.get_key_value(version) {
            return Ok(id.as_str());
        }
        let mut matches = self
            .manifest
            .versions
            .range(version.to_string()..)
            .map(|(id, _)| id)
            .take_while(|id| id.starts_with(version));
        match (matches.next(), matches.next()) {
            (Some(id), None) if !version.is_empty() => Ok(id.as_str()),
            _ => Err(HistoryError::UnknownVersion(version.to_string())),
        }
    }

    pub fn entry(&self, version: &str) -> HistoryResult<&VersionEntry> {
        self.manifest
            .versions
            .get(version)
            .ok_or_else(|| HistoryError::UnknownVersion(version.to_string()))
    }

    /// Store the diff that builds orphan `version` from the empty state.
    pub fn record_snapshot(&mut self, version: &str, diff: &Diff) -> HistoryResult<()> {
        let record = if diff.is_empty() {
            EdgeRecord::Empty
        } else {
            EdgeRecord::Artifact {
                file: self.write_artifact(EMPTY_TREE, version, diff)?,
            }
        };
        self.manifest.versions.entry(version.to_string()).or_default().snapshot = Some(record);
        Ok(())
    }

    /// Store the diff of edge `parent -> child`.
    ///
    /// Merge children keep one artifact per parent; other edges stay inline.
    pub fn record_edge(&mut self, parent: &str, child: &str, diff: Diff, merge: bool) -> HistoryResult<()> {
        let record = if diff.is_empty() {
            EdgeRecord::Empty
        } else if merge {
            EdgeRecord::Artifact {
                file: self.write_artifact(parent, child, &diff)?,
            }
        } else {
            EdgeRecord::Inline { diff }
        };
        self.manifest
            .versions
            .entry(child.to_string())
            .or_default()
            .edges
            .insert(parent.to_string(), record);
        Ok(())
    }

    pub fn edge_diff(&self, parent: &str, child: &str) -> HistoryResult<Diff> {
        let record = self.entry(child)?.edges.get(parent).ok_or_else(|| {
            HistoryError::Manifest(format!("no diff recorded for {parent} -> {child}"))
        })?;
        self.load(record)
    }

    pub fn snapshot_diff(&self, version: &str) -> HistoryResult<Diff> {
        let record = self
            .entry(version)?
            .snapshot
            .as_ref()
            .ok_or_else(|| HistoryError::Manifest(format!("no snapshot recorded for {version}")))?;
        self.load(record)
    }

    fn load(&self, record: &EdgeRecord) -> HistoryResult<Diff> {
        match record {
            EdgeRecord::Empty => Ok(Diff::new()),
            EdgeRecord::Inline { diff } => Ok(diff.clone()),
            EdgeRecord::Artifact { file } => {
                let json = std::fs::read_to_string(self.dir.join(DIFFERENTIALS_DIR).join(file))?;
                Ok(Diff::from_json(&json)?)
            }
        }
    }

    fn write_artifact(&self, parent: &str, child: &str, diff: &Diff) -> HistoryResult<String> {
        let file = artifact_name(parent, child);
        let path = self.dir.join(DIFFERENTIALS_DIR).join(&file);
        std::fs::write(&path, diff.to_json()?)?;
        tracing::debug!("Wrote {} ({} operations)", path.display(), diff.len());
        Ok(file)
    }

    /// Write the manifest and return its path.
    pub fn save_manifest(&mut self) -> HistoryResult<PathBuf> {
        self.manifest.generated_at = chrono::Utc::now().to_rfc3339();
        let path = manifest_path(&self.dir);
        let json = serde_json::to_string_pretty(&self.manifest)?;
        std::fs::write(&path, json)?;
        tracing::debug!("Manifest saved: {}", path.display());
        Ok(path)
    }
}

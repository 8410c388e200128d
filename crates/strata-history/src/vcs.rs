//! Version-control reader: commits, changed paths and file contents

use std::path::Path;

use git2::{Commit, Delta, ErrorCode, Oid, Repository, Sort, Tree};

use crate::error::{HistoryError, HistoryResult};

/// Commit identifier as a hex string.
pub type VersionId = String;

/// Hash of git's empty tree; names the diff that builds an orphan from nothing.
pub const EMPTY_TREE: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRecord {
    pub id: VersionId,
    pub parents: Vec<VersionId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeStatus {
    Added,
    Modified,
    Deleted,
    Renamed { from: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedFile {
    /// Path in the child version (the old path for deletions).
    pub path: String,
    pub status: ChangeStatus,
}

impl ChangedFile {
    pub fn new(path: impl Into<String>, status: ChangeStatus) -> Self {
        ChangedFile {
            path: path.into(),
            status,
        }
    }
}

/// What the walker needs from a version-control system.
pub trait VersionSource {
    /// Every version reachable from `start`, parents listed before children.
    fn versions(&self, start: &str) -> HistoryResult<Vec<VersionRecord>>;

    /// Paths that differ between `parent` and `child`. `None` compares against
    /// the empty tree, so every file of `child` is reported as added.
    fn changed_files(&self, parent: Option<&str>, child: &str) -> HistoryResult<Vec<ChangedFile>>;

    /// Full text of `path` at `version`, or `None` if it does not exist there.
    fn file_content(&self, version: &str, path: &str) -> HistoryResult<Option<String>>;
}

/// First eight characters of a version id, for log lines.
pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// [`VersionSource`] over a local git repository.
pub struct GitSource {
    repo: Repository,
}

impl GitSource {
    pub fn open(path: &Path) -> HistoryResult<Self> {
        let repo = Repository::open(path)?;
        tracing::debug!("Opened repository at {}", path.display());
        Ok(GitSource { repo })
    }

    fn commit(&self, id: &str) -> HistoryResult<Commit<'_>> {
        let oid = Oid::from_str(id).map_err(|_| HistoryError::UnknownVersion(id.to_string()))?;
        Ok(self.repo.find_commit(oid)?)
    }

    fn tree(&self, id: &str) -> HistoryResult<Tree<'_>> {
        Ok(self.commit(id)?.tree()?)
    }
}

impl VersionSource for GitSource {
    fn versions(&self, start: &str) -> HistoryResult<Vec<VersionRecord>> {
        let head = self
            .repo
            .revparse_single(start)
            .and_then(|object| object.peel_to_commit())
            .map_err(|_| HistoryError::UnknownVersion(start.to_string()))?;

        let mut revwalk = self.repo.revwalk()?;
        revwalk.push(head.id())?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::REVERSE)?;

        let mut records = Vec::new();
        for oid in revwalk {
            let commit = self.repo.find_commit(oid?)?;
            records.push(VersionRecord {
                id: commit.id().to_string(),
                parents: commit.parent_ids().map(|p| p.to_string()).collect(),
            });
        }
        Ok(records)
    }

    fn changed_files(&self, parent: Option<&str>, child: &str) -> HistoryResult<Vec<ChangedFile>> {
        let old_tree = match parent {
            Some(parent) => Some(self.tree(parent)?),
            None => None,
        };
        let new_tree = self.tree(child)?;
        // rename detection stays off: a rename is a delete plus an add
        let diff = self.repo.diff_tree_to_tree(old_tree.as_ref(), Some(&new_tree), None)?;

        let files = diff
            .deltas()
            .filter_map(|delta| {
                let old_path = delta.old_file().path().and_then(|p| p.to_str());
                let new_path = delta.new_file().path().and_then(|p| p.to_str());
                match delta.status() {
                    Delta::Added | Delta::Copied => Some(ChangedFile::new(new_path?, ChangeStatus::Added)),
                    Delta::Modified | Delta::Typechange => {
                        Some(ChangedFile::new(new_path?, ChangeStatus::Modified))
                    }
                    Delta::Deleted => Some(ChangedFile::new(old_path?, ChangeStatus::Deleted)),
                    Delta::Renamed => Some(ChangedFile::new(
                        new_path?,
                        ChangeStatus::Renamed {
                            from: old_path?.to_string(),
                        },
                    )),
                    _ => None,
                }
            })
            .collect();
        Ok(files)
    }

    fn file_content(&self, version: &str, path: &str) -> HistoryResult<Option<String>> {
        let tree = self.tree(version)?;
        let entry = match tree.get_path(Path::new(path)) {
            Ok(entry) => entry,
            Err(err) if err.code() == ErrorCode::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let blob = self.repo.find_blob(entry.id())?;
        Ok(Some(String::from_utf8_lossy(blob.content()).into_owned()))
    }
}

use std::path::Path;

use git2::{Delta, DiffFindOptions, DiffOptions, ErrorCode, Oid, Repository, Tree};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// How a path changed between baseline and head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Modified,
    Renamed,
    Deleted,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Added => "added",
            ChangeKind::Modified => "modified",
            ChangeKind::Renamed => "renamed",
            ChangeKind::Deleted => "deleted",
        }
    }
}

/// A single changed path, `/`-separated and relative to the repository root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathChange {
    pub path: String,
    /// Path on the baseline side, for renames.
    pub previous_path: Option<String>,
    pub kind: ChangeKind,
}

impl PathChange {
    /// Path to read the baseline content from, if the baseline has one.
    pub fn baseline_path(&self) -> Option<&str> {
        match self.kind {
            ChangeKind::Added => None,
            ChangeKind::Renamed => self.previous_path.as_deref(),
            ChangeKind::Modified | ChangeKind::Deleted => Some(&self.path),
        }
    }
}

fn commit_tree(repo: &Repository, oid: Oid) -> Result<Tree<'_>> {
    Ok(repo.find_commit(oid)?.tree()?)
}

/// List the paths that differ between `baseline` and `head`.
///
/// A `None` baseline diffs against the empty tree, so every file in head is
/// reported as added. Renames are detected. Output is sorted by path.
pub fn changed_paths(
    repo: &Repository,
    baseline: Option<Oid>,
    head: Oid,
) -> Result<Vec<PathChange>> {
    let old_tree = baseline.map(|oid| commit_tree(repo, oid)).transpose()?;
    let new_tree = commit_tree(repo, head)?;

    let mut opts = DiffOptions::new();
    opts.include_typechange(true);

    let mut diff = repo.diff_tree_to_tree(old_tree.as_ref(), Some(&new_tree), Some(&mut opts))?;
    diff.find_similar(Some(DiffFindOptions::new().renames(true)))?;

    let mut changes = Vec::new();
    for delta in diff.deltas() {
        let kind = match delta.status() {
            Delta::Added | Delta::Copied => ChangeKind::Added,
            Delta::Modified | Delta::Typechange => ChangeKind::Modified,
            Delta::Renamed => ChangeKind::Renamed,
            Delta::Deleted => ChangeKind::Deleted,
            other => {
                debug!(status = ?other, "skipping diff entry");
                continue;
            }
        };

        let new_path = delta.new_file().path().map(path_string);
        let old_path = delta.old_file().path().map(path_string);

        let change = match kind {
            ChangeKind::Deleted => PathChange {
                path: old_path.unwrap_or_default(),
                previous_path: None,
                kind,
            },
            ChangeKind::Renamed => PathChange {
                path: new_path.unwrap_or_default(),
                previous_path: old_path,
                kind,
            },
            _ => PathChange {
                path: new_path.unwrap_or_default(),
                previous_path: None,
                kind,
            },
        };

        if !change.path.is_empty() {
            changes.push(change);
        }
    }

    changes.sort_by(|a, b| a.path.cmp(&b.path));
    debug!(count = changes.len(), "collected changed paths");
    Ok(changes)
}

/// Read the content of `path` as committed in `commit`.
///
/// Returns `None` when the path does not exist in that commit.
pub fn read_blob(repo: &Repository, commit: Oid, path: &str) -> Result<Option<Vec<u8>>> {
    let tree = commit_tree(repo, commit)?;
    let entry = match tree.get_path(Path::new(path)) {
        Ok(entry) => entry,
        Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let blob = entry.to_object(repo)?.peel_to_blob()?;
    Ok(Some(blob.content().to_vec()))
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

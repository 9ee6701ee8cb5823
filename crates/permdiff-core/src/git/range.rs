use std::path::{Path, PathBuf};

use git2::{Commit, ErrorCode, Oid, Repository, Sort};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Commit range a scan compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRange {
    /// Commit the base ref resolved to, if one was given.
    pub base: Option<Oid>,
    pub head: Oid,
    /// Tree the head is diffed against. `None` is the empty tree.
    pub baseline: Option<Oid>,
}

/// Report-facing view of a [`ResolvedRange`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeInfo {
    pub base: Option<String>,
    pub head: String,
    pub baseline: Option<String>,
}

impl From<&ResolvedRange> for RangeInfo {
    fn from(range: &ResolvedRange) -> Self {
        Self {
            base: range.base.map(|o| o.to_string()),
            head: range.head.to_string(),
            baseline: range.baseline.map(|o| o.to_string()),
        }
    }
}

/// Open the repository containing `path`.
pub fn open(path: &Path) -> Result<Repository> {
    let repo = Repository::discover(path)?;
    debug!(git_dir = %repo.path().display(), "opened repository");
    Ok(repo)
}

/// Working tree root of the repository containing `path`.
pub fn repo_root(path: &Path) -> Result<PathBuf> {
    let repo = open(path)?;
    Ok(root_of(&repo, path))
}

/// Bare repositories have no working tree; `fallback` stands in for it.
pub(crate) fn root_of(repo: &Repository, fallback: &Path) -> PathBuf {
    repo.workdir()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| fallback.to_path_buf())
}

/// Resolve a ref to a commit, trying `origin/<spec>` when `<spec>` is
/// unknown locally. CI checkouts often only carry remote-tracking branches.
pub fn resolve_commit<'r>(repo: &'r Repository, spec: &str) -> Result<Commit<'r>> {
    for candidate in [spec.to_string(), format!("origin/{}", spec)] {
        match repo.revparse_single(&candidate) {
            Ok(object) => return Ok(object.peel_to_commit()?),
            Err(e) if e.code() == ErrorCode::NotFound || e.code() == ErrorCode::InvalidSpec => {
                continue;
            }
            Err(e) => return Err(e.into()),
        }
    }
    Err(Error::UnknownRef(spec.to_string()))
}

/// Resolve the base/head pair into the commits the diff runs between.
///
/// The baseline is the merge base of base and head, so changes that landed
/// on the base branch after the head branched off are not attributed to the
/// head. Without a base ref the head's first parent is used; a root commit
/// is compared against the empty tree.
pub fn resolve_range(
    repo: &Repository,
    base_ref: Option<&str>,
    head_ref: Option<&str>,
) -> Result<ResolvedRange> {
    let head = match head_ref {
        Some(spec) => resolve_commit(repo, spec)?,
        None => repo.head()?.peel_to_commit()?,
    };

    let base = base_ref
        .map(|spec| resolve_commit(repo, spec))
        .transpose()?;

    let baseline = match &base {
        Some(base) => match repo.merge_base(base.id(), head.id()) {
            Ok(oid) => Some(oid),
            Err(e) if e.code() == ErrorCode::NotFound => {
                debug!("no merge base between base and head, diffing against base");
                Some(base.id())
            }
            Err(e) => return Err(e.into()),
        },
        None => head.parent_ids().next(),
    };

    let range = ResolvedRange {
        base: base.as_ref().map(Commit::id),
        head: head.id(),
        baseline,
    };

    info!(
        head = %range.head,
        baseline = %range.baseline.map(|o| o.to_string()).unwrap_or_else(|| "<empty tree>".into()),
        "resolved commit range"
    );

    Ok(range)
}

/// One-line summaries of the commits between baseline and head, newest
/// first. Used for the scan log only.
pub fn commits_in_range(repo: &Repository, range: &ResolvedRange) -> Result<Vec<String>> {
    let mut walk = repo.revwalk()?;
    walk.set_sorting(Sort::TOPOLOGICAL)?;
    walk.push(range.head)?;
    if let Some(baseline) = range.baseline {
        walk.hide(baseline)?;
    }

    let mut lines = Vec::new();
    for oid in walk {
        let oid = oid?;
        let commit = repo.find_commit(oid)?;
        let short = oid.to_string();
        lines.push(format!(
            "{} {}",
            &short[..short.len().min(8)],
            commit.summary().unwrap_or("")
        ));
    }
    Ok(lines)
}

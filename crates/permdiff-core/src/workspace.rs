//! Scan directory holding the lockfiles handed to the engine.
//!
//! Layout:
//!
//! ```text
//! <tmp>/base/<lockfile path>   content at the baseline, if any
//! <tmp>/head/<lockfile path>   content at the head
//! ```
//!
//! Both sides use the head path, so a renamed lockfile lines up with its
//! previous content. The directory is removed when the workspace is dropped.

use std::fs;
use std::path::{Component, Path, PathBuf};

use git2::Repository;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::TempDir;
use tracing::debug;

use crate::error::{Error, Result};
use crate::git::{self, PathChange, ResolvedRange};

pub const BASE_DIR: &str = "base";
pub const HEAD_DIR: &str = "head";

/// Which side of the range a file or finding belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Base,
    Head,
}

impl Side {
    pub fn dir_name(&self) -> &'static str {
        match self {
            Side::Base => BASE_DIR,
            Side::Head => HEAD_DIR,
        }
    }
}

/// Content identity of one materialized file.
///
/// Depends only on the bytes, so identical content always yields the same
/// snapshot regardless of commit or path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub sha256: String,
    pub size_bytes: u64,
}

impl Snapshot {
    pub fn of(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self {
            sha256: hex::encode(hasher.finalize()),
            size_bytes: bytes.len() as u64,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MaterializedLockfile {
    pub change: PathChange,
    /// `None` when the lockfile is introduced by the head.
    pub base: Option<Snapshot>,
    pub head: Snapshot,
}

impl MaterializedLockfile {
    pub fn path(&self) -> &str {
        &self.change.path
    }
}

#[derive(Debug)]
pub struct ScanWorkspace {
    dir: TempDir,
    root: PathBuf,
    lockfiles: Vec<MaterializedLockfile>,
}

impl ScanWorkspace {
    /// Write the baseline and head content of every selected lockfile.
    pub fn materialize(
        repo: &Repository,
        range: &ResolvedRange,
        selected: &[PathChange],
    ) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("permdiff-")
            .tempdir()
            .map_err(|e| Error::io(std::env::temp_dir(), e))?;
        let root = dir
            .path()
            .canonicalize()
            .map_err(|e| Error::io(dir.path(), e))?;

        let mut lockfiles = Vec::with_capacity(selected.len());
        for change in selected {
            let head_bytes = git::read_blob(repo, range.head, &change.path)?.ok_or_else(|| {
                Error::Git(git2::Error::from_str(&format!(
                    "{} missing from head commit {}",
                    change.path, range.head
                )))
            })?;

            let base_bytes = match (range.baseline, change.baseline_path()) {
                (Some(baseline), Some(path)) => git::read_blob(repo, baseline, path)?,
                _ => None,
            };

            let head = write_side(&root, Side::Head, &change.path, &head_bytes)?;
            let base = base_bytes
                .map(|bytes| write_side(&root, Side::Base, &change.path, &bytes))
                .transpose()?;

            debug!(
                path = %change.path,
                kind = change.kind.as_str(),
                has_base = base.is_some(),
                "materialized lockfile"
            );

            lockfiles.push(MaterializedLockfile {
                change: change.clone(),
                base,
                head,
            });
        }

        Ok(Self {
            dir,
            root,
            lockfiles,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn lockfiles(&self) -> &[MaterializedLockfile] {
        &self.lockfiles
    }

    /// Engine targets, relative to [`ScanWorkspace::root`], sorted.
    pub fn targets(&self) -> Vec<String> {
        let mut targets: Vec<String> = self
            .lockfiles
            .iter()
            .flat_map(|l| {
                let base = l
                    .base
                    .as_ref()
                    .map(|_| format!("{}/{}", BASE_DIR, l.path()));
                base.into_iter()
                    .chain(std::iter::once(format!("{}/{}", HEAD_DIR, l.path())))
            })
            .collect();
        targets.sort();
        targets
    }

    /// Map a location reported by the engine back to a side and lockfile.
    ///
    /// Accepts paths relative to the scan directory (optionally `./`
    /// prefixed) and absolute paths inside it. Returns `None` for anything
    /// that does not name a materialized file.
    pub fn locate(&self, reported: &str) -> Option<(Side, &MaterializedLockfile)> {
        let reported = Path::new(reported);
        let relative = if reported.is_absolute() {
            reported
                .strip_prefix(&self.root)
                .or_else(|_| reported.strip_prefix(self.dir.path()))
                .ok()?
        } else {
            reported
        };

        let mut parts = relative
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .map(|c| c.as_os_str().to_string_lossy().into_owned());

        let side = match parts.next()?.as_str() {
            BASE_DIR => Side::Base,
            HEAD_DIR => Side::Head,
            _ => return None,
        };
        let rest: Vec<String> = parts.collect();
        let path = rest.join("/");

        let lockfile = self.lockfiles.iter().find(|l| l.path() == path)?;
        if side == Side::Base && lockfile.base.is_none() {
            return None;
        }
        Some((side, lockfile))
    }
}

fn write_side(root: &Path, side: Side, path: &str, bytes: &[u8]) -> Result<Snapshot> {
    let target = root.join(side.dir_name()).join(path);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    fs::write(&target, bytes).map_err(|e| Error::io(&target, e))?;
    Ok(Snapshot::of(bytes))
}

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use git2::{Commit, Oid, Repository, Signature};
use tempfile::TempDir;

/// Stand-in engine. Each lockfile line `name version permission` becomes
/// one finding; lines with fewer fields are ignored.
pub const FAKE_ENGINE: &str = r#"#!/bin/sh
if [ "$1" = "--version" ]; then
    echo "fake-engine 1.0.0"
    exit 0
fi
shift
for f in "$@"; do
    n=0
    while read -r name version perm; do
        n=$((n + 1))
        [ -n "$perm" ] || continue
        printf '{"check_id":"deps.%s","path":"%s","start":{"line":%d},"extra":{"metadata":{"package":{"name":"%s","version":"%s"},"permission":"%s"}}}\n' \
            "$perm" "$f" "$n" "$name" "$version" "$perm"
    done < "$f"
done
"#;

pub const FAILING_ENGINE: &str = r#"#!/bin/sh
if [ "$1" = "--version" ]; then
    echo "fake-engine 1.0.0"
    exit 0
fi
echo "rule pack could not be loaded" >&2
exit 2
"#;

pub const GARBAGE_ENGINE: &str = r#"#!/bin/sh
if [ "$1" = "--version" ]; then
    echo "fake-engine 1.0.0"
    exit 0
fi
echo "this is not json"
"#;

/// Scratch git repository.
pub struct Scratch {
    pub dir: TempDir,
    pub repo: Repository,
}

impl Scratch {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let repo = Repository::init(dir.path()).expect("init repository");
        Self { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Commit a tree holding exactly `files` on top of `HEAD`.
    pub fn commit(&self, files: &[(&str, &str)], message: &str) -> Oid {
        let workdir = self.repo.workdir().expect("non-bare repository");
        let mut index = self.repo.index().expect("open index");
        index.clear().expect("clear index");
        for (path, contents) in files {
            let full = workdir.join(path);
            if let Some(parent) = full.parent() {
                std::fs::create_dir_all(parent).expect("create parent dirs");
            }
            std::fs::write(&full, contents).expect("write file");
            index.add_path(Path::new(path)).expect("stage file");
        }
        let tree = self
            .repo
            .find_tree(index.write_tree().expect("write tree"))
            .expect("find tree");
        let sig = Signature::now("permdiff", "permdiff@localhost").expect("signature");
        let parent: Option<Commit<'_>> = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&Commit<'_>> = parent.iter().collect();
        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("create commit")
    }

    /// Point branch `name` at `oid`.
    pub fn branch(&self, name: &str, oid: Oid) {
        let commit = self.repo.find_commit(oid).expect("find commit");
        self.repo.branch(name, &commit, true).expect("create branch");
    }
}

/// Write an engine script into `dir` and return its path.
pub fn write_engine(dir: &Path, name: &str, script: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, script).expect("write engine script");
    path
}

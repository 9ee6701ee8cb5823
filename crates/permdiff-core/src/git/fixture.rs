//! Scratch repositories for unit tests.

use std::path::Path;

use git2::{Commit, Oid, Repository, Signature};
use tempfile::TempDir;

pub struct TestRepo {
    pub dir: TempDir,
    pub repo: Repository,
}

impl TestRepo {
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
        let parent = self
            .repo
            .head()
            .ok()
            .and_then(|h| h.peel_to_commit().ok())
            .map(|c| c.id());
        let parents: Vec<Oid> = parent.into_iter().collect();
        self.commit_on("HEAD", &parents, files, message)
    }

    /// Commit a tree holding exactly `files`, moving `reference` to it.
    pub fn commit_on(
        &self,
        reference: &str,
        parents: &[Oid],
        files: &[(&str, &str)],
        message: &str,
    ) -> Oid {
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

        let tree_id = index.write_tree().expect("write tree");
        let tree = self.repo.find_tree(tree_id).expect("find tree");
        let sig = Signature::now("permdiff", "permdiff@localhost").expect("signature");
        let parent_commits: Vec<Commit<'_>> = parents
            .iter()
            .map(|oid| self.repo.find_commit(*oid).expect("find parent"))
            .collect();
        let parent_refs: Vec<&Commit<'_>> = parent_commits.iter().collect();

        self.repo
            .commit(Some(reference), &sig, &sig, message, &tree, &parent_refs)
            .expect("create commit")
    }

    pub fn tag(&self, name: &str, oid: Oid) {
        let object = self.repo.find_object(oid, None).expect("find object");
        self.repo
            .tag_lightweight(name, &object, true)
            .expect("create tag");
    }
}

use std::path::Path;

use glob::{MatchOptions, Pattern};
use tracing::{debug, info};

use crate::config::LockfileConfig;
use crate::error::{Error, Result};
use crate::git::{ChangeKind, PathChange};

/// Path-ignore file honored at the repository root.
pub const IGNORE_FILE: &str = ".semgrepignore";

/// Picks the changed paths worth handing to the engine.
#[derive(Debug, Clone)]
pub struct LockfileSelector {
    names: Vec<String>,
    exclude: Vec<Pattern>,
}

impl LockfileSelector {
    pub fn new(config: &LockfileConfig) -> Result<Self> {
        let exclude = config
            .exclude
            .iter()
            .map(|p| {
                Pattern::new(p)
                    .map_err(|e| Error::Config(format!("invalid exclude pattern '{}': {}", p, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            names: config.names.iter().map(|n| n.to_lowercase()).collect(),
            exclude,
        })
    }

    /// Add the patterns of `<repo_root>/.semgrepignore`, if present.
    pub fn with_ignore_file(mut self, repo_root: &Path) -> Result<Self> {
        let path = repo_root.join(IGNORE_FILE);
        if !path.is_file() {
            return Ok(self);
        }

        let contents = std::fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        let patterns = ignore_patterns(&contents);
        info!(path = %path.display(), patterns = patterns.len(), "using path ignore rules");

        for p in patterns {
            let pattern = Pattern::new(&p).map_err(|e| {
                Error::Config(format!("invalid pattern '{}' in {}: {}", p, IGNORE_FILE, e))
            })?;
            self.exclude.push(pattern);
        }
        Ok(self)
    }

    /// True when the file name matches a configured lockfile name,
    /// ignoring case.
    pub fn is_lockfile(&self, path: &str) -> bool {
        let file_name = path.rsplit('/').next().unwrap_or(path).to_lowercase();
        self.names.iter().any(|n| *n == file_name)
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        let opts = MatchOptions {
            case_sensitive: true,
            require_literal_separator: false,
            require_literal_leading_dot: false,
        };
        self.exclude.iter().any(|p| p.matches_with(path, opts))
    }

    /// Keep added, modified and renamed lockfiles that are not excluded.
    ///
    /// Deleted lockfiles introduce nothing and are dropped. Input order is
    /// preserved, so sorted input gives sorted output.
    pub fn select(&self, changes: &[PathChange]) -> Vec<PathChange> {
        changes
            .iter()
            .filter(|c| c.kind != ChangeKind::Deleted)
            .filter(|c| self.is_lockfile(&c.path))
            .filter(|c| {
                let excluded = self.is_excluded(&c.path);
                if excluded {
                    debug!(path = %c.path, "lockfile excluded by pattern");
                }
                !excluded
            })
            .cloned()
            .collect()
    }
}

/// Translate gitignore-style lines into exclude globs.
///
/// A pattern with no inner `/` matches at any depth; a leading or inner
/// `/` anchors it at the root. A trailing `/` restricts it to directories.
/// Comments, negations (`!`) and directives (`:include`) are skipped.
pub fn ignore_patterns(contents: &str) -> Vec<String> {
    let mut out = Vec::new();

    for line in contents.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with('!') || line.starts_with(':') {
            debug!(line, "unsupported ignore line skipped");
            continue;
        }

        let dir_only = line.ends_with('/');
        let body = line.trim_end_matches('/');
        let anchored = body.contains('/');
        let body = body.trim_start_matches('/');
        if body.is_empty() {
            continue;
        }

        let base = if anchored {
            body.to_string()
        } else {
            format!("**/{}", body)
        };
        if !dir_only {
            out.push(base.clone());
        }
        out.push(format!("{}/**", base));
    }

    out
}

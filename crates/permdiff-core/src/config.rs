use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// File looked up at the repository root when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = ".permdiff.toml";

/// Placeholder in `engine.args` replaced by the rule pack.
pub const RULES_PLACEHOLDER: &str = "{rules}";

/// Scan configuration.
///
/// Loaded from a TOML file; every key is optional and falls back to the
/// defaults below. The CLI layers flag and environment overrides on top.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ScanConfig {
    pub engine: EngineConfig,
    pub lockfiles: LockfileConfig,
    pub output: OutputConfig,
}

impl ScanConfig {
    /// Load configuration for a repository.
    ///
    /// An explicit path must exist. Without one, `<repo>/.permdiff.toml`
    /// is used when present, otherwise the defaults.
    pub fn load(explicit: Option<&Path>, repo_root: &Path) -> Result<Self> {
        let path = match explicit {
            Some(path) => {
                if !path.is_file() {
                    return Err(Error::Config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                path.to_path_buf()
            }
            None => {
                let candidate = repo_root.join(DEFAULT_CONFIG_FILE);
                if !candidate.is_file() {
                    debug!("no {} found, using defaults", DEFAULT_CONFIG_FILE);
                    return Ok(Self::default());
                }
                candidate
            }
        };

        info!(path = %path.display(), "loading configuration");
        let contents = std::fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Engine executable, looked up on `PATH` unless it contains a separator.
    pub program: String,

    /// Arguments placed before the target list. `{rules}` is substituted.
    pub args: Vec<String>,

    /// Rule pack: registry id or path (relative paths resolve against the
    /// repository root).
    pub rules: String,

    /// Arguments for the version probe logged at startup.
    pub version_args: Vec<String>,

    /// Exit codes treated as a successful run.
    pub ok_exit_codes: Vec<i32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: "semgrep".to_string(),
            args: vec![
                "--config".to_string(),
                RULES_PLACEHOLDER.to_string(),
                "--jsonl".to_string(),
            ],
            rules: "p/dependency-permissions".to_string(),
            version_args: vec!["--version".to_string()],
            ok_exit_codes: vec![0],
        }
    }
}

impl EngineConfig {
    /// Engine arguments with the rule pack substituted in.
    pub fn rendered_args(&self, rules: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.replace(RULES_PLACEHOLDER, rules))
            .collect()
    }

    /// Rule pack as handed to the engine.
    ///
    /// The engine runs inside the scan directory, so a rule pack that
    /// exists relative to the repository root is made absolute.
    pub fn resolved_rules(&self, repo_root: &Path) -> String {
        let candidate = repo_root.join(&self.rules);
        if Path::new(&self.rules).is_relative() && candidate.exists() {
            candidate.display().to_string()
        } else {
            self.rules.clone()
        }
    }

    /// Program as handed to the OS.
    ///
    /// Bare names are left for `PATH` lookup; relative paths with a
    /// separator resolve against the repository root.
    pub fn resolved_program(&self, repo_root: &Path) -> PathBuf {
        let program = Path::new(&self.program);
        if program.is_relative() && program.components().count() > 1 {
            repo_root.join(program)
        } else {
            program.to_path_buf()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LockfileConfig {
    /// Lockfile names, compared case-insensitively with the file name.
    pub names: Vec<String>,

    /// Glob patterns for paths that are never analyzed.
    pub exclude: Vec<String>,
}

impl Default for LockfileConfig {
    fn default() -> Self {
        Self {
            names: [
                "Pipfile.lock",
                "yarn.lock",
                "package-lock.json",
                "pnpm-lock.yaml",
                "poetry.lock",
                "Gemfile.lock",
                "Cargo.lock",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            exclude: vec!["**/node_modules/**".to_string(), "**/vendor/**".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Variable name the summary is exported under in `GITHUB_ENV`.
    pub env_var: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            env_var: "MARKDOWN_COMMENT".to_string(),
        }
    }
}

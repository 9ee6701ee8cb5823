//! CI environment detection.
//!
//! Reads the variables a CI platform sets for a job and turns them into the
//! commit range and pull request a scan applies to. Detection works on an
//! explicit variable map so callers decide where the values come from.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Events a scan can be triggered by.
pub const SUPPORTED_EVENTS: &[&str] = &["push", "pull_request", "pull_request_target"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    GithubActions,
    Local,
}

/// Where and why a scan runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CiContext {
    pub provider: Provider,
    pub event: String,
    /// Ref the head is compared against; `None` means the head's parent.
    pub base_ref: Option<String>,
    /// Ref to analyze; `None` means `HEAD`.
    pub head_ref: Option<String>,
    /// Pull request identifier handed on to the comment step.
    pub pr_number: Option<u64>,
    pub repository: Option<String>,
    /// Path of the GitHub Actions env file (`GITHUB_ENV`).
    pub env_file: Option<PathBuf>,
}

impl CiContext {
    /// Detect the CI context from environment variables.
    pub fn detect(vars: &BTreeMap<String, String>) -> Result<Self> {
        let get = |key: &str| {
            vars.get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let provider = if get("GITHUB_ACTIONS").is_some() {
            Provider::GithubActions
        } else {
            Provider::Local
        };

        let event = match provider {
            Provider::GithubActions => get("GITHUB_EVENT_NAME").unwrap_or_else(|| "push".into()),
            Provider::Local => "push".to_string(),
        };

        if !SUPPORTED_EVENTS.contains(&event.as_str()) {
            return Err(Error::UnsupportedEvent {
                event,
                supported: SUPPORTED_EVENTS.join(", "),
            });
        }

        let pr_number = match get("PR_NUMBER") {
            Some(raw) => Some(parse_pr_number(&raw)?),
            None => get("GITHUB_REF").as_deref().and_then(pr_from_github_ref),
        };

        let mut ctx = Self {
            provider,
            event,
            base_ref: get("BASELINE_REF"),
            head_ref: get("HEAD_REF"),
            pr_number,
            repository: get("GITHUB_REPOSITORY"),
            env_file: get("GITHUB_ENV").map(PathBuf::from),
        };
        if ctx.base_ref.is_none() && ctx.is_pull_request() {
            ctx.base_ref = get("GITHUB_BASE_REF");
        }
        Ok(ctx)
    }

    pub fn is_pull_request(&self) -> bool {
        self.event.starts_with("pull_request")
    }
}

pub fn parse_pr_number(raw: &str) -> Result<u64> {
    raw.trim()
        .trim_start_matches('#')
        .parse()
        .map_err(|_| Error::Config(format!("invalid pull request number: '{}'", raw)))
}

/// `refs/pull/<n>/merge` and `refs/pull/<n>/head` carry the PR number.
fn pr_from_github_ref(git_ref: &str) -> Option<u64> {
    let rest = git_ref.strip_prefix("refs/pull/")?;
    let (number, _) = rest.split_once('/')?;
    number.parse().ok()
}

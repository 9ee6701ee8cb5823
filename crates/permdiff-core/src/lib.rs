pub mod ci;
pub mod config;
pub mod engine;
pub mod error;
pub mod findings;
pub mod git;
pub mod lockfile;
pub mod report;
pub mod rules;
pub mod util;
pub mod workspace;

use std::path::PathBuf;

use tracing::{debug, info};

pub use error::{Error, Result};

use crate::ci::CiContext;
use crate::config::ScanConfig;
use crate::engine::Engine;
use crate::lockfile::LockfileSelector;
use crate::report::{ContextInfo, LockfileReport, Report, ToolInfo};
use crate::workspace::ScanWorkspace;

pub const TOOL_NAME: &str = "permdiff";

/// JSON schema version of permdiff reports.
/// Bumped only when the report layout changes semantically.
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Everything a scan needs, already resolved by the caller.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    /// Any path inside the repository to analyze.
    pub repo: PathBuf,
    pub config: ScanConfig,
    pub context: CiContext,
    pub tool: ToolInfo,
}

/// Run a scan end to end.
///
/// 1. resolve the commit range and list changed paths
/// 2. select changed lockfiles; stop early if there are none
/// 3. materialize both sides and run the engine once over them
/// 4. classify findings and compare base against head per lockfile
pub fn scan(request: &ScanRequest) -> Result<Report> {
    let repo = git::open(&request.repo)?;
    let repo_root = git::range::root_of(&repo, &request.repo);

    let range = git::resolve_range(
        &repo,
        request.context.base_ref.as_deref(),
        request.context.head_ref.as_deref(),
    )?;
    for line in git::range::commits_in_range(&repo, &range)? {
        debug!(commit = %line, "in range");
    }

    let changes = git::changed_paths(&repo, range.baseline, range.head)?;
    let selector =
        LockfileSelector::new(&request.config.lockfiles)?.with_ignore_file(&repo_root)?;
    let selected = selector.select(&changes);

    let context = ContextInfo::from(&request.context);
    let range_info = git::RangeInfo::from(&range);

    if selected.is_empty() {
        info!(changed = changes.len(), "no lockfile changes in range");
        return Ok(Report::no_changes(request.tool.clone(), context, range_info));
    }
    info!(lockfiles = selected.len(), "lockfiles selected for analysis");

    let workspace = ScanWorkspace::materialize(&repo, &range, &selected)?;

    let engine = Engine::from_config(&request.config.engine, &repo_root);
    let version = engine.probe_version()?;
    let stdout = engine.run(workspace.root(), &workspace.targets())?;

    let records = engine::parse_records(&stdout)?;
    let mut findings = findings::extract_findings(records, &workspace)?;
    util::deterministic::sort_findings(&mut findings);
    info!(findings = findings.len(), "engine findings mapped");

    let lockfiles = workspace
        .lockfiles()
        .iter()
        .map(|lf| LockfileReport {
            path: lf.path().to_string(),
            change: lf.change.kind,
            previous_path: lf.change.previous_path.clone(),
            base: lf.base.clone(),
            head: lf.head.clone(),
            dependencies: findings::compare_lockfile(&findings, lf.path()),
        })
        .collect();

    Ok(Report::analyzed(
        request.tool.clone(),
        context,
        range_info,
        engine.info(version),
        findings.len(),
        lockfiles,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ci::Provider;
    use crate::git::fixture::TestRepo;
    use crate::report::ScanStatus;

    fn request(repo: &TestRepo, program: &str) -> ScanRequest {
        let mut config = ScanConfig::default();
        config.engine.program = program.to_string();
        ScanRequest {
            repo: repo.path().to_path_buf(),
            config,
            context: CiContext {
                provider: Provider::Local,
                event: "push".into(),
                base_ref: None,
                head_ref: None,
                pr_number: None,
                repository: None,
                env_file: None,
            },
            tool: ToolInfo {
                name: TOOL_NAME.into(),
                version: "0.0.0".into(),
            },
        }
    }

    #[test]
    fn range_without_lockfiles_skips_engine() {
        let repo = TestRepo::new();
        repo.commit(&[("src/main.rs", "fn main() {}\n")], "init");
        repo.commit(&[("src/main.rs", "fn main() { run() }\n")], "edit");

        let report = scan(&request(&repo, "/nonexistent/permdiff-engine")).unwrap();
        assert_eq!(report.status, ScanStatus::NoChanges);
        assert!(report.engine.is_none());
    }

    #[test]
    fn missing_engine_fails_when_lockfiles_change() {
        let repo = TestRepo::new();
        repo.commit(&[("README.md", "hi\n")], "init");
        repo.commit(&[("README.md", "hi\n"), ("yarn.lock", "a 1 network\n")], "add lock");

        let err = scan(&request(&repo, "/nonexistent/permdiff-engine")).unwrap_err();
        assert!(matches!(err, Error::EngineNotFound { .. }));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn unknown_base_ref_is_git_error() {
        let repo = TestRepo::new();
        repo.commit(&[("yarn.lock", "a 1 network\n")], "init");

        let mut req = request(&repo, "/nonexistent/permdiff-engine");
        req.context.base_ref = Some("no-such-branch".into());
        let err = scan(&req).unwrap_err();
        assert!(matches!(err, Error::UnknownRef(_)));
        assert_eq!(err.exit_code(), 4);
    }
}

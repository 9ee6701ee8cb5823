use serde::{Deserialize, Serialize};

use crate::SCHEMA_VERSION;
use crate::ci::CiContext;
use crate::engine::EngineInfo;
use crate::findings::DependencyChange;
use crate::git::{ChangeKind, RangeInfo};
use crate::util::deterministic::sort_lockfile_reports;
use crate::workspace::Snapshot;

/// Top-level permdiff report.
///
/// This is the JSON contract of `--format json`. It carries no timestamps
/// or temporary paths, so identical repository state yields identical
/// output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Report {
    pub schema_version: String,
    pub tool: ToolInfo,
    pub context: ContextInfo,
    pub range: RangeInfo,
    /// `None` when the engine was not needed.
    pub engine: Option<EngineInfo>,
    pub status: ScanStatus,
    pub finding_count: usize,
    pub lockfiles: Vec<LockfileReport>,
}

impl Report {
    /// Report for a range without lockfile changes.
    pub fn no_changes(tool: ToolInfo, context: ContextInfo, range: RangeInfo) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            tool,
            context,
            range,
            engine: None,
            status: ScanStatus::NoChanges,
            finding_count: 0,
            lockfiles: vec![],
        }
    }

    /// Report for an analyzed range. Lockfiles are sorted by path.
    pub fn analyzed(
        tool: ToolInfo,
        context: ContextInfo,
        range: RangeInfo,
        engine: EngineInfo,
        finding_count: usize,
        mut lockfiles: Vec<LockfileReport>,
    ) -> Self {
        sort_lockfile_reports(&mut lockfiles);
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            tool,
            context,
            range,
            engine: Some(engine),
            status: ScanStatus::Analyzed,
            finding_count,
            lockfiles,
        }
    }

    /// Total new or changed dependencies across all lockfiles.
    pub fn change_count(&self) -> usize {
        self.lockfiles.iter().map(|l| l.dependencies.len()).sum()
    }
}

/// Tool metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
}

/// CI facts worth keeping in the report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContextInfo {
    pub event: String,
    pub pr_number: Option<u64>,
    pub repository: Option<String>,
}

impl From<&CiContext> for ContextInfo {
    fn from(ctx: &CiContext) -> Self {
        Self {
            event: ctx.event.clone(),
            pr_number: ctx.pr_number,
            repository: ctx.repository.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    NoChanges,
    Analyzed,
}

/// One analyzed lockfile and its new or changed dependencies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LockfileReport {
    pub path: String,
    pub change: ChangeKind,
    pub previous_path: Option<String>,
    pub base: Option<Snapshot>,
    pub head: Snapshot,
    pub dependencies: Vec<DependencyChange>,
}

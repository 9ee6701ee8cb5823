use serde::{Deserialize, Serialize};

use crate::rules::catalog::{Permission, RuleId};
use crate::workspace::Side;

/// Package a finding is attributed to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    pub version: Option<String>,
}

/// A single engine finding, mapped back onto the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub rule_id: RuleId,
    pub side: Side,
    /// Repository-relative lockfile path (head path for renames).
    pub lockfile: String,
    /// `None` when the rule pack did not attribute the finding.
    pub dependency: Option<Dependency>,
    pub permission: Permission,
    pub line: Option<u32>,
    pub message: Option<String>,
}

/// Whether a dependency is new in the head or changed relative to base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyStatus {
    New,
    Changed,
}

impl DependencyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyStatus::New => "new",
            DependencyStatus::Changed => "changed",
        }
    }
}

/// Permission picture of one new or changed dependency in one lockfile.
///
/// All lists are sorted and free of duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyChange {
    /// `None` groups findings the rule pack did not attribute to a package.
    pub name: Option<String>,
    pub status: DependencyStatus,
    pub base_versions: Vec<String>,
    pub head_versions: Vec<String>,
    /// Permissions present at the head.
    pub permissions: Vec<Permission>,
    pub gained: Vec<Permission>,
    pub lost: Vec<Permission>,
    /// Rules that fired for this dependency at the head.
    pub rule_ids: Vec<RuleId>,
}

impl DependencyChange {
    pub const UNATTRIBUTED: &'static str = "(unattributed)";

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(Self::UNATTRIBUTED)
    }

    pub fn permissions_changed(&self) -> bool {
        !self.gained.is_empty() || !self.lost.is_empty()
    }
}

//! Base/head comparison of dependency permissions.
//!
//! Findings are grouped per dependency on each side of the range. A
//! dependency only seen at the head is `new`; one seen on both sides whose
//! versions or permissions differ is `changed`. Identical dependencies are
//! dropped, as are dependencies with findings only at the base: without
//! parsing the lockfile there is no way to tell a removed dependency from
//! one that lost all of its findings.

use std::collections::{BTreeMap, BTreeSet};

use crate::findings::model::{DependencyChange, DependencyStatus, Finding};
use crate::rules::catalog::{Permission, RuleId};
use crate::workspace::Side;

/// Grouping key. Unattributed findings sort after every named dependency.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum DepKey {
    Named(String),
    Unattributed,
}

impl DepKey {
    fn name(&self) -> Option<String> {
        match self {
            DepKey::Named(n) => Some(n.clone()),
            DepKey::Unattributed => None,
        }
    }
}

#[derive(Debug, Default)]
struct DepState {
    versions: BTreeSet<String>,
    permissions: BTreeSet<Permission>,
    rules: BTreeSet<RuleId>,
}

fn group(findings: &[Finding], lockfile: &str, side: Side) -> BTreeMap<DepKey, DepState> {
    let mut map: BTreeMap<DepKey, DepState> = BTreeMap::new();

    for f in findings
        .iter()
        .filter(|f| f.side == side && f.lockfile == lockfile)
    {
        let key = match &f.dependency {
            Some(dep) => DepKey::Named(dep.name.clone()),
            None => DepKey::Unattributed,
        };
        let state = map.entry(key).or_default();
        if let Some(version) = f.dependency.as_ref().and_then(|d| d.version.clone()) {
            state.versions.insert(version);
        }
        state.permissions.insert(f.permission.clone());
        state.rules.insert(f.rule_id.clone());
    }

    map
}

/// Compute the new and changed dependencies of one lockfile.
///
/// Output is ordered by dependency name, unattributed last.
pub fn compare_lockfile(findings: &[Finding], lockfile: &str) -> Vec<DependencyChange> {
    let base = group(findings, lockfile, Side::Base);
    let head = group(findings, lockfile, Side::Head);

    head.into_iter()
        .filter_map(|(key, head_state)| {
            let (status, base_versions, gained, lost) = match base.get(&key) {
                None => (
                    DependencyStatus::New,
                    Vec::new(),
                    head_state.permissions.iter().cloned().collect(),
                    Vec::new(),
                ),
                Some(base_state) => {
                    if base_state.versions == head_state.versions
                        && base_state.permissions == head_state.permissions
                    {
                        return None;
                    }
                    (
                        DependencyStatus::Changed,
                        base_state.versions.iter().cloned().collect(),
                        head_state
                            .permissions
                            .difference(&base_state.permissions)
                            .cloned()
                            .collect(),
                        base_state
                            .permissions
                            .difference(&head_state.permissions)
                            .cloned()
                            .collect(),
                    )
                }
            };

            Some(DependencyChange {
                name: key.name(),
                status,
                base_versions,
                head_versions: head_state.versions.into_iter().collect(),
                permissions: head_state.permissions.into_iter().collect(),
                gained,
                lost,
                rule_ids: head_state.rules.into_iter().collect(),
            })
        })
        .collect()
}

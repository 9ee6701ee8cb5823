//! Deterministic ordering helpers.
//!
//! Identical repository state must always produce byte-identical output, so
//! everything that reaches a report or a log summary goes through one of
//! these orderings first.

use crate::findings::Finding;
use crate::report::model::LockfileReport;

/// Sort lockfile reports by repository path.
pub fn sort_lockfile_reports(lockfiles: &mut [LockfileReport]) {
    lockfiles.sort_by(|a, b| a.path.cmp(&b.path));
}

/// Sort findings by `(lockfile, side, dependency, permission, rule, line)`.
///
/// The engine gives no ordering guarantee for its output lines.
pub fn sort_findings(findings: &mut [Finding]) {
    findings.sort_by(|a, b| {
        (
            a.lockfile.as_str(),
            a.side,
            &a.dependency,
            &a.permission,
            &a.rule_id,
            a.line,
        )
            .cmp(&(
                b.lockfile.as_str(),
                b.side,
                &b.dependency,
                &b.permission,
                &b.rule_id,
                b.line,
            ))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::findings::Dependency;
    use crate::git::ChangeKind;
    use crate::rules::catalog::{Permission, RuleId};
    use crate::workspace::{Side, Snapshot};

    fn finding(lockfile: &str, side: Side, dep: &str, perm: Permission, line: u32) -> Finding {
        Finding {
            rule_id: RuleId("r".into()),
            side,
            lockfile: lockfile.into(),
            dependency: Some(Dependency {
                name: dep.into(),
                version: None,
            }),
            permission: perm,
            line: Some(line),
            message: None,
        }
    }

    #[test]
    fn sort_findings_orders_by_lockfile_then_side_then_dependency() {
        let mut findings = vec![
            finding("yarn.lock", Side::Head, "b", Permission::Network, 1),
            finding("Cargo.lock", Side::Head, "z", Permission::Network, 9),
            finding("yarn.lock", Side::Base, "c", Permission::Network, 2),
            finding("yarn.lock", Side::Head, "a", Permission::Crypto, 3),
            finding("yarn.lock", Side::Head, "a", Permission::Network, 4),
        ];

        sort_findings(&mut findings);

        let ordered: Vec<(&str, Side, &str, Permission)> = findings
            .iter()
            .map(|f| {
                (
                    f.lockfile.as_str(),
                    f.side,
                    f.dependency.as_ref().unwrap().name.as_str(),
                    f.permission.clone(),
                )
            })
            .collect();

        assert_eq!(
            ordered,
            vec![
                ("Cargo.lock", Side::Head, "z", Permission::Network),
                ("yarn.lock", Side::Base, "c", Permission::Network),
                ("yarn.lock", Side::Head, "a", Permission::Network),
                ("yarn.lock", Side::Head, "a", Permission::Crypto),
                ("yarn.lock", Side::Head, "b", Permission::Network),
            ]
        );
    }

    #[test]
    fn sort_findings_is_deterministic_across_runs() {
        let make = || {
            vec![
                finding("yarn.lock", Side::Head, "b", Permission::Network, 1),
                finding("yarn.lock", Side::Head, "a", Permission::Network, 2),
            ]
        };
        let mut first = make();
        let mut second = make();
        second.reverse();

        sort_findings(&mut first);
        sort_findings(&mut second);

        assert_eq!(first, second);
    }

    #[test]
    fn sort_lockfile_reports_orders_by_path() {
        let report = |path: &str| LockfileReport {
            path: path.into(),
            change: ChangeKind::Added,
            previous_path: None,
            base: None,
            head: Snapshot::of(b""),
            dependencies: vec![],
        };
        let mut reports = vec![report("web/yarn.lock"), report("Cargo.lock"), report("api/Pipfile.lock")];

        sort_lockfile_reports(&mut reports);

        let paths: Vec<&str> = reports.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["Cargo.lock", "api/Pipfile.lock", "web/yarn.lock"]);
    }
}

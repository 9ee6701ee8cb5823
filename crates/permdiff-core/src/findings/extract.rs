use tracing::debug;

use crate::engine::EngineRecord;
use crate::error::{Error, Result};
use crate::findings::model::{Dependency, Finding};
use crate::rules::catalog::RuleId;
use crate::rules::classify::classify;
use crate::workspace::ScanWorkspace;

/// Map raw engine records onto the lockfiles in the scan workspace.
///
/// Every record must point at a materialized lockfile; a location outside
/// the workspace means the engine scanned something it was not given and
/// the whole run is rejected.
pub fn extract_findings(records: Vec<EngineRecord>, workspace: &ScanWorkspace) -> Result<Vec<Finding>> {
    let mut findings = Vec::with_capacity(records.len());

    for record in records {
        let (side, lockfile) = workspace
            .locate(&record.path)
            .ok_or_else(|| Error::UnknownLocation(record.path.clone()))?;

        let rule_id = RuleId(record.check_id);
        let metadata = record.extra.metadata;
        let permission = classify(&rule_id, metadata.permission.as_deref());

        let dependency = metadata.package.and_then(|p| {
            let name = p.name.trim().to_string();
            if name.is_empty() {
                return None;
            }
            Some(Dependency {
                name,
                version: p
                    .version
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty()),
            })
        });

        debug!(
            rule = %rule_id,
            side = ?side,
            lockfile = lockfile.path(),
            dependency = dependency.as_ref().map(|d| d.name.as_str()).unwrap_or("-"),
            permission = %permission,
            "finding"
        );

        findings.push(Finding {
            rule_id,
            side,
            lockfile: lockfile.path().to_string(),
            dependency,
            permission,
            line: record.start.map(|p| p.line),
            message: record.extra.message,
        });
    }

    Ok(findings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::parse_records;
    use crate::git::fixture::TestRepo;
    use crate::git::{changed_paths, resolve_range};
    use crate::rules::catalog::Permission;
    use crate::workspace::Side;

    fn workspace() -> (TestRepo, ScanWorkspace) {
        let repo = TestRepo::new();
        repo.commit(&[("web/yarn.lock", "old\n")], "base");
        repo.commit(&[("web/yarn.lock", "new\n")], "head");
        let range = resolve_range(&repo.repo, None, None).unwrap();
        let changes = changed_paths(&repo.repo, range.baseline, range.head).unwrap();
        let ws = ScanWorkspace::materialize(&repo.repo, &range, &changes).unwrap();
        (repo, ws)
    }

    #[test]
    fn records_map_to_sides_and_dependencies() {
        let (_repo, ws) = workspace();
        let records = parse_records(concat!(
            r#"{"check_id":"deps.net","path":"head/web/yarn.lock","start":{"line":3},"extra":{"metadata":{"package":{"name":" axios ","version":"1.6.0"},"permission":"network"}}}"#,
            "\n",
            r#"{"check_id":"deps.fs.write","path":"./base/web/yarn.lock","extra":{"metadata":{"package":{"name":"fs-extra","version":""}}}}"#,
            "\n",
        ))
        .unwrap();

        let findings = extract_findings(records, &ws).unwrap();
        assert_eq!(findings.len(), 2);

        assert_eq!(findings[0].side, Side::Head);
        assert_eq!(findings[0].lockfile, "web/yarn.lock");
        assert_eq!(
            findings[0].dependency,
            Some(Dependency {
                name: "axios".into(),
                version: Some("1.6.0".into())
            })
        );
        assert_eq!(findings[0].permission, Permission::Network);
        assert_eq!(findings[0].line, Some(3));

        assert_eq!(findings[1].side, Side::Base);
        assert_eq!(findings[1].permission, Permission::Filesystem);
        assert_eq!(findings[1].dependency.as_ref().unwrap().version, None);
    }

    #[test]
    fn blank_package_name_is_unattributed() {
        let (_repo, ws) = workspace();
        let records = parse_records(
            r#"{"check_id":"r","path":"head/web/yarn.lock","extra":{"metadata":{"package":{"name":"  "},"permission":"crypto"}}}"#,
        )
        .unwrap();

        let findings = extract_findings(records, &ws).unwrap();
        assert_eq!(findings[0].dependency, None);
        assert_eq!(findings[0].permission, Permission::Crypto);
    }

    #[test]
    fn location_outside_workspace_is_rejected() {
        let (_repo, ws) = workspace();
        let records = parse_records(r#"{"check_id":"r","path":"head/other/yarn.lock"}"#).unwrap();

        let err = extract_findings(records, &ws).unwrap_err();
        assert!(matches!(err, Error::UnknownLocation(ref p) if p == "head/other/yarn.lock"));
        assert_eq!(err.exit_code(), 3);
    }
}

use crate::TOOL_NAME;
use crate::findings::{DependencyChange, DependencyStatus};
use crate::report::model::{LockfileReport, Report, ScanStatus};
use crate::rules::catalog::Permission;

/// Summary emitted when the range touches no lockfile.
pub const NO_CHANGES_MESSAGE: &str = "No lockfile changes to analyze.";

/// Line emitted for an analyzed lockfile with nothing to report.
pub const NOTHING_NEW_MESSAGE: &str = "No new or changed dependency permissions.";

const MARKDOWN_TITLE: &str = "### Dependency permission changes";

/// Render the pull request comment body.
pub fn render_markdown(report: &Report) -> String {
    if report.status == ScanStatus::NoChanges {
        return format!("{}\n", NO_CHANGES_MESSAGE);
    }

    let mut out = String::new();
    out.push_str(MARKDOWN_TITLE);
    out.push_str("\n\n");
    out.push_str(&format!(
        "Compared `{}` with `{}` across {} lockfile{}; {} new or changed dependenc{}.\n",
        short(report.range.baseline.as_deref()),
        short(Some(&report.range.head)),
        report.lockfiles.len(),
        if report.lockfiles.len() == 1 { "" } else { "s" },
        report.change_count(),
        if report.change_count() == 1 { "y" } else { "ies" },
    ));

    for lockfile in &report.lockfiles {
        out.push('\n');
        out.push_str(&format!("#### `{}` ({})\n\n", lockfile.path, change_label(lockfile)));

        if lockfile.dependencies.is_empty() {
            out.push_str(NOTHING_NEW_MESSAGE);
            out.push('\n');
            continue;
        }

        out.push_str("| Dependency | Version | Permissions | Change |\n");
        out.push_str("| --- | --- | --- | --- |\n");
        for dep in &lockfile.dependencies {
            out.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                escape_cell(dep.display_name()),
                escape_cell(&version_label(dep)),
                escape_cell(&join_permissions(&dep.permissions)),
                escape_cell(&change_summary(dep)),
            ));
        }
    }

    out
}

/// Render a plain-text summary for terminals and logs.
pub fn render_text(report: &Report) -> String {
    if report.status == ScanStatus::NoChanges {
        return format!("{}\n", NO_CHANGES_MESSAGE);
    }

    let mut out = String::new();
    out.push_str(&format!("{} {}\n", TOOL_NAME, report.tool.version));
    out.push_str(&format!(
        "Range: {}..{}\n",
        short(report.range.baseline.as_deref()),
        short(Some(&report.range.head))
    ));
    out.push_str(&format!("Lockfiles analyzed: {}\n", report.lockfiles.len()));
    for lockfile in &report.lockfiles {
        out.push_str(&format!("{} ({})\n", lockfile.path, change_label(lockfile)));
        if lockfile.dependencies.is_empty() {
            out.push_str(&format!("  {}\n", NOTHING_NEW_MESSAGE));
            continue;
        }
        for dep in &lockfile.dependencies {
            out.push_str(&format!(
                "  - {} {} [{}] {}\n",
                dep.display_name(),
                version_label(dep),
                join_permissions(&dep.permissions),
                change_summary(dep)
            ));
        }
    }
    out
}

fn short(oid: Option<&str>) -> String {
    match oid {
        Some(oid) => oid.chars().take(8).collect(),
        None => "empty tree".to_string(),
    }
}

fn change_label(lockfile: &LockfileReport) -> String {
    match &lockfile.previous_path {
        Some(prev) => format!("{} from {}", lockfile.change.as_str(), prev),
        None => lockfile.change.as_str().to_string(),
    }
}

fn version_label(dep: &DependencyChange) -> String {
    let head = dep.head_versions.join(", ");
    let base = dep.base_versions.join(", ");
    match (base.is_empty(), head.is_empty()) {
        (_, true) if base.is_empty() => "-".to_string(),
        (true, _) => head,
        (false, _) if base == head => head,
        (false, true) => format!("{} -> -", base),
        (false, false) => format!("{} -> {}", base, head),
    }
}

fn join_permissions(perms: &[Permission]) -> String {
    if perms.is_empty() {
        return "-".to_string();
    }
    perms
        .iter()
        .map(Permission::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn change_summary(dep: &DependencyChange) -> String {
    match dep.status {
        DependencyStatus::New => DependencyStatus::New.as_str().to_string(),
        DependencyStatus::Changed if !dep.permissions_changed() => "version only".to_string(),
        DependencyStatus::Changed => {
            let delta: Vec<String> = dep
                .gained
                .iter()
                .map(|p| format!("+{}", p))
                .chain(dep.lost.iter().map(|p| format!("-{}", p)))
                .collect();
            format!("{}: {}", DependencyStatus::Changed.as_str(), delta.join(", "))
        }
    }
}

fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', " ")
}

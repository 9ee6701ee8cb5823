//! Permission classification for engine findings.
//!
//! The rule pack is expected to label each finding with a permission
//! category in its metadata. Packs that do not, encode the category in the
//! rule id instead (`deps.network.raw-socket`, `perm/fs/write`). This
//! module resolves both forms to a single [`Permission`].
//!
//! Resolution order:
//!
//!   1. explicit metadata label, when it names a known category
//!   2. first rule id segment that names a known category
//!   3. explicit metadata label kept verbatim as `Other`
//!   4. `Other("unclassified")`

use crate::rules::catalog::{Permission, RuleId};

/// Resolve the permission category of a single finding.
pub fn classify(rule_id: &RuleId, metadata_label: Option<&str>) -> Permission {
    if let Some(known) = metadata_label.and_then(Permission::known) {
        return known;
    }

    if let Some(from_id) = from_rule_id(rule_id) {
        return from_id;
    }

    match metadata_label {
        Some(label) => Permission::from(label.to_string()),
        None => Permission::Other(Permission::UNCLASSIFIED.to_string()),
    }
}

fn from_rule_id(rule_id: &RuleId) -> Option<Permission> {
    rule_id
        .as_str()
        .split(['.', '/', ':'])
        .find_map(Permission::known)
}

use serde::Deserialize;

use crate::error::{Error, Result};

/// One finding as emitted by the engine, one JSON object per line.
///
/// Only `check_id` and `path` are required. Everything under `extra` is
/// optional rule-pack metadata.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineRecord {
    #[serde(alias = "rule_id")]
    pub check_id: String,
    pub path: String,
    #[serde(default)]
    pub start: Option<Position>,
    #[serde(default)]
    pub extra: RecordExtra,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Position {
    pub line: u32,
    #[serde(default)]
    pub col: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RecordExtra {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub metadata: RecordMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RecordMetadata {
    #[serde(default, alias = "dependency")]
    pub package: Option<PackageRef>,
    #[serde(default, alias = "category")]
    pub permission: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PackageRef {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
}

/// Parse newline-delimited engine output.
///
/// Blank lines are skipped. Any line that is not a record object, or a
/// record with an empty rule id or path, fails the whole parse: partial
/// output from a broken engine must not turn into a partial summary.
pub fn parse_records(stdout: &str) -> Result<Vec<EngineRecord>> {
    let mut records = Vec::new();

    for (idx, raw) in stdout.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }

        let record: EngineRecord =
            serde_json::from_str(trimmed).map_err(|e| Error::MalformedOutput {
                line,
                reason: e.to_string(),
            })?;

        if record.check_id.trim().is_empty() {
            return Err(Error::MalformedOutput {
                line,
                reason: "empty rule identifier".to_string(),
            });
        }
        if record.path.trim().is_empty() {
            return Err(Error::MalformedOutput {
                line,
                reason: "empty file location".to_string(),
            });
        }

        records.push(record);
    }

    Ok(records)
}

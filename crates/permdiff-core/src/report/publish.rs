//! Handoff of the rendered summary to later workflow steps.
//!
//! GitHub Actions reads `NAME<<DELIM ... DELIM` blocks from the file named
//! by `GITHUB_ENV`. The file is shared by every step of the job, so it is
//! appended to and never truncated.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{Error, Result};

/// Variable carrying the pull request number, when known.
pub const PR_VAR: &str = "PERMDIFF_PR";

/// Delimiter for a multi-line env block, guaranteed absent from `body`.
pub fn heredoc_delimiter(body: &str) -> String {
    let digest = hex::encode(Sha256::digest(body.as_bytes()));
    let mut len = 16;
    loop {
        let candidate = format!("PERMDIFF_{}", &digest[..len]);
        if !body.contains(&candidate) {
            return candidate;
        }
        if len < digest.len() {
            len += 8;
        } else {
            // Only reachable if the body quotes its own full digest.
            let mut extended = candidate;
            while body.contains(&extended) {
                extended.push('_');
            }
            return extended;
        }
    }
}

fn validate_var_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "'{}' is not a valid environment variable name",
            name
        )))
    }
}

/// Append `body` as `var` (and the PR number, if any) to a GitHub env file.
pub fn write_github_env(path: &Path, var: &str, body: &str, pr_number: Option<u64>) -> Result<()> {
    validate_var_name(var)?;

    let delimiter = heredoc_delimiter(body);
    let mut block = format!("{}<<{}\n{}", var, delimiter, body);
    if !body.ends_with('\n') {
        block.push('\n');
    }
    block.push_str(&delimiter);
    block.push('\n');
    if let Some(pr) = pr_number {
        block.push_str(&format!("{}={}\n", PR_VAR, pr));
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::io(path, e))?;
    file.write_all(block.as_bytes())
        .map_err(|e| Error::io(path, e))?;

    debug!(path = %path.display(), var, bytes = block.len(), "wrote GitHub env block");
    Ok(())
}

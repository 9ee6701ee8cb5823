use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of an engine rule, passed through verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct RuleId(pub String);

impl RuleId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Coarse permission category attached to a dependency's behavior.
///
/// Variant order is the rendering order. `Other` carries labels the rule
/// pack uses that are not one of the four known categories.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Permission {
    Network,
    Filesystem,
    CodeExecution,
    Crypto,
    Other(String),
}

impl Permission {
    /// Label used when neither metadata nor rule id names a category.
    pub const UNCLASSIFIED: &'static str = "unclassified";

    /// Recognise a known category by name or common synonym.
    ///
    /// Returns `None` for anything else; callers decide whether to fall
    /// back to [`Permission::Other`].
    pub fn known(label: &str) -> Option<Self> {
        let normalized = label.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "network" | "net" | "http" | "socket" => Some(Permission::Network),
            "filesystem" | "fs" | "file" | "file-system" => Some(Permission::Filesystem),
            "code-execution" | "exec" | "execution" | "process" | "shell" | "eval" => {
                Some(Permission::CodeExecution)
            }
            "crypto" | "cryptography" => Some(Permission::Crypto),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Permission::Network => "network",
            Permission::Filesystem => "filesystem",
            Permission::CodeExecution => "code-execution",
            Permission::Crypto => "crypto",
            Permission::Other(label) => label,
        }
    }
}

impl From<String> for Permission {
    fn from(label: String) -> Self {
        Permission::known(&label).unwrap_or_else(|| {
            let trimmed = label.trim();
            if trimmed.is_empty() {
                Permission::Other(Permission::UNCLASSIFIED.to_string())
            } else {
                Permission::Other(trimmed.to_ascii_lowercase())
            }
        })
    }
}

impl From<Permission> for String {
    fn from(permission: Permission) -> Self {
        permission.as_str().to_string()
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

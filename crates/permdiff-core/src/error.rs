use std::path::PathBuf;

use thiserror::Error;

/// Everything that can stop a permdiff run.
///
/// Every variant is fatal. The CLI turns them into process exit codes via
/// [`Error::exit_code`], so a CI job fails when the engine could not run,
/// never because permissions were flagged.
#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("unsupported CI event '{event}'; supported events are: {supported}")]
    UnsupportedEvent { event: String, supported: String },

    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    #[error("could not resolve '{0}' (also tried 'origin/{0}') to a commit")]
    UnknownRef(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("analysis engine '{program}' could not be started: {source}")]
    EngineNotFound {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("analysis engine '{program}' failed ({status}): {stderr}")]
    EngineFailed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("malformed engine output on line {line}: {reason}")]
    MalformedOutput { line: usize, reason: String },

    #[error("engine reported a finding outside the scanned lockfiles: {0}")]
    UnknownLocation(String),
}

impl Error {
    /// Process exit code for this error.
    ///
    /// - configuration / usage → 2
    /// - engine missing, failed, or malformed output → 3
    /// - git → 4
    /// - anything else → 1
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_) | Error::UnsupportedEvent { .. } => 2,
            Error::EngineNotFound { .. }
            | Error::EngineFailed { .. }
            | Error::MalformedOutput { .. }
            | Error::UnknownLocation(_) => 3,
            Error::Git(_) | Error::UnknownRef(_) => 4,
            Error::Io { .. } => 1,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

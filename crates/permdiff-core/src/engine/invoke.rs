use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{Error, Result};

/// Lines of engine stderr kept in a failure message.
const STDERR_TAIL_LINES: usize = 20;

/// Engine details recorded in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineInfo {
    pub program: String,
    pub version: Option<String>,
    pub rules: String,
}

/// Handle on the external static-analysis engine.
#[derive(Debug, Clone)]
pub struct Engine {
    program: PathBuf,
    args: Vec<String>,
    version_args: Vec<String>,
    ok_exit_codes: Vec<i32>,
    rules: String,
}

impl Engine {
    /// Build an engine handle, resolving relative program and rule pack
    /// paths against the repository root.
    pub fn from_config(config: &EngineConfig, repo_root: &Path) -> Self {
        let rules = config.resolved_rules(repo_root);
        Self {
            program: config.resolved_program(repo_root),
            args: config.rendered_args(&rules),
            version_args: config.version_args.clone(),
            ok_exit_codes: config.ok_exit_codes.clone(),
            rules,
        }
    }

    pub fn program_name(&self) -> String {
        self.program.display().to_string()
    }

    pub fn rules(&self) -> &str {
        &self.rules
    }

    pub fn info(&self, version: Option<String>) -> EngineInfo {
        EngineInfo {
            program: self.program_name(),
            version,
            rules: self.rules.clone(),
        }
    }

    /// Ask the engine for its version.
    ///
    /// A missing executable is fatal. A probe that runs but fails only
    /// loses the version line.
    pub fn probe_version(&self) -> Result<Option<String>> {
        if self.version_args.is_empty() {
            return Ok(None);
        }

        let output = self.spawn(&self.version_args, None)?;
        if !output.status.success() {
            warn!(
                program = %self.program_name(),
                status = %output.status,
                "engine version probe failed"
            );
            return Ok(None);
        }

        let version = String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(str::to_string);

        info!(
            program = %self.program_name(),
            version = version.as_deref().unwrap_or("unknown"),
            "engine available"
        );
        Ok(version)
    }

    /// Run the engine over `targets` with `cwd` as working directory and
    /// return its stdout.
    pub fn run(&self, cwd: &Path, targets: &[String]) -> Result<String> {
        let mut args = self.args.clone();
        args.extend(targets.iter().cloned());

        info!(
            program = %self.program_name(),
            rules = %self.rules,
            targets = targets.len(),
            "running analysis engine"
        );
        debug!(cwd = %cwd.display(), args = ?args, "engine command line");

        let output = self.spawn(&args, Some(cwd))?;
        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stderr.lines() {
            debug!(target: "permdiff::engine", "{}", line);
        }

        let accepted = output
            .status
            .code()
            .is_some_and(|code| self.ok_exit_codes.contains(&code));

        if !accepted {
            return Err(Error::EngineFailed {
                program: self.program_name(),
                status: output.status.to_string(),
                stderr: stderr_tail(&stderr),
            });
        }

        String::from_utf8(output.stdout).map_err(|e| {
            let valid = e.utf8_error().valid_up_to();
            let line = e.as_bytes()[..valid].iter().filter(|&&b| b == b'\n').count() + 1;
            Error::MalformedOutput {
                line,
                reason: format!("stdout is not UTF-8: {}", e.utf8_error()),
            }
        })
    }

    fn spawn(&self, args: &[String], cwd: Option<&Path>) -> Result<Output> {
        let mut command = Command::new(&self.program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = cwd {
            command.current_dir(cwd);
        }

        command.output().map_err(|source| Error::EngineNotFound {
            program: self.program_name(),
            source,
        })
    }
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    let tail = lines[start..].join("\n");
    if tail.is_empty() {
        "no stderr output".to_string()
    } else {
        tail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh_engine(script: &str, ok_exit_codes: Vec<i32>) -> Engine {
        Engine {
            program: PathBuf::from("/bin/sh"),
            args: vec!["-c".into(), script.into(), "engine".into()],
            version_args: vec!["-c".into(), "echo fake-engine 1.2.3".into()],
            ok_exit_codes,
            rules: "rules.yml".into(),
        }
    }

    #[test]
    fn from_config_substitutes_rules() {
        let engine = Engine::from_config(&EngineConfig::default(), Path::new("/nonexistent"));
        assert_eq!(engine.rules(), "p/dependency-permissions");
        assert_eq!(
            engine.args,
            vec!["--config", "p/dependency-permissions", "--jsonl"]
        );
        assert_eq!(engine.program_name(), "semgrep");
    }

    #[cfg(unix)]
    #[test]
    fn captures_stdout_and_passes_targets() {
        let engine = sh_engine("for t in \"$@\"; do echo \"$t\"; done", vec![0]);
        let cwd = tempfile::TempDir::new().unwrap();

        let out = engine
            .run(cwd.path(), &["base/yarn.lock".into(), "head/yarn.lock".into()])
            .unwrap();

        assert_eq!(out, "base/yarn.lock\nhead/yarn.lock\n");
    }

    #[cfg(unix)]
    #[test]
    fn runs_inside_the_given_directory() {
        let engine = sh_engine("pwd -P", vec![0]);
        let cwd = tempfile::TempDir::new().unwrap();

        let out = engine.run(cwd.path(), &[]).unwrap();
        assert_eq!(
            out.trim(),
            cwd.path().canonicalize().unwrap().display().to_string()
        );
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_engine_failure_with_stderr() {
        let engine = sh_engine("echo 'rule pack not found' >&2; exit 7", vec![0]);
        let cwd = tempfile::TempDir::new().unwrap();

        let err = engine.run(cwd.path(), &[]).unwrap_err();
        match err {
            Error::EngineFailed { status, stderr, .. } => {
                assert!(status.contains('7'));
                assert_eq!(stderr, "rule pack not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn configured_ok_codes_are_accepted() {
        let engine = sh_engine("echo '{}'; exit 1", vec![0, 1]);
        let cwd = tempfile::TempDir::new().unwrap();
        assert_eq!(engine.run(cwd.path(), &[]).unwrap(), "{}\n");
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_stdout_reports_offending_line() {
        let engine = sh_engine("printf 'ok\\n\\377\\n'", vec![0]);
        let cwd = tempfile::TempDir::new().unwrap();

        let err = engine.run(cwd.path(), &[]).unwrap_err();
        assert!(matches!(err, Error::MalformedOutput { line: 2, .. }));
    }

    #[test]
    fn missing_program_is_engine_not_found() {
        let engine = Engine {
            program: PathBuf::from("/nonexistent/permdiff-engine"),
            ..sh_engine("true", vec![0])
        };

        let err = engine.probe_version().unwrap_err();
        assert!(matches!(err, Error::EngineNotFound { .. }));
        assert_eq!(err.exit_code(), 3);
    }

    #[cfg(unix)]
    #[test]
    fn version_probe_takes_first_line() {
        let engine = sh_engine("true", vec![0]);
        assert_eq!(
            engine.probe_version().unwrap().as_deref(),
            Some("fake-engine 1.2.3")
        );
    }

    #[cfg(unix)]
    #[test]
    fn failed_version_probe_is_not_fatal() {
        let engine = Engine {
            version_args: vec!["-c".into(), "exit 2".into()],
            ..sh_engine("true", vec![0])
        };
        assert_eq!(engine.probe_version().unwrap(), None);
    }

    #[test]
    fn stderr_tail_keeps_last_lines() {
        let long: String = (0..30).map(|i| format!("line {i}\n")).collect();
        let tail = stderr_tail(&long);
        assert!(tail.starts_with("line 10"));
        assert!(tail.ends_with("line 29"));
        assert_eq!(stderr_tail("  \n"), "no stderr output");
    }
}

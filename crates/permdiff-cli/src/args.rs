use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "permdiff",
    version,
    about = "Summarize permission changes of dependencies added or updated in a pull request"
)]
pub struct Args {
    /// Repository checkout to analyze
    #[arg(long, default_value = ".")]
    pub repo: PathBuf,

    /// Base of the commit range (branch, tag or commit)
    #[arg(long, env = "BASELINE_REF")]
    pub base_ref: Option<String>,

    /// Head of the commit range [default: HEAD]
    #[arg(long, env = "HEAD_REF")]
    pub head_ref: Option<String>,

    /// Pull request number handed on to the comment step
    #[arg(long = "pr", env = "PR_NUMBER")]
    pub pr_number: Option<String>,

    /// TOML configuration file [default: <repo>/.permdiff.toml]
    #[arg(long, env = "PERMDIFF_CONFIG")]
    pub config: Option<PathBuf>,

    /// Analysis engine program
    #[arg(long, env = "PERMDIFF_ENGINE")]
    pub engine: Option<String>,

    /// Rule pack passed to the engine
    #[arg(long, env = "PERMDIFF_RULES")]
    pub rules: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value = "markdown")]
    pub format: OutputFormat,

    /// Write output to a file instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Also append the summary to the file named by GITHUB_ENV
    #[arg(long)]
    pub github_env: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Markdown,
    Text,
    Json,
}

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use permdiff_core::ci::{CiContext, parse_pr_number};
use permdiff_core::config::ScanConfig;
use permdiff_core::report::{Report, ToolInfo, publish, render};
use permdiff_core::{ScanRequest, TOOL_NAME, git, scan};

mod args;

use args::{Args, OutputFormat};

fn main() {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(args) {
        eprintln!("Error: {:#}", e);
        let exit_code = e
            .chain()
            .find_map(|cause| cause.downcast_ref::<permdiff_core::Error>())
            .map(permdiff_core::Error::exit_code)
            .unwrap_or(1);
        std::process::exit(exit_code);
    }
}

fn run(args: Args) -> Result<()> {
    let vars: BTreeMap<String, String> = std::env::vars().collect();
    let mut context = CiContext::detect(&vars).context("failed to read CI environment")?;

    if let Some(base) = args.base_ref.clone() {
        context.base_ref = Some(base);
    }
    if let Some(head) = args.head_ref.clone() {
        context.head_ref = Some(head);
    }
    if let Some(raw) = args.pr_number.as_deref() {
        context.pr_number = Some(parse_pr_number(raw)?);
    }

    let repo_root = git::repo_root(&args.repo)?;
    let mut config = ScanConfig::load(args.config.as_deref(), &repo_root)?;
    if let Some(engine) = args.engine.clone() {
        config.engine.program = engine;
    }
    if let Some(rules) = args.rules.clone() {
        config.engine.rules = rules;
    }

    let env_file = if args.github_env {
        let path = context.env_file.clone().ok_or_else(|| {
            permdiff_core::Error::Config("--github-env was given but GITHUB_ENV is not set".into())
        })?;
        Some(path)
    } else {
        None
    };

    info!(
        event = %context.event,
        base = context.base_ref.as_deref().unwrap_or("<parent>"),
        head = context.head_ref.as_deref().unwrap_or("HEAD"),
        "starting scan"
    );

    let request = ScanRequest {
        repo: args.repo.clone(),
        config,
        context,
        tool: ToolInfo {
            name: TOOL_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
    };
    let report = scan(&request)?;

    let output = render_report(&report, args.format)?;

    if let Some(path) = &args.out {
        std::fs::write(path, &output)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    if let Some(env_file) = &env_file {
        publish::write_github_env(
            env_file,
            &request.config.output.env_var,
            &output,
            request.context.pr_number,
        )?;
    }

    if args.out.is_none() {
        print!("{output}");
    }

    Ok(())
}

fn render_report(report: &Report, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Markdown => render::render_markdown(report),
        OutputFormat::Text => render::render_text(report),
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(report)?;
            json.push('\n');
            json
        }
    })
}

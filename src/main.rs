//! gh-label-sync CLI
//!
//! Command line tool for copying custom labels between GitHub repositories

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Local;
use clap::Parser;

use gh_label_sync::{
    config::load_file_config, runlog, runner, Credentials, LabelSyncer, Result, SyncConfig,
};

/// Environment variables consulted for the source token, in order
const SOURCE_TOKEN_VARS: &[&str] = &["SOURCE_GITHUB_TOKEN", "GITHUB_TOKEN", "TOKEN"];

/// Environment variables consulted for the destination token, in order
const DESTINATION_TOKEN_VARS: &[&str] = &["DEST_GITHUB_TOKEN", "GITHUB_TOKEN", "TOKEN"];

/// gh-label-sync CLI
///
/// Copies custom issue labels from source to destination repositories
#[derive(Parser, Debug)]
#[command(
    name = "gh-label-sync",
    version,
    about = "Copy custom issue labels between GitHub repositories",
    long_about = "Reads a list of 'source_owner/repo::dest_owner/repo' pairs and copies every \
    non-default label of each source repository to its destination, creating missing labels \
    and updating existing ones."
)]
struct Cli {
    /// File listing repository pairs, one 'source::destination' per line
    #[arg(short = 'r', long = "repo_file", alias = "repo-file", value_name = "PATH")]
    repo_file: PathBuf,

    /// Folder the run log is written to
    #[arg(
        short = 'o',
        long = "output_folder",
        alias = "output-folder",
        default_value = "./output",
        value_name = "DIR"
    )]
    output_folder: PathBuf,

    /// Settings file path (JSON/YAML)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Token used to read source labels
    #[arg(long)]
    source_token: Option<String>,

    /// Token used to check and write destination labels
    #[arg(long)]
    destination_token: Option<String>,

    /// GitHub REST API base URL
    #[arg(long)]
    api_url: Option<String>,

    /// HTTP timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Number of repository pairs synchronized at the same time
    #[arg(long)]
    concurrency: Option<usize>,

    /// Additional label name to skip (repeatable)
    #[arg(long = "exclude", value_name = "LABEL")]
    exclude: Vec<String>,

    /// Dry run mode (check destination labels but don't write)
    #[arg(long)]
    dry_run: bool,

    /// Exit with status 1 if any pair, label or input line failed
    #[arg(long)]
    strict: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_file = runlog::log_file_path(&cli.output_folder, &cli.repo_file, Local::now());
    runlog::init(&log_file)
        .with_context(|| format!("Failed to set up log file {}", log_file.display()))?;

    runlog::info(format!(
        "... Input details file path = {}",
        cli.repo_file.display()
    ));

    let config = build_config(&cli).context("Invalid configuration")?;
    warn_missing_credentials(&config.credentials);
    tracing::info!(
        "Excluded label names: {}",
        config.default_labels.iter().collect::<Vec<_>>().join(", ")
    );
    if config.dry_run {
        runlog::warning("...Dry-run mode: destination labels will not be modified");
    }

    let syncer = LabelSyncer::new(config).context("Failed to initialize label sync")?;
    let summary = runner::run(Arc::new(syncer), &cli.repo_file).await;

    runlog::info("********* Custom Label Migration Completed... *********");

    if cli.strict && summary.has_failures() {
        std::process::exit(1);
    }

    Ok(())
}

/// Build the run configuration: defaults, then settings file, then flags
fn build_config(cli: &Cli) -> Result<SyncConfig> {
    let credentials = Credentials::new(
        resolve_token(cli.source_token.clone(), SOURCE_TOKEN_VARS),
        resolve_token(cli.destination_token.clone(), DESTINATION_TOKEN_VARS),
    );

    let mut config = SyncConfig::new(credentials);

    if let Some(path) = &cli.config {
        config.apply_file(&load_file_config(path)?)?;
    }

    if let Some(api_url) = &cli.api_url {
        config.set_api_url(api_url)?;
    }
    if let Some(secs) = cli.timeout {
        config.timeout = Duration::from_secs(secs);
    }
    if let Some(concurrency) = cli.concurrency {
        config.concurrency = concurrency;
    }
    config.default_labels.extend(&cli.exclude);
    config.dry_run = cli.dry_run;

    config.validate()?;
    Ok(config)
}

/// Get an access token from the flag, falling back to environment variables
fn resolve_token(arg_token: Option<String>, env_vars: &[&str]) -> Option<String> {
    arg_token.or_else(|| {
        env_vars.iter().find_map(|name| {
            std::env::var(name)
                .ok()
                .filter(|value| !value.trim().is_empty())
        })
    })
}

fn warn_missing_credentials(credentials: &Credentials) {
    if credentials.source.is_none() {
        runlog::warning(format!(
            "...No source token set (--source-token or {}); reading labels unauthenticated",
            SOURCE_TOKEN_VARS.join("/")
        ));
    }
    if credentials.destination.is_none() {
        runlog::warning(format!(
            "...No destination token set (--destination-token or {}); writes will likely fail",
            DESTINATION_TOKEN_VARS.join("/")
        ));
    }
}

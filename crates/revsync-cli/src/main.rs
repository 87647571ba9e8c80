mod logging;
mod opts;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::Parser;
use revsync_updater::{UpdateOutcome, Updater};
use tracing::{error, info, warn};

use logging::setup_logging;
use opts::Cli;

const DEFAULT_CONFIG_ENV: &str = "config.env";

fn main() -> ExitCode {
    let cli = Cli::parse();
    let cli = match load_config_env(cli.config_env.as_deref()) {
        Ok(true) => Cli::parse(),
        Ok(false) => cli,
        Err(err) => {
            eprintln!("revsync: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    let log_file = match setup_logging(cli.log_level, cli.log_dir.as_deref(), cli.log_json) {
        Ok(path) => path,
        Err(err) => {
            eprintln!("revsync: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            error!("start async runtime: {err}");
            return ExitCode::FAILURE;
        }
    };
    match runtime.block_on(run(&cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            if let Some(path) = log_file {
                eprintln!("revsync: {err:#} (log: {})", path.display());
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let config = cli.updater_config()?;
    let updater = Updater::from_config(&config)?;

    if cli.dry_run {
        return dry_run(&updater).await;
    }

    match updater.run().await? {
        UpdateOutcome::NoChanges => info!("OneCRL already holds every entry the CCADB reports"),
        UpdateOutcome::InReview { notified } => {
            info!(tickets = ?notified, "staging is in review; reminded the pending tickets")
        }
        UpdateOutcome::Updated { ticket_url } => {
            info!(ticket = %ticket_url, "OneCRL update filed");
            println!("{ticket_url}");
        }
    }
    Ok(())
}

async fn dry_run(updater: &Updater) -> Result<()> {
    if updater.staging_in_review().await? {
        warn!("staging is in review; a real run would only remind the pending tickets");
    }
    let diffs = updater.find_diffs().await?;
    info!(count = diffs.len(), "entries missing from OneCRL");
    println!("{}", serde_json::to_string_pretty(&diffs)?);
    Ok(())
}

/// Runs before the async runtime starts, while the process is still single
/// threaded. Loads the env file into the process environment without overriding
/// variables that are already set. Returns whether a file was loaded.
///
/// An explicitly named file must exist; the default `config.env` next to
/// the executable is optional.
fn load_config_env(explicit: Option<&Path>) -> Result<bool> {
    let path = match explicit {
        Some(path) => {
            if !path.is_file() {
                bail!("config env file {} not found", path.display());
            }
            path.to_path_buf()
        }
        None => match default_config_env() {
            Some(path) if path.is_file() => path,
            _ => return Ok(false),
        },
    };

    for item in dotenvy::from_path_iter(&path)
        .with_context(|| format!("load {}", path.display()))?
    {
        let (key, val) = item.with_context(|| format!("parse {}", path.display()))?;
        if std::env::var_os(&key).is_none() {
            unsafe {
                std::env::set_var(&key, &val);
            }
        }
    }
    Ok(true)
}

fn default_config_env() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    Some(exe.parent()?.join(DEFAULT_CONFIG_ENV))
}

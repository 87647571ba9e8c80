use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow};
use chrono::{SecondsFormat, Utc};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::opts::LogLevel;

/// Install the global subscriber. Returns the log file when one was opened.
pub fn setup_logging(level: LogLevel, dir: Option<&Path>, json: bool) -> Result<Option<PathBuf>> {
    let (writer, path) = match dir {
        Some(dir) => {
            let path = log_file_path(dir);
            fs::create_dir_all(dir)
                .with_context(|| format!("create log directory {}", dir.display()))?;
            let file = File::create(&path)
                .with_context(|| format!("create log file {}", path.display()))?;
            (BoxMakeWriter::new(Mutex::new(file)), Some(path))
        }
        None => (BoxMakeWriter::new(std::io::stderr), None),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level.as_str()))
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .with_ansi(path.is_none())
        .with_writer(writer);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|err| anyhow!("install log subscriber: {err}"))?;
    Ok(path)
}

fn log_file_path(dir: &Path) -> PathBuf {
    let stamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    dir.join(format!("{stamp}.log"))
}

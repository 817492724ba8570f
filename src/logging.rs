//! tracing-subscriber setup. The TUI owns the terminal, so it logs to a
//! file; CLI commands log to stderr.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Overrides the configured filter when set, e.g. `SLEEPLOG_LOG=debug`
pub const LOG_ENV_VAR: &str = "SLEEPLOG_LOG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

#[derive(Debug, Error)]
pub enum LogError {
    #[error("Failed to open log file {path}: {source}")]
    OpenFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to install log subscriber: {0}")]
    Install(String),
}

fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(default_filter))
}

/// Install the global subscriber. Calling it twice is an error.
pub fn init(default_filter: &str, target: LogTarget) -> Result<(), LogError> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_filter))
        .with_target(false);

    let result = match target {
        LogTarget::Stderr => builder.with_writer(std::io::stderr).try_init(),
        LogTarget::File(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|source| LogError::OpenFile {
                    path: path.clone(),
                    source,
                })?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|source| LogError::OpenFile {
                    path: path.clone(),
                    source,
                })?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
    };

    result.map_err(|e| LogError::Install(e.to_string()))
}

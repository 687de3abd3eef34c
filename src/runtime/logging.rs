use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::{LogSettings, default_log_path};

/// Environment variable that overrides `log.level`.
const LOG_ENV: &str = "SPINDLE_LOG";

/// Send `tracing` output to the log file; the terminal belongs to the TUI.
///
/// Returns the file in use, or `None` when logging could not be set up.
pub fn init(settings: &LogSettings) -> Option<PathBuf> {
    let path = settings.file.clone().or_else(default_log_path)?;

    if let Some(dir) = path.parent() {
        if let Err(e) = fs::create_dir_all(dir) {
            eprintln!("spindle: cannot create log directory {}: {e}", dir.display());
            return None;
        }
    }
    let file = match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("spindle: cannot open log file {}: {e}", path.display());
            return None;
        }
    };

    let env = std::env::var(LOG_ENV).ok();
    let result = tracing_subscriber::fmt()
        .with_env_filter(build_filter(env.as_deref(), &settings.level))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_thread_names(true)
        .try_init();
    if result.is_err() {
        return None;
    }
    Some(path)
}

/// `env` wins over `level`; anything unparsable falls back to `info`.
pub(super) fn build_filter(env: Option<&str>, level: &str) -> EnvFilter {
    env.and_then(|e| EnvFilter::try_new(e).ok())
        .or_else(|| EnvFilter::try_new(level).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

//! Log setup.
//!
//! The terminal belongs to the editor, so logs go to `log.txt` in the
//! configuration directory. Logging is off unless `--debug` is given or
//! `SCRIBE_LOG` holds a filter directive.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::{fmt, EnvFilter};

use scribe_core::ConfigDir;

/// Environment variable holding a tracing filter directive.
pub const LOG_ENV: &str = "SCRIBE_LOG";

/// Installs the global subscriber. Returns the log file when logging is on.
pub fn init(debug: bool, config: &ConfigDir) -> Option<PathBuf> {
    let filter = match EnvFilter::try_from_env(LOG_ENV) {
        Ok(filter) => filter,
        Err(_) if debug => EnvFilter::new("debug"),
        Err(_) => return None,
    };

    let path = config.log_file();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok()?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path).ok()?;

    fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .ok()?;
    Some(path)
}

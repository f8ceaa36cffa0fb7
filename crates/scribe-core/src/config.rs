//! Configuration directory resolution.
//!
//! # Storage Structure
//!
//! ```text
//! <config dir>/
//! ├── settings.json     # option overrides
//! ├── bindings.json     # key binding overrides
//! ├── colorschemes/     # <name>.json colorschemes
//! ├── plug/             # plugins, one directory each
//! ├── backups/          # crash and autosave backups
//! └── log.txt           # debug log (only with --debug or SCRIBE_LOG)
//! ```
//!
//! # Resolution Order
//!
//! 1. `--config-dir` flag (tilde expanded)
//! 2. `SCRIBE_CONFIG_HOME` environment variable
//! 3. `<platform config dir>/scribe`
//! 4. `.scribe` in the current directory

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};

/// Environment variable for a custom configuration directory.
pub const CONFIG_HOME_ENV: &str = "SCRIBE_CONFIG_HOME";

/// Directory name under the platform config directory.
const APP_DIR: &str = "scribe";

/// Fallback directory name when no platform config directory exists.
const FALLBACK_DIR: &str = ".scribe";

const SETTINGS_FILE: &str = "settings.json";
const BINDINGS_FILE: &str = "bindings.json";
const COLORSCHEMES_SUBDIR: &str = "colorschemes";
const PLUGINS_SUBDIR: &str = "plug";
const BACKUPS_SUBDIR: &str = "backups";
const LOG_FILE: &str = "log.txt";

/// The resolved configuration directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDir {
    root: PathBuf,
}

impl ConfigDir {
    /// Wraps an already-resolved directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves the configuration directory.
    ///
    /// An explicitly requested directory that does not exist is reported and
    /// the default location is used instead.
    pub fn resolve(flag: Option<&str>) -> (Self, Option<CoreError>) {
        if let Some(flag) = flag.filter(|f| !f.is_empty()) {
            let path = PathBuf::from(shellexpand::tilde(flag).into_owned());
            if path.is_dir() {
                return (Self::new(path), None);
            }
            return (Self::default_location(), Some(CoreError::InvalidConfigDir(path)));
        }
        (Self::default_location(), None)
    }

    /// Returns the default directory, ignoring any flag.
    pub fn default_location() -> Self {
        if let Some(env) = std::env::var_os(CONFIG_HOME_ENV).filter(|v| !v.is_empty()) {
            return Self::new(PathBuf::from(env));
        }
        let root = dirs::config_dir()
            .map(|d| d.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from(FALLBACK_DIR));
        Self::new(root)
    }

    /// Creates the directory if it does not exist.
    pub fn ensure(&self) -> Result<()> {
        if self.root.is_dir() {
            return Ok(());
        }
        fs::create_dir_all(&self.root).map_err(|source| CoreError::Write {
            path: self.root.clone(),
            source,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings_file(&self) -> PathBuf {
        self.root.join(SETTINGS_FILE)
    }

    pub fn bindings_file(&self) -> PathBuf {
        self.root.join(BINDINGS_FILE)
    }

    pub fn colorschemes_dir(&self) -> PathBuf {
        self.root.join(COLORSCHEMES_SUBDIR)
    }

    pub fn plugins_dir(&self) -> PathBuf {
        self.root.join(PLUGINS_SUBDIR)
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.root.join(BACKUPS_SUBDIR)
    }

    pub fn log_file(&self) -> PathBuf {
        self.root.join(LOG_FILE)
    }
}

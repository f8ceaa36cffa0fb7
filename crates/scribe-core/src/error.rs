//! Error types for the core crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by editor collaborators.
///
/// Every variant is recoverable from the runtime's point of view: callers warn
/// and continue with whatever state they already have.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Reading a file or directory failed.
    #[error("error reading {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Writing a file or directory failed.
    #[error("error writing {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A path that must be a regular file is a directory.
    #[error("{0} is a directory")]
    IsDirectory(PathBuf),

    /// The buffer has no file to save to.
    #[error("no file name to save to")]
    NoFileName,

    /// An explicitly requested configuration directory is unusable.
    #[error("invalid config-dir specified: {0}")]
    InvalidConfigDir(PathBuf),

    /// A JSON configuration file could not be parsed.
    #[error("error parsing {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Option name not present in the defaults table.
    #[error("unknown option '{0}'")]
    UnknownOption(String),

    /// Value cannot be converted to the option's native type.
    #[error("invalid value '{value}' for option '{option}'")]
    InvalidValue { option: String, value: String },

    /// The configured colorscheme does not exist or is malformed.
    #[error("colorscheme '{name}': {reason}")]
    Colorscheme { name: String, reason: String },

    /// A plugin could not be loaded.
    #[error("plugin '{plugin}': {reason}")]
    Plugin { plugin: String, reason: String },

    /// An extension hook failed.
    #[error("hook '{hook}' failed in plugin '{plugin}': {reason}")]
    Hook {
        hook: String,
        plugin: String,
        reason: String,
    },

    /// Clipboard backend could not be initialized.
    #[error("clipboard: {0}")]
    Clipboard(String),

    /// A key binding entry is invalid.
    #[error("invalid binding '{key}': {reason}")]
    Binding { key: String, reason: String },

    /// A command line entered at the prompt is invalid.
    #[error("{0}")]
    Command(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

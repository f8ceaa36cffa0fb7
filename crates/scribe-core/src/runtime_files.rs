//! Registration of runtime files found in the configuration directory.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::ConfigDir;
use crate::error::{CoreError, Result};

/// Runtime assets available to this session, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct RuntimeFiles {
    colorschemes: BTreeMap<String, PathBuf>,
    plugins: BTreeMap<String, PathBuf>,
}

impl RuntimeFiles {
    /// Scans the configuration directory.
    ///
    /// Missing subdirectories are fine; any other I/O failure is returned
    /// together with whatever was registered before it.
    pub fn discover(config: &ConfigDir) -> (Self, Option<CoreError>) {
        let mut files = Self::default();
        let mut err = None;

        match scan(&config.colorschemes_dir(), |p| {
            p.is_file() && p.extension().is_some_and(|e| e == "json")
        }) {
            Ok(found) => files.colorschemes = found,
            Err(e) => err = Some(e),
        }
        match scan(&config.plugins_dir(), |p| p.is_dir()) {
            Ok(found) => files.plugins = found,
            Err(e) => {
                err.get_or_insert(e);
            }
        }

        debug!(
            colorschemes = files.colorschemes.len(),
            plugins = files.plugins.len(),
            "registered runtime files"
        );
        (files, err)
    }

    pub fn colorscheme(&self, name: &str) -> Option<&Path> {
        self.colorschemes.get(name).map(PathBuf::as_path)
    }

    pub fn colorscheme_names(&self) -> impl Iterator<Item = &str> {
        self.colorschemes.keys().map(String::as_str)
    }

    /// Plugin directories in name order.
    pub fn plugins(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.plugins.iter().map(|(k, v)| (k.as_str(), v.as_path()))
    }
}

/// Collects entries of `dir` accepted by `keep`, keyed by file stem.
fn scan(dir: &Path, keep: impl Fn(&Path) -> bool) -> Result<BTreeMap<String, PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(source) => {
            return Err(CoreError::Read {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    let mut found = BTreeMap::new();
    for entry in entries {
        let entry = entry.map_err(|source| CoreError::Read {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !keep(&path) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            found.insert(stem.to_string(), path.clone());
        }
    }
    Ok(found)
}

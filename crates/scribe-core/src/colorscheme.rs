//! Colorschemes: named style groups used by the renderer.

use std::collections::HashMap;
use std::fs;

use serde::Deserialize;

use crate::error::{CoreError, Result};
use crate::runtime_files::RuntimeFiles;

/// Name of the built-in colorscheme.
pub const DEFAULT_COLORSCHEME: &str = "default";

/// Style of one highlight group. Colors use names or `#rrggbb`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GroupStyle {
    #[serde(default)]
    pub fg: Option<String>,
    #[serde(default)]
    pub bg: Option<String>,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub reverse: bool,
}

/// A loaded colorscheme.
#[derive(Debug, Clone)]
pub struct Colorscheme {
    name: String,
    groups: HashMap<String, GroupStyle>,
}

impl Default for Colorscheme {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Colorscheme {
    /// The built-in scheme, used whenever no file overrides it.
    pub fn builtin() -> Self {
        let reverse = GroupStyle {
            reverse: true,
            ..GroupStyle::default()
        };
        let groups = HashMap::from([
            ("statusline".to_string(), reverse.clone()),
            ("tabbar".to_string(), reverse),
            (
                "tabbar.active".to_string(),
                GroupStyle {
                    bold: true,
                    ..GroupStyle::default()
                },
            ),
            (
                "error-message".to_string(),
                GroupStyle {
                    fg: Some("red".to_string()),
                    ..GroupStyle::default()
                },
            ),
            (
                "divider".to_string(),
                GroupStyle {
                    fg: Some("darkgray".to_string()),
                    ..GroupStyle::default()
                },
            ),
        ]);
        Self {
            name: DEFAULT_COLORSCHEME.to_string(),
            groups,
        }
    }

    /// Loads the named colorscheme from the registered runtime files.
    pub fn load(name: &str, files: &RuntimeFiles) -> Result<Self> {
        let Some(path) = files.colorscheme(name) else {
            if name == DEFAULT_COLORSCHEME {
                return Ok(Self::builtin());
            }
            return Err(CoreError::Colorscheme {
                name: name.to_string(),
                reason: "not found".to_string(),
            });
        };

        let data = fs::read_to_string(path).map_err(|source| CoreError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let groups: HashMap<String, GroupStyle> =
            serde_json::from_str(&data).map_err(|e| CoreError::Colorscheme {
                name: name.to_string(),
                reason: e.to_string(),
            })?;

        let mut scheme = Self::builtin();
        scheme.name = name.to_string();
        scheme.groups.extend(groups);
        Ok(scheme)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn group(&self, group: &str) -> Option<&GroupStyle> {
        self.groups.get(group)
    }
}

//! Global option store.
//!
//! Every option has a default whose type is the option's native type. Values
//! coming from the settings file, command-line flags or the `set` command are
//! converted through the same routines, so an option can never hold a value of
//! the wrong type.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::Path;

use serde_json::Map;
use tracing::debug;

use crate::atomic::atomic_write_json;
use crate::error::{CoreError, Result};

/// A native option value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl Value {
    fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(s) => serde_json::Value::String(s.clone()),
        }
    }

    fn same_type(&self, other: &Value) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

/// Returns the defaults table, sorted by option name.
pub fn default_settings() -> BTreeMap<&'static str, Value> {
    BTreeMap::from([
        ("autoindent", Value::Bool(true)),
        ("autosave", Value::Number(0.0)),
        ("backup", Value::Bool(true)),
        ("clipboard", Value::Text("external".to_string())),
        ("colorscheme", Value::Text("default".to_string())),
        ("eofnewline", Value::Bool(true)),
        ("fileformat", Value::Text("unix".to_string())),
        ("infobar", Value::Bool(true)),
        ("multiopen", Value::Text("tab".to_string())),
        ("ruler", Value::Bool(true)),
        ("scrollmargin", Value::Number(3.0)),
        ("statusline", Value::Bool(true)),
        ("tabsize", Value::Number(4.0)),
        ("tabstospaces", Value::Bool(false)),
    ])
}

/// Converts the textual form of an option value to its native type.
///
/// `default` decides the target type.
pub fn native_value(option: &str, default: &Value, text: &str) -> Result<Value> {
    let invalid = || CoreError::InvalidValue {
        option: option.to_string(),
        value: text.to_string(),
    };

    let value = match default {
        Value::Bool(_) => match text {
            "true" | "on" => Value::Bool(true),
            "false" | "off" => Value::Bool(false),
            _ => return Err(invalid()),
        },
        Value::Number(_) => Value::Number(text.trim().parse::<f64>().map_err(|_| invalid())?),
        Value::Text(_) => Value::Text(text.to_string()),
    };

    if validate(option, &value) {
        Ok(value)
    } else {
        Err(invalid())
    }
}

/// Domain checks for options whose type alone is not enough.
fn validate(option: &str, value: &Value) -> bool {
    match (option, value) {
        ("clipboard", Value::Text(s)) => matches!(s.as_str(), "external" | "terminal" | "internal"),
        ("fileformat", Value::Text(s)) => matches!(s.as_str(), "unix" | "dos"),
        ("multiopen", Value::Text(s)) => matches!(s.as_str(), "tab" | "hsplit" | "vsplit"),
        ("autosave", Value::Number(n)) | ("scrollmargin", Value::Number(n)) => n.is_finite() && *n >= 0.0,
        ("tabsize", Value::Number(n)) => n.is_finite() && *n > 0.0,
        (_, Value::Number(n)) => n.is_finite(),
        _ => true,
    }
}

/// Converts a value parsed from JSON to the native type of `default`.
fn from_json(option: &str, default: &Value, json: &serde_json::Value) -> Option<Value> {
    let value = match (default, json) {
        (Value::Bool(_), serde_json::Value::Bool(b)) => Value::Bool(*b),
        (Value::Number(_), serde_json::Value::Number(n)) => Value::Number(n.as_f64()?),
        (Value::Text(_), serde_json::Value::String(s)) => Value::Text(s.clone()),
        _ => return None,
    };
    validate(option, &value).then_some(value)
}

/// The global settings store.
#[derive(Debug, Clone)]
pub struct Settings {
    values: BTreeMap<String, Value>,
    /// Options overridden from the command line for this run only.
    volatile: BTreeSet<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Settings {
    /// Creates a store holding every default.
    pub fn defaults() -> Self {
        Self {
            values: default_settings()
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            volatile: BTreeSet::new(),
        }
    }

    pub fn get(&self, option: &str) -> Option<&Value> {
        self.values.get(option)
    }

    /// Sets an option, rejecting unknown options and mismatched types.
    pub fn set(&mut self, option: &str, value: Value) -> Result<()> {
        let current = self
            .values
            .get_mut(option)
            .ok_or_else(|| CoreError::UnknownOption(option.to_string()))?;
        if !current.same_type(&value) || !validate(option, &value) {
            return Err(CoreError::InvalidValue {
                option: option.to_string(),
                value: value.to_string(),
            });
        }
        *current = value;
        self.volatile.remove(option);
        Ok(())
    }

    /// Sets an option from its textual form.
    ///
    /// On failure the previous value is kept.
    pub fn set_from_str(&mut self, option: &str, text: &str) -> Result<()> {
        let defaults = default_settings();
        let default = defaults
            .get(option)
            .ok_or_else(|| CoreError::UnknownOption(option.to_string()))?;
        let value = native_value(option, default, text)?;
        self.set(option, value)
    }

    /// Sets an option for this run only: `write_file` leaves it out.
    pub fn set_volatile(&mut self, option: &str, text: &str) -> Result<()> {
        self.set_from_str(option, text)?;
        self.volatile.insert(option.to_string());
        Ok(())
    }

    pub fn is_volatile(&self, option: &str) -> bool {
        self.volatile.contains(option)
    }

    pub fn bool(&self, option: &str) -> bool {
        matches!(self.values.get(option), Some(Value::Bool(true)))
    }

    pub fn number(&self, option: &str) -> f64 {
        match self.values.get(option) {
            Some(Value::Number(n)) => *n,
            _ => 0.0,
        }
    }

    pub fn text(&self, option: &str) -> &str {
        match self.values.get(option) {
            Some(Value::Text(s)) => s,
            _ => "",
        }
    }

    /// Iterates options in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Reads the raw settings file. A missing file is an empty object.
    pub fn read_file(path: &Path) -> Result<Map<String, serde_json::Value>> {
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(source) => {
                return Err(CoreError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        if data.trim().is_empty() {
            return Ok(Map::new());
        }
        serde_json::from_str(&data).map_err(|source| CoreError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies parsed settings over the current values.
    ///
    /// Every valid entry is applied even when others fail; the first failure
    /// is returned.
    pub fn apply_parsed(&mut self, parsed: &Map<String, serde_json::Value>) -> Result<()> {
        let mut first_err = None;
        for (option, json) in parsed {
            let Some(current) = self.values.get_mut(option) else {
                debug!(option = %option, "ignoring unknown option in settings file");
                first_err.get_or_insert(CoreError::UnknownOption(option.clone()));
                continue;
            };
            match from_json(option, current, json) {
                Some(value) => *current = value,
                None => {
                    first_err.get_or_insert(CoreError::InvalidValue {
                        option: option.clone(),
                        value: json.to_string(),
                    });
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Writes every option that differs from its default, except volatile
    /// ones.
    pub fn write_file(&self, path: &Path) -> Result<()> {
        let defaults = default_settings();
        let changed: Map<String, serde_json::Value> = self
            .values
            .iter()
            .filter(|(k, _)| !self.volatile.contains(k.as_str()))
            .filter(|(k, v)| defaults.get(k.as_str()) != Some(*v))
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        atomic_write_json(path, &changed)
    }

    /// Rewrites the settings file keeping only known options with valid values.
    ///
    /// Returns the names of the removed entries.
    pub fn clean_file(path: &Path) -> Result<Vec<String>> {
        let parsed = Self::read_file(path)?;
        let defaults = default_settings();
        let mut removed = Vec::new();
        let mut kept = Map::new();
        for (option, json) in parsed {
            let valid = defaults
                .get(option.as_str())
                .and_then(|default| from_json(&option, default, &json))
                .is_some();
            if valid {
                kept.insert(option, json);
            } else {
                removed.push(option);
            }
        }
        if !removed.is_empty() {
            atomic_write_json(path, &kept)?;
        }
        Ok(removed)
    }
}

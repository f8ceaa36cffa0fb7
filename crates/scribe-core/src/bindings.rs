//! Key bindings.
//!
//! Keys are written as strings such as `Ctrl-s`, `Alt-,`, `F2` or `PageDown`.
//! `bindings.json` in the config directory maps key strings to action names
//! and overrides the defaults.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde_json::Map;
use tracing::debug;

use crate::error::{CoreError, Result};

/// Editor actions reachable from a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    CursorUp,
    CursorDown,
    CursorLeft,
    CursorRight,
    StartOfLine,
    EndOfLine,
    InsertNewline,
    Backspace,
    Save,
    Quit,
    CommandMode,
    PreviousTab,
    NextTab,
    NextSplit,
    CopyLine,
    Paste,
}

const ACTIONS: &[(&str, Action)] = &[
    ("CursorUp", Action::CursorUp),
    ("CursorDown", Action::CursorDown),
    ("CursorLeft", Action::CursorLeft),
    ("CursorRight", Action::CursorRight),
    ("StartOfLine", Action::StartOfLine),
    ("EndOfLine", Action::EndOfLine),
    ("InsertNewline", Action::InsertNewline),
    ("Backspace", Action::Backspace),
    ("Save", Action::Save),
    ("Quit", Action::Quit),
    ("CommandMode", Action::CommandMode),
    ("PreviousTab", Action::PreviousTab),
    ("NextTab", Action::NextTab),
    ("NextSplit", Action::NextSplit),
    ("CopyLine", Action::CopyLine),
    ("Paste", Action::Paste),
];

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = ACTIONS
            .iter()
            .find(|(_, a)| a == self)
            .map(|(n, _)| *n)
            .unwrap_or("Unknown");
        f.write_str(name)
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ACTIONS
            .iter()
            .find(|(n, _)| *n == s)
            .map(|(_, a)| *a)
            .ok_or_else(|| format!("unknown action '{}'", s))
    }
}

/// A key with its relevant modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyCombo {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }.normalized()
    }

    /// Shift is already encoded in the character for character keys.
    fn normalized(mut self) -> Self {
        self.modifiers &= KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SHIFT;
        if let KeyCode::Char(c) = self.code {
            self.modifiers.remove(KeyModifiers::SHIFT);
            if self.modifiers.contains(KeyModifiers::CONTROL) {
                self.code = KeyCode::Char(c.to_ascii_lowercase());
            }
        }
        self
    }
}

impl From<&KeyEvent> for KeyCombo {
    fn from(event: &KeyEvent) -> Self {
        Self::new(event.code, event.modifiers)
    }
}

impl FromStr for KeyCombo {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut modifiers = KeyModifiers::NONE;
        let mut rest = s;
        loop {
            if let Some(r) = rest.strip_prefix("Ctrl-") {
                modifiers |= KeyModifiers::CONTROL;
                rest = r;
            } else if let Some(r) = rest.strip_prefix("Alt-") {
                modifiers |= KeyModifiers::ALT;
                rest = r;
            } else if let Some(r) = rest.strip_prefix("Shift-") {
                modifiers |= KeyModifiers::SHIFT;
                rest = r;
            } else {
                break;
            }
        }

        let code = parse_key_name(rest).ok_or_else(|| format!("unknown key '{}'", rest))?;
        Ok(Self::new(code, modifiers))
    }
}

fn parse_key_name(name: &str) -> Option<KeyCode> {
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Some(KeyCode::Char(c));
    }
    let code = match name {
        "Up" => KeyCode::Up,
        "Down" => KeyCode::Down,
        "Left" => KeyCode::Left,
        "Right" => KeyCode::Right,
        "Home" => KeyCode::Home,
        "End" => KeyCode::End,
        "PageUp" => KeyCode::PageUp,
        "PageDown" => KeyCode::PageDown,
        "Enter" => KeyCode::Enter,
        "Backspace" => KeyCode::Backspace,
        "Delete" => KeyCode::Delete,
        "Insert" => KeyCode::Insert,
        "Tab" => KeyCode::Tab,
        "Esc" | "Escape" => KeyCode::Esc,
        "Space" => KeyCode::Char(' '),
        _ => {
            let n: u8 = name.strip_prefix('F')?.parse().ok()?;
            if !(1..=12).contains(&n) {
                return None;
            }
            KeyCode::F(n)
        }
    };
    Some(code)
}

/// Key to action table.
#[derive(Debug, Clone)]
pub struct KeyBindings {
    map: HashMap<KeyCombo, Action>,
}

const DEFAULT_BINDINGS: &[(&str, Action)] = &[
    ("Up", Action::CursorUp),
    ("Down", Action::CursorDown),
    ("Left", Action::CursorLeft),
    ("Right", Action::CursorRight),
    ("Home", Action::StartOfLine),
    ("End", Action::EndOfLine),
    ("Enter", Action::InsertNewline),
    ("Backspace", Action::Backspace),
    ("Ctrl-s", Action::Save),
    ("Ctrl-q", Action::Quit),
    ("Ctrl-e", Action::CommandMode),
    ("Alt-,", Action::PreviousTab),
    ("Alt-.", Action::NextTab),
    ("Ctrl-w", Action::NextSplit),
    ("Ctrl-c", Action::CopyLine),
    ("Ctrl-v", Action::Paste),
];

impl Default for KeyBindings {
    fn default() -> Self {
        Self::defaults()
    }
}

impl KeyBindings {
    pub fn defaults() -> Self {
        let map = DEFAULT_BINDINGS
            .iter()
            .filter_map(|(key, action)| Some((key.parse::<KeyCombo>().ok()?, *action)))
            .collect();
        Self { map }
    }

    /// Applies the overrides in a bindings file.
    ///
    /// A missing file is not an error. Valid entries are applied even when
    /// others are rejected; the first rejection is returned.
    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(source) => {
                return Err(CoreError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        if content.trim().is_empty() {
            return Ok(());
        }
        let parsed: Map<String, serde_json::Value> =
            serde_json::from_str(&content).map_err(|source| CoreError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let mut first_err = None;
        for (key, value) in &parsed {
            if let Err(e) = self.bind_json(key, value) {
                first_err.get_or_insert(e);
            }
        }
        debug!(path = %path.display(), entries = parsed.len(), "loaded bindings");
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn bind_json(&mut self, key: &str, value: &serde_json::Value) -> Result<()> {
        let binding_err = |reason: String| CoreError::Binding {
            key: key.to_string(),
            reason,
        };
        let action = value
            .as_str()
            .ok_or_else(|| binding_err("action must be a string".to_string()))?;
        self.bind(key, action).map_err(binding_err)
    }

    pub fn bind(&mut self, key: &str, action: &str) -> std::result::Result<(), String> {
        let combo: KeyCombo = key.parse()?;
        let action: Action = action.parse()?;
        self.map.insert(combo, action);
        Ok(())
    }

    pub fn lookup(&self, event: &KeyEvent) -> Option<Action> {
        self.map.get(&KeyCombo::from(event)).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

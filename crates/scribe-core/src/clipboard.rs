//! Clipboard backend selection.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::{CoreError, Result};

/// Copy tools probed for the external method, in preference order.
const EXTERNAL_TOOLS: &[(&str, &[&str])] = &[
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
    ("pbcopy", &[]),
];

/// Configured clipboard method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardMethod {
    External,
    Terminal,
    Internal,
}

impl ClipboardMethod {
    pub fn from_setting(value: &str) -> Result<Self> {
        match value {
            "external" => Ok(Self::External),
            "terminal" => Ok(Self::Terminal),
            "internal" => Ok(Self::Internal),
            other => Err(CoreError::InvalidValue {
                option: "clipboard".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
enum Backend {
    Tool { program: PathBuf, args: Vec<String> },
    Register,
}

/// Clipboard with an internal register that always holds the last copy.
#[derive(Debug, Clone)]
pub struct Clipboard {
    method: ClipboardMethod,
    backend: Backend,
    register: String,
}

impl Default for Clipboard {
    fn default() -> Self {
        Self {
            method: ClipboardMethod::Internal,
            backend: Backend::Register,
            register: String::new(),
        }
    }
}

impl Clipboard {
    /// Initializes the backend for `method`.
    ///
    /// When no external tool is found the clipboard falls back to the
    /// internal register and the error is returned for the caller to report.
    pub fn initialize(method: ClipboardMethod) -> (Self, Option<CoreError>) {
        let mut clipboard = Self {
            method,
            ..Self::default()
        };
        if method != ClipboardMethod::External {
            return (clipboard, None);
        }

        for (tool, args) in EXTERNAL_TOOLS {
            if let Ok(program) = which::which(tool) {
                debug!(tool = %tool, "using external clipboard");
                clipboard.backend = Backend::Tool {
                    program,
                    args: args.iter().map(|a| a.to_string()).collect(),
                };
                return (clipboard, None);
            }
        }
        let names: Vec<&str> = EXTERNAL_TOOLS.iter().map(|(t, _)| *t).collect();
        (
            clipboard,
            Some(CoreError::Clipboard(format!(
                "no external clipboard tool found (tried {})",
                names.join(", ")
            ))),
        )
    }

    pub fn method(&self) -> ClipboardMethod {
        self.method
    }

    pub fn is_external(&self) -> bool {
        matches!(self.backend, Backend::Tool { .. })
    }

    /// Copies text. The external tool is best effort.
    pub fn copy(&mut self, text: &str) {
        self.register = text.to_string();
        if let Backend::Tool { program, args } = &self.backend {
            if let Err(e) = pipe_to(program, args, text) {
                debug!(error = %e, "external clipboard copy failed");
            }
        }
    }

    pub fn paste(&self) -> &str {
        &self.register
    }
}

fn pipe_to(program: &Path, args: &[String], text: &str) -> std::io::Result<()> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(text.as_bytes())?;
    }
    child.wait()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_from_setting() {
        assert_eq!(
            ClipboardMethod::from_setting("terminal").unwrap(),
            ClipboardMethod::Terminal
        );
        assert!(ClipboardMethod::from_setting("osc52").is_err());
    }

    #[test]
    fn test_internal_register() {
        let (mut clipboard, err) = Clipboard::initialize(ClipboardMethod::Internal);
        assert!(err.is_none());
        assert!(!clipboard.is_external());

        clipboard.copy("hello");
        assert_eq!(clipboard.paste(), "hello");
    }
}

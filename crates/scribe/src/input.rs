//! Input resolver: turns positional arguments into documents.

use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use scribe_core::buffer::{BufferKind, Loc};
use scribe_core::{BufferId, BufferRegistry};

use crate::platform::Platform;

/// Where a document's content comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    File(PathBuf),
    Stdin,
    Blank,
}

/// Resolved positional arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInput {
    pub sources: Vec<DocumentSource>,
    /// Applied to every document opened in this run.
    pub start: Option<Loc>,
}

fn directive_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\+(\d+)(?::(\d+))?$").ok())
        .as_ref()
}

/// Parses a `+LINE` or `+LINE:COL` directive into a 0-indexed location.
///
/// Numbers that do not fit are not directives.
pub fn parse_directive(token: &str) -> Option<Loc> {
    let caps = directive_regex()?.captures(token)?;
    let line: usize = caps.get(1)?.as_str().parse().ok()?;
    let col: usize = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => 1,
    };
    Some(Loc::new(line.saturating_sub(1), col.saturating_sub(1)))
}

/// Splits arguments into document sources and the last start directive.
pub fn resolve(args: &[String], stdin_is_tty: bool) -> ResolvedInput {
    let mut start = None;
    let mut files = Vec::new();
    for arg in args {
        match parse_directive(arg) {
            Some(loc) => start = Some(loc),
            None => files.push(DocumentSource::File(PathBuf::from(arg))),
        }
    }

    let sources = if !files.is_empty() {
        files
    } else if !stdin_is_tty {
        vec![DocumentSource::Stdin]
    } else {
        vec![DocumentSource::Blank]
    };
    ResolvedInput { sources, start }
}

/// Opens every resolved document into the registry.
///
/// A file that fails to open is reported and skipped. When standard output
/// is not a terminal every buffer is tagged for piped output.
pub fn open_documents<P: Platform>(
    input: &ResolvedInput,
    registry: &mut BufferRegistry,
    platform: &mut P,
) -> Vec<BufferId> {
    let kind = if platform.stdout_is_tty() {
        BufferKind::Default
    } else {
        BufferKind::Stdout
    };

    let mut ids = Vec::new();
    for source in &input.sources {
        match source {
            DocumentSource::File(path) => match registry.open(path, kind, input.start) {
                Ok(id) => ids.push(id),
                Err(e) => platform.warn(&e.to_string()),
            },
            DocumentSource::Stdin => {
                let bytes = platform.read_stdin().unwrap_or_else(|e| {
                    platform.warn(&format!("error reading from stdin: {}", e));
                    Vec::new()
                });
                let text = match String::from_utf8(bytes) {
                    Ok(text) => text,
                    Err(e) => {
                        platform.warn("stdin is not valid UTF-8; invalid bytes were replaced");
                        String::from_utf8_lossy(e.as_bytes()).into_owned()
                    }
                };
                ids.push(registry.from_text(&text, kind, input.start));
            }
            DocumentSource::Blank => ids.push(registry.from_text("", kind, input.start)),
        }
    }
    debug!(requested = input.sources.len(), opened = ids.len(), "resolved documents");
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_directive_pattern_compiles() {
        let re = directive_regex().unwrap();
        assert!(re.is_match("+12:34"));
        assert!(!re.is_match("+12:34 "));
    }

    #[test]
    fn test_parse_directive() {
        assert_eq!(parse_directive("+10"), Some(Loc::new(9, 0)));
        assert_eq!(parse_directive("+10:5"), Some(Loc::new(9, 4)));
        assert_eq!(parse_directive("+0"), Some(Loc::new(0, 0)));
        assert_eq!(parse_directive("+"), None);
        assert_eq!(parse_directive("+1:"), None);
        assert_eq!(parse_directive("+a"), None);
        assert_eq!(parse_directive("10"), None);
        assert_eq!(parse_directive("+99999999999999999999999"), None);
    }

    #[test]
    fn test_last_directive_wins_and_applies_to_all() {
        let input = resolve(&args(&["+3", "a.txt", "+10:5", "b.txt"]), true);

        assert_eq!(input.start, Some(Loc::new(9, 4)));
        assert_eq!(
            input.sources,
            vec![
                DocumentSource::File("a.txt".into()),
                DocumentSource::File("b.txt".into()),
            ]
        );
    }

    #[test]
    fn test_malformed_directive_is_a_path() {
        let input = resolve(&args(&["+1x"]), true);
        assert_eq!(input.sources, vec![DocumentSource::File("+1x".into())]);
        assert_eq!(input.start, None);
    }

    #[test]
    fn test_no_files_uses_stdin_or_blank() {
        assert_eq!(resolve(&[], false).sources, vec![DocumentSource::Stdin]);
        assert_eq!(resolve(&args(&["+4"]), true).sources, vec![DocumentSource::Blank]);
    }
}

//! Commands entered at the command prompt.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::actions;
use crate::error::{CoreError, Result};
use crate::jobs::JobOrigin;
use crate::session::Session;

pub type CommandFn = fn(&mut Session, &[String]) -> Result<()>;

/// Name to handler table.
#[derive(Clone)]
pub struct CommandRegistry {
    commands: BTreeMap<&'static str, CommandFn>,
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.commands.keys()).finish()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::defaults()
    }
}

impl CommandRegistry {
    pub fn defaults() -> Self {
        let commands: [(&'static str, CommandFn); 6] = [
            ("quit", quit),
            ("save", save),
            ("set", set),
            ("show", show),
            ("open", open),
            ("run", run),
        ];
        Self {
            commands: commands.into_iter().collect(),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().copied()
    }

    pub fn get(&self, name: &str) -> Option<CommandFn> {
        self.commands.get(name).copied()
    }
}

/// Parses and runs a command line.
pub fn execute(session: &mut Session, line: &str) -> Result<()> {
    let args = split_args(line)?;
    let Some((name, rest)) = args.split_first() else {
        return Ok(());
    };
    let command = session
        .commands
        .get(name)
        .ok_or_else(|| CoreError::Command(format!("unknown command: {}", name)))?;
    command(session, rest)
}

/// Splits a command line on whitespace. Double quotes group words and a
/// backslash escapes the next character.
pub fn split_args(line: &str) -> Result<Vec<String>> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quoted = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let next = chars
                    .next()
                    .ok_or_else(|| CoreError::Command("trailing backslash".to_string()))?;
                current.push(next);
                in_word = true;
            }
            '"' => {
                quoted = !quoted;
                in_word = true;
            }
            c if c.is_whitespace() && !quoted => {
                if in_word {
                    args.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if quoted {
        return Err(CoreError::Command("unterminated quote".to_string()));
    }
    if in_word {
        args.push(current);
    }
    Ok(args)
}

fn usage(text: &str) -> CoreError {
    CoreError::Command(format!("usage: {}", text))
}

fn quit(session: &mut Session, _args: &[String]) -> Result<()> {
    actions::quit(session);
    Ok(())
}

fn save(session: &mut Session, args: &[String]) -> Result<()> {
    if let Some(path) = args.first() {
        let path = shellexpand::tilde(path).into_owned();
        if let Some(buffer) = session.active_buffer_mut() {
            buffer.set_path(Path::new(&path));
        }
    }
    session.save_active()
}

fn set(session: &mut Session, args: &[String]) -> Result<()> {
    let [option, value] = args else {
        return Err(usage("set <option> <value>"));
    };
    session.settings.set_from_str(option, value)?;
    session.apply_setting(option);
    session.settings.write_file(&session.config.settings_file())?;
    session
        .infobar
        .message(format!("{} = {}", option, value));
    Ok(())
}

fn show(session: &mut Session, args: &[String]) -> Result<()> {
    let [option] = args else {
        return Err(usage("show <option>"));
    };
    let value = session
        .settings
        .get(option)
        .ok_or_else(|| CoreError::UnknownOption(option.clone()))?
        .to_string();
    session.infobar.message(format!("{} = {}", option, value));
    Ok(())
}

fn open(session: &mut Session, args: &[String]) -> Result<()> {
    let [path] = args else {
        return Err(usage("open <path>"));
    };
    let path = shellexpand::tilde(path).into_owned();
    session.open_in_new_tab(Path::new(&path))?;
    Ok(())
}

fn run(session: &mut Session, args: &[String]) -> Result<()> {
    let Some((program, rest)) = args.split_first() else {
        return Err(usage("run <program> [args]"));
    };
    session
        .jobs()
        .spawn(
            JobOrigin::Editor,
            program,
            rest.to_vec(),
            Box::new(|session: &mut Session, output: String, _args: Vec<String>| {
                let output = output.trim_end();
                let last = output.lines().last().unwrap_or("");
                session.infobar.message(last.to_string());
            }),
        )
        .map_err(|e| CoreError::Command(format!("{}: {}", program, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::BufferKind;
    use crate::infobar::Message;
    use crate::session::test_support::session;
    use crate::settings::Value;
    use crate::tabs::TabList;
    use tempfile::tempdir;

    #[test]
    fn test_split_args() {
        assert_eq!(split_args("set tabsize 8").unwrap(), vec!["set", "tabsize", "8"]);
        assert_eq!(
            split_args(r#"open "my file.txt""#).unwrap(),
            vec!["open", "my file.txt"]
        );
        assert_eq!(split_args(r"open a\ b").unwrap(), vec!["open", "a b"]);
        assert_eq!(split_args("  ").unwrap(), Vec::<String>::new());
        assert!(split_args(r#"open "oops"#).is_err());
    }

    #[test]
    fn test_set_converts_and_persists() {
        let dir = tempdir().unwrap();
        let (mut s, _rx) = session(dir.path());

        execute(&mut s, "set tabsize 8").unwrap();

        assert_eq!(s.settings.get("tabsize"), Some(&Value::Number(8.0)));
        let written = std::fs::read_to_string(s.config.settings_file()).unwrap();
        assert!(written.contains("\"tabsize\": 8"));
    }

    #[test]
    fn test_set_rejects_bad_value_and_keeps_previous() {
        let dir = tempdir().unwrap();
        let (mut s, _rx) = session(dir.path());

        let result = execute(&mut s, "set tabsize lots");

        assert!(matches!(result, Err(CoreError::InvalidValue { .. })));
        assert_eq!(s.settings.number("tabsize"), 4.0);
    }

    #[test]
    fn test_show_and_unknown_command() {
        let dir = tempdir().unwrap();
        let (mut s, _rx) = session(dir.path());

        execute(&mut s, "show multiopen").unwrap();
        assert_eq!(
            s.infobar.current_message(),
            Some(&Message::Info("multiopen = tab".to_string()))
        );

        assert!(matches!(execute(&mut s, "frobnicate"), Err(CoreError::Command(_))));
    }

    #[test]
    fn test_open_adds_tab() {
        let dir = tempdir().unwrap();
        let (mut s, _rx) = session(dir.path());
        let first = s.buffers.from_text("", BufferKind::Default, None);
        s.tabs = TabList::from_buffers(&[first], "tab");

        let path = dir.path().join("other.txt");
        execute(&mut s, &format!("open {}", path.display())).unwrap();

        assert_eq!(s.tabs.len(), 2);
        assert_eq!(s.buffers.len(), 2);
    }
}

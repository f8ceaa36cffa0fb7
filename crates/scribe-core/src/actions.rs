//! Turning terminal input into session mutations.
//!
//! The router routes each input event either to the open prompt or to the
//! active tab. Both entry points run under the mutation lock.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::debug;

use crate::bindings::Action;
use crate::commands;
use crate::infobar::PromptKind;
use crate::session::Session;

pub const QUIT_PROMPT: &str = "Save changes before quitting? (y,n,esc) ";
pub const COMMAND_PROMPT: &str = "> ";

/// Quits, asking first when any buffer has unsaved changes.
pub fn quit(session: &mut Session) {
    if session.buffers.any_modified() {
        session.infobar.open_prompt(PromptKind::SaveBeforeQuit, QUIT_PROMPT);
    } else {
        session.request_quit();
    }
}

fn is_press(key: &KeyEvent) -> bool {
    key.kind != KeyEventKind::Release
}

fn is_plain(key: &KeyEvent) -> bool {
    !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
}

/// Handles input while no prompt is open.
pub fn handle_tab_event(session: &mut Session, event: &Event) {
    match event {
        Event::Key(key) if is_press(key) => {
            session.infobar.clear_message();
            handle_key(session, key);
        }
        Event::Paste(text) => {
            if let Some(buffer) = session.active_buffer_mut() {
                buffer.insert_text(text);
            }
        }
        Event::Resize(width, height) => session.set_size(*width, *height),
        _ => {}
    }
    session.adjust_scroll();
}

fn handle_key(session: &mut Session, key: &KeyEvent) {
    if let Some(action) = session.bindings.lookup(key) {
        debug!(action = %action, "running action");
        run_action(session, action);
        return;
    }
    match key.code {
        KeyCode::Char(c) if is_plain(key) => {
            if let Some(buffer) = session.active_buffer_mut() {
                buffer.insert_char(c);
            }
        }
        KeyCode::Tab => {
            let indent = if session.settings.bool("tabstospaces") {
                " ".repeat(session.settings.number("tabsize") as usize)
            } else {
                "\t".to_string()
            };
            if let Some(buffer) = session.active_buffer_mut() {
                buffer.insert_text(&indent);
            }
        }
        _ => {}
    }
}

pub fn run_action(session: &mut Session, action: Action) {
    match action {
        Action::Save => {
            if let Err(e) = session.save_active() {
                session.infobar.error(e.to_string());
            }
        }
        Action::Quit => quit(session),
        Action::CommandMode => session.infobar.open_prompt(PromptKind::Command, COMMAND_PROMPT),
        Action::PreviousTab => session.tabs.previous(),
        Action::NextTab => session.tabs.next(),
        Action::NextSplit => {
            if let Some(tab) = session.tabs.active_mut() {
                tab.next_pane();
            }
        }
        Action::CopyLine => {
            if let Some(line) = session.active_buffer().map(|b| b.current_line().to_string()) {
                session.clipboard.copy(&line);
                session.infobar.message("Copied line");
            }
        }
        Action::Paste => {
            let text = session.clipboard.paste().to_string();
            if let Some(buffer) = session.active_buffer_mut() {
                buffer.insert_text(&text);
            }
        }
        _ => edit(session, action),
    }
}

fn edit(session: &mut Session, action: Action) {
    let autoindent = session.settings.bool("autoindent");
    let Some(buffer) = session.active_buffer_mut() else {
        return;
    };
    match action {
        Action::CursorUp => buffer.move_up(),
        Action::CursorDown => buffer.move_down(),
        Action::CursorLeft => buffer.move_left(),
        Action::CursorRight => buffer.move_right(),
        Action::StartOfLine => buffer.move_home(),
        Action::EndOfLine => buffer.move_end(),
        Action::InsertNewline => buffer.insert_newline(autoindent),
        Action::Backspace => buffer.backspace(),
        _ => {}
    }
}

/// Handles input while a prompt owns the focus.
pub fn handle_prompt_event(session: &mut Session, event: &Event) {
    let kind = match session.infobar.prompt() {
        Some(prompt) => prompt.kind,
        None => return handle_tab_event(session, event),
    };
    match event {
        Event::Key(key) if is_press(key) => match kind {
            PromptKind::SaveBeforeQuit => save_before_quit(session, key),
            PromptKind::Command => command_key(session, key),
        },
        Event::Paste(text) if kind == PromptKind::Command => {
            if let Some(prompt) = session.infobar.prompt_mut() {
                prompt.insert_str(text);
            }
        }
        Event::Resize(width, height) => session.set_size(*width, *height),
        _ => {}
    }
}

fn cancels(key: &KeyEvent) -> bool {
    key.code == KeyCode::Esc
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}

fn save_before_quit(session: &mut Session, key: &KeyEvent) {
    if cancels(key) {
        session.infobar.close_prompt();
        return;
    }
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            session.infobar.close_prompt();
            let failed = session.save_all();
            if failed == 0 {
                session.request_quit();
            } else {
                session
                    .infobar
                    .error(format!("{} buffer(s) could not be saved", failed));
            }
        }
        KeyCode::Char('n') | KeyCode::Char('N') => {
            session.infobar.close_prompt();
            session.request_quit();
        }
        _ => {}
    }
}

fn command_key(session: &mut Session, key: &KeyEvent) {
    if cancels(key) {
        session.infobar.close_prompt();
        return;
    }
    if key.code == KeyCode::Enter {
        if let Some(prompt) = session.infobar.close_prompt() {
            if let Err(e) = commands::execute(session, prompt.input()) {
                session.infobar.error(e.to_string());
            }
        }
        session.adjust_scroll();
        return;
    }
    let Some(prompt) = session.infobar.prompt_mut() else {
        return;
    };
    match key.code {
        KeyCode::Backspace => prompt.backspace(),
        KeyCode::Left => prompt.move_left(),
        KeyCode::Right => prompt.move_right(),
        KeyCode::Char(c) if is_plain(key) => prompt.insert(c),
        _ => {}
    }
}

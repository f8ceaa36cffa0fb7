//! Screen rendering using ratatui.

use ratatui::{
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use scribe_core::buffer::Buffer;
use scribe_core::infobar::Message;
use scribe_core::tabs::{Pane, SplitDir, Tab};
use scribe_core::Session;

/// Draw the whole editor.
pub fn draw(frame: &mut Frame, session: &Session) {
    let tab_bar = session.tabs.len() > 1;
    let info_bar = session.settings.bool("infobar");

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(u16::from(tab_bar)),  // Tab bar
            Constraint::Min(0),                      // Panes
            Constraint::Length(u16::from(info_bar)), // Info bar
        ])
        .split(frame.area());

    if tab_bar {
        draw_tab_bar(frame, session, chunks[0]);
    }
    if let Some(tab) = session.tabs.active() {
        draw_tab(frame, session, tab, chunks[1]);
    }
    if info_bar {
        draw_info_bar(frame, session, chunks[2]);
    }
}

/// Resolves a colorscheme group to a ratatui style.
fn group_style(session: &Session, group: &str) -> Style {
    let Some(group) = session.colorscheme.group(group) else {
        return Style::default();
    };
    let mut style = Style::default();
    if let Some(fg) = group.fg.as_deref().and_then(parse_color) {
        style = style.fg(fg);
    }
    if let Some(bg) = group.bg.as_deref().and_then(parse_color) {
        style = style.bg(bg);
    }
    if group.bold {
        style = style.add_modifier(Modifier::BOLD);
    }
    if group.reverse {
        style = style.add_modifier(Modifier::REVERSED);
    }
    style
}

/// Accepts color names ("red", "darkgray"), indices and `#rrggbb`.
fn parse_color(name: &str) -> Option<Color> {
    name.parse().ok()
}

fn draw_tab_bar(frame: &mut Frame, session: &Session, area: Rect) {
    let active = session.tabs.active_index();
    let spans: Vec<Span> = session
        .tabs
        .iter()
        .enumerate()
        .map(|(i, tab)| {
            let name = tab
                .active_pane()
                .and_then(|pane| session.buffers.get(pane.buffer()))
                .map(short_name)
                .unwrap_or_default();
            let style = if i == active {
                group_style(session, "tabbar.active")
            } else {
                Style::default()
            };
            Span::styled(format!(" {} ", name), style)
        })
        .collect();

    let bar = Paragraph::new(Line::from(spans)).style(group_style(session, "tabbar"));
    frame.render_widget(bar, area);
}

/// File name without its directory, for the tab bar.
fn short_name(buffer: &Buffer) -> String {
    buffer
        .path()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| buffer.name())
}

fn draw_tab(frame: &mut Frame, session: &Session, tab: &Tab, area: Rect) {
    let lengths = tab.pane_lengths(area.width, area.height);
    let mut offset = 0u16;
    let last = lengths.len().saturating_sub(1);

    for (i, (pane, length)) in tab.panes().iter().zip(lengths).enumerate() {
        let pane_area = match tab.split_dir() {
            SplitDir::Horizontal => Rect::new(area.x, area.y + offset, area.width, length),
            SplitDir::Vertical => Rect::new(area.x + offset, area.y, length, area.height),
        };
        let focused = i == tab.active_index() && !session.infobar.has_prompt();
        draw_pane(frame, session, pane, pane_area, focused);

        offset += length;
        if tab.split_dir() == SplitDir::Vertical && i < last {
            let divider = Rect::new(area.x + offset, area.y, 1, area.height);
            let lines = vec![Line::raw("│"); usize::from(area.height)];
            frame.render_widget(
                Paragraph::new(lines).style(group_style(session, "divider")),
                divider,
            );
            offset += 1;
        }
    }
}

fn draw_pane(frame: &mut Frame, session: &Session, pane: &Pane, area: Rect, focused: bool) {
    let Some(buffer) = session.buffers.get(pane.buffer()) else {
        return;
    };
    let status = session.settings.bool("statusline") && area.height > 0;
    let text_height = area.height.saturating_sub(u16::from(status));
    let text_area = Rect {
        height: text_height,
        ..area
    };
    let tabsize = tab_size(session);

    let lines: Vec<Line> = buffer
        .lines()
        .iter()
        .skip(pane.top_line())
        .take(usize::from(text_height))
        .map(|line| Line::raw(expand_tabs(line, tabsize)))
        .collect();
    frame.render_widget(Paragraph::new(lines), text_area);

    if status {
        let status_area = Rect {
            y: area.y + text_height,
            height: 1,
            ..area
        };
        let text = status_line(buffer, session.settings.bool("ruler"));
        frame.render_widget(
            Paragraph::new(text).style(group_style(session, "statusline")),
            status_area,
        );
    }

    if focused {
        let cursor = buffer.cursor();
        let Some(row) = cursor.line.checked_sub(pane.top_line()) else {
            return;
        };
        if row >= usize::from(text_height) {
            return;
        }
        let col = visual_column(buffer.current_line(), cursor.col, tabsize);
        if col < usize::from(area.width) {
            frame.set_cursor_position(Position::new(
                text_area.x + col as u16,
                text_area.y + row as u16,
            ));
        }
    }
}

fn status_line(buffer: &Buffer, ruler: bool) -> String {
    let mut text = format!(" {}", buffer.name());
    if buffer.modified() {
        text.push_str(" +");
    }
    if ruler {
        let cursor = buffer.cursor();
        text.push_str(&format!(" ({},{})", cursor.line + 1, cursor.col + 1));
    }
    text
}

fn draw_info_bar(frame: &mut Frame, session: &Session, area: Rect) {
    if let Some(prompt) = session.infobar.prompt() {
        let text = format!("{}{}", prompt.label, prompt.input());
        frame.render_widget(Paragraph::new(text), area);
        let col = prompt.label.chars().count() + prompt.cursor();
        if col < usize::from(area.width) {
            frame.set_cursor_position(Position::new(area.x + col as u16, area.y));
        }
        return;
    }

    let line = match session.infobar.current_message() {
        Some(Message::Info(text)) => Line::raw(text.as_str()),
        Some(Message::Error(text)) => {
            Line::styled(text.as_str(), group_style(session, "error-message"))
        }
        None => Line::default(),
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn tab_size(session: &Session) -> usize {
    session.settings.number("tabsize").max(1.0) as usize
}

/// Replaces tabs with spaces up to the next tab stop.
fn expand_tabs(line: &str, tabsize: usize) -> String {
    let mut out = String::with_capacity(line.len());
    let mut col = 0;
    for c in line.chars() {
        if c == '\t' {
            let width = tabsize - col % tabsize;
            out.extend(std::iter::repeat(' ').take(width));
            col += width;
        } else {
            out.push(c);
            col += 1;
        }
    }
    out
}

/// Screen column of the character at `index` once tabs are expanded.
fn visual_column(line: &str, index: usize, tabsize: usize) -> usize {
    line.chars().take(index).fold(0, |col, c| {
        if c == '\t' {
            col + tabsize - col % tabsize
        } else {
            col + 1
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_tabs_aligns_to_tab_stops() {
        assert_eq!(expand_tabs("\tx", 4), "    x");
        assert_eq!(expand_tabs("ab\tc", 4), "ab  c");
        assert_eq!(expand_tabs("abcd\te", 4), "abcd    e");
    }

    #[test]
    fn test_visual_column_counts_expanded_tabs() {
        assert_eq!(visual_column("\tabc", 0, 4), 0);
        assert_eq!(visual_column("\tabc", 1, 4), 4);
        assert_eq!(visual_column("a\tb", 2, 8), 8);
        assert_eq!(visual_column("abc", 10, 4), 3);
    }

    #[test]
    fn test_parse_color_forms() {
        assert_eq!(parse_color("red"), Some(Color::Red));
        assert_eq!(parse_color("#ff0000"), Some(Color::Rgb(255, 0, 0)));
        assert_eq!(parse_color("not-a-color"), None);
    }
}

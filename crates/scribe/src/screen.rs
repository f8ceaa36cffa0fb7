//! Terminal platform: crossterm screen setup, event source and renderer.

use std::fs::OpenOptions;
use std::io::{self, IsTerminal, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossterm::cursor::Show;
use crossterm::event::{self, DisableBracketedPaste, EnableBracketedPaste};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{error, warn};

use scribe_core::Session;
use scribe_runtime::{Event, EventSource, Frontend, ScreenLock};

use crate::platform::{Platform, WarningSurface};
use crate::ui;

/// How long one poll blocks before the screen lock is released again.
const POLL_TIMEOUT: Duration = Duration::from_millis(50);

type Output = Box<dyn Write + Send>;

/// Standard output, or the controlling terminal when stdout is redirected.
fn terminal_output() -> io::Result<Output> {
    if io::stdout().is_terminal() {
        Ok(Box::new(io::stdout()))
    } else {
        let tty = OpenOptions::new().write(true).open("/dev/tty")?;
        Ok(Box::new(tty))
    }
}

/// Whether the editor screen is currently up. Shared between the platform
/// and the renderer so whichever tears down first wins.
#[derive(Debug, Clone, Default)]
struct ScreenState {
    active: Arc<AtomicBool>,
}

impl ScreenState {
    fn enter(&self) -> io::Result<()> {
        enable_raw_mode()?;
        let entered = terminal_output()
            .and_then(|mut out| execute!(out, EnterAlternateScreen, EnableBracketedPaste));
        if let Err(e) = entered {
            let _ = disable_raw_mode();
            return Err(e);
        }
        self.active.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Returns false when the screen was not up.
    fn restore(&self) -> bool {
        if !self.active.swap(false, Ordering::SeqCst) {
            return false;
        }
        let _ = disable_raw_mode();
        if let Ok(mut out) = terminal_output() {
            let _ = execute!(out, DisableBracketedPaste, LeaveAlternateScreen, Show);
        }
        true
    }
}

/// Renders the session with ratatui.
pub struct TermScreen {
    terminal: Terminal<CrosstermBackend<Output>>,
    state: ScreenState,
}

impl TermScreen {
    fn new(state: ScreenState) -> io::Result<Self> {
        let mut terminal = Terminal::new(CrosstermBackend::new(terminal_output()?))?;
        terminal.clear()?;
        Ok(Self { terminal, state })
    }
}

impl Frontend for TermScreen {
    fn render(&mut self, session: &Session) -> io::Result<()> {
        self.terminal.draw(|frame| ui::draw(frame, session))?;
        Ok(())
    }

    fn teardown(&mut self) {
        self.state.restore();
    }
}

/// Reads crossterm events with a bounded wait.
#[derive(Debug, Default)]
pub struct CrosstermEvents;

impl EventSource for CrosstermEvents {
    fn poll_event(&mut self) -> Option<Event> {
        match event::poll(POLL_TIMEOUT) {
            Ok(false) => None,
            Ok(true) => Some(Event::from(event::read())),
            Err(e) => Some(Event::Error(e.into())),
        }
    }
}

/// The real terminal.
#[derive(Debug, Default)]
pub struct TermPlatform {
    state: ScreenState,
    screen: ScreenLock,
}

impl TermPlatform {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WarningSurface for TermPlatform {
    /// Prints to stderr and waits for Enter when stdin is a terminal. The
    /// editor screen, if up, is suspended around the message.
    fn warn(&mut self, message: &str) {
        warn!(warning = %message, "startup warning");
        let _screen = self.screen.lock();
        let suspended = self.state.is_active() && self.state.restore();

        let mut stderr = io::stderr().lock();
        let _ = writeln!(stderr, "{}", message);
        let _ = write!(stderr, "Press enter to continue");
        let _ = stderr.flush();
        if io::stdin().is_terminal() {
            let mut line = String::new();
            let _ = io::stdin().read_line(&mut line);
        } else {
            let _ = writeln!(stderr);
        }

        if suspended {
            if let Err(e) = self.state.enter() {
                error!(error = %e, "failed to resume screen after warning");
            }
        }
    }
}

impl Platform for TermPlatform {
    type Frontend = TermScreen;
    type Events = CrosstermEvents;

    fn stdin_is_tty(&self) -> bool {
        io::stdin().is_terminal()
    }

    fn stdout_is_tty(&self) -> bool {
        io::stdout().is_terminal()
    }

    fn read_stdin(&mut self) -> io::Result<Vec<u8>> {
        let mut bytes = Vec::new();
        io::stdin().read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    fn init_screen(&mut self) -> io::Result<()> {
        self.state.enter()
    }

    fn screen_size(&self) -> (u16, u16) {
        crossterm::terminal::size().unwrap_or((80, 24))
    }

    fn screen_lock(&self) -> ScreenLock {
        self.screen.clone()
    }

    fn frontend(&mut self) -> io::Result<TermScreen> {
        TermScreen::new(self.state.clone())
    }

    fn events(&mut self) -> CrosstermEvents {
        CrosstermEvents
    }

    fn restore_screen(&mut self) {
        self.state.restore();
    }
}

//! The process environment the bootstrap runs against.
//!
//! The terminal implementation lives in `screen`; tests drive the bootstrap
//! with a scripted implementation.

use std::io;

use scribe_runtime::{EventSource, Frontend, ScreenLock};

/// Synchronous warning output used during startup.
pub trait WarningSurface {
    /// Shows a message and waits for the user to acknowledge it.
    fn warn(&mut self, message: &str);
}

pub trait Platform: WarningSurface {
    type Frontend: Frontend;
    type Events: EventSource;

    fn stdin_is_tty(&self) -> bool;
    fn stdout_is_tty(&self) -> bool;

    /// Reads all of standard input.
    fn read_stdin(&mut self) -> io::Result<Vec<u8>>;

    /// Switches the terminal to the editor screen.
    fn init_screen(&mut self) -> io::Result<()>;

    /// Current screen size as (width, height).
    fn screen_size(&self) -> (u16, u16);

    /// Lock held by the input poller around each terminal read.
    fn screen_lock(&self) -> ScreenLock;

    /// Creates the renderer used by the router.
    fn frontend(&mut self) -> io::Result<Self::Frontend>;

    /// Creates the terminal event source read by the input poller.
    fn events(&mut self) -> Self::Events;

    /// Restores the terminal if the screen was initialized. Idempotent.
    fn restore_screen(&mut self);
}

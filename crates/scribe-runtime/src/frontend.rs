//! The terminal screen as seen by the router.

use std::io;

use scribe_core::Session;

/// Draws the session and owns terminal teardown.
pub trait Frontend {
    /// Clears the screen, draws every visible element and flushes.
    ///
    /// Rendering only reads the session.
    fn render(&mut self, session: &Session) -> io::Result<()>;

    /// Restores the terminal to its original mode. Must be idempotent.
    fn teardown(&mut self);
}

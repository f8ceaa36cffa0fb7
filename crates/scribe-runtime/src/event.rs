//! Events delivered to the router.

use std::fmt;
use std::io;

/// A terminal event or a failure to read one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Input(crossterm::event::Event),
    Error(EventError),
}

impl From<io::Result<crossterm::event::Event>> for Event {
    fn from(result: io::Result<crossterm::event::Event>) -> Self {
        match result {
            Ok(event) => Event::Input(event),
            Err(e) => Event::Error(EventError::from(e)),
        }
    }
}

/// A terminal read failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventError {
    pub message: String,
    /// The terminal is gone; no further input will arrive.
    pub end_of_input: bool,
}

impl EventError {
    pub fn new(message: impl Into<String>, end_of_input: bool) -> Self {
        Self {
            message: message.into(),
            end_of_input,
        }
    }
}

impl From<io::Error> for EventError {
    fn from(e: io::Error) -> Self {
        Self::new(e.to_string(), e.kind() == io::ErrorKind::UnexpectedEof)
    }
}

impl fmt::Display for EventError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Classes of process signals the router reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// Interrupt, terminate, quit and abort.
    Terminate,
    /// Hangup.
    Reload,
    /// Continue after a stop. The terminal may have been drawn over.
    Resume,
}

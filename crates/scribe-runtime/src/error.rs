//! Error types for the runtime crate.

use std::any::Any;
use std::fmt;
use std::io;
use std::panic;

use thiserror::Error;

/// Errors that end the event loop abnormally.
///
/// Any of these reaching the crash boundary is handled like a panic.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The async runtime could not be built.
    #[error("failed to start async runtime: {0}")]
    AsyncRuntime(#[source] io::Error),

    /// Drawing to the terminal failed.
    #[error("render failed: {0}")]
    Render(#[source] io::Error),

    /// A background thread could not be started.
    #[error("failed to start {name} thread: {source}")]
    Thread {
        name: &'static str,
        #[source]
        source: io::Error,
    },

    /// Signal listeners could not be registered.
    #[error("failed to register signal handlers: {0}")]
    Signals(#[source] io::Error),

    /// A collaborator failed in a way the loop cannot recover from.
    #[error(transparent)]
    Core(#[from] scribe_core::CoreError),
}

/// Result type for runtime operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Extracts a readable message from a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(fault) = payload.downcast_ref::<scribe_core::ExtensionFault>() {
        fault.to_string()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// A panic caught on a background thread.
///
/// The router re-raises it on its own thread so the crash boundary sees it.
pub struct ThreadFault {
    pub thread: &'static str,
    pub payload: Box<dyn Any + Send>,
}

impl fmt::Debug for ThreadFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadFault")
            .field("thread", &self.thread)
            .field("message", &self.message())
            .finish()
    }
}

impl ThreadFault {
    pub fn new(thread: &'static str, payload: Box<dyn Any + Send>) -> Self {
        Self { thread, payload }
    }

    pub fn message(&self) -> String {
        format!("{} thread panicked: {}", self.thread, panic_message(self.payload.as_ref()))
    }

    /// Unwinds the calling thread with this fault's message.
    pub fn resume(self) -> ! {
        panic::resume_unwind(Box::new(self.message()))
    }
}

/// Sending half of the fault channel.
pub type FaultSender = tokio::sync::mpsc::UnboundedSender<ThreadFault>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");

        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");

        let payload: Box<dyn Any + Send> = Box::new(scribe_core::ExtensionFault {
            plugin: "fmt".to_string(),
            message: "bad".to_string(),
        });
        assert_eq!(panic_message(payload.as_ref()), "fmt: bad");

        let payload: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }

    #[test]
    fn test_thread_fault_resumes_with_thread_name() {
        let fault = ThreadFault::new("input-poller", Box::new("tty gone"));
        let payload = panic::catch_unwind(panic::AssertUnwindSafe(|| fault.resume())).unwrap_err();
        assert_eq!(
            panic_message(payload.as_ref()),
            "input-poller thread panicked: tty gone"
        );
    }
}

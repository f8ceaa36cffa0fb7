//! The crash-recovery boundary around bootstrap and the event loop.
//!
//! Anything that escapes, a panic or an `Err(RuntimeError)`, ends the same
//! way: the screen is restored, a report goes to stderr, every open buffer
//! is backed up and the process exits with status 1.

use std::any::Any;
use std::backtrace::Backtrace;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::thread;

use tracing::{error, warn};

use scribe_core::{ExtensionFault, Session};
use scribe_runtime::{panic_message, shutdown, MutationLock, RuntimeError};

use crate::platform::Platform;

/// Exit status of every caught crash.
pub const CRASH_EXIT_CODE: i32 = 1;

/// Where the panic happened, recorded by the panic hook.
///
/// Printing from the hook would land on the alternate screen, so the hook
/// only records and the report is printed once the screen is restored.
#[derive(Debug, Clone)]
struct PanicSite {
    location: Option<String>,
    backtrace: String,
}

/// A fault caught by the boundary.
#[derive(Debug)]
pub enum Fault {
    /// Raised from a plugin-origin callback.
    Extension(ExtensionFault),
    Panic {
        message: String,
        location: Option<String>,
        backtrace: Option<String>,
    },
    Error(RuntimeError),
}

impl Fault {
    fn from_panic(payload: Box<dyn Any + Send>, site: Option<PanicSite>) -> Self {
        match payload.downcast::<ExtensionFault>() {
            Ok(fault) => Fault::Extension(*fault),
            Err(payload) => Fault::Panic {
                message: panic_message(payload.as_ref()),
                location: site.as_ref().and_then(|s| s.location.clone()),
                backtrace: site.map(|s| s.backtrace),
            },
        }
    }

    /// Text printed to stderr after the screen is restored.
    pub fn report(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::Extension(fault) => write!(f, "Extension error: {}", fault),
            Fault::Panic {
                message,
                location,
                backtrace,
            } => {
                write!(f, "Scribe encountered an error: {}", message)?;
                if let Some(location) = location {
                    write!(f, "\n  at {}", location)?;
                }
                if let Some(backtrace) = backtrace {
                    write!(f, "\n\n{}", backtrace)?;
                }
                write!(f, "\n\n{}", REPORT_HINT)
            }
            Fault::Error(e) => {
                write!(f, "Scribe encountered an error: {}\n\n{}", e, REPORT_HINT)
            }
        }
    }
}

const REPORT_HINT: &str = "If you can reproduce this error, please report it along with the steps \
that lead to it. Unsaved buffers were backed up to the backups directory.";

/// Runs `body` inside the boundary and returns the process exit status.
///
/// `session` is a clone of the mutation lock the body runs under, so the
/// buffers can still be backed up after a panic poisoned it.
pub fn guard<P, F>(session: &MutationLock<Session>, platform: &mut P, body: F) -> i32
where
    P: Platform,
    F: FnOnce(&mut P) -> Result<i32, RuntimeError>,
{
    let site: Arc<Mutex<Option<PanicSite>>> = Arc::new(Mutex::new(None));
    let boundary_thread = thread::current().id();

    let previous = panic::take_hook();
    {
        let site = Arc::clone(&site);
        panic::set_hook(Box::new(move |info| {
            let location = info.location().map(|l| l.to_string());
            let current = thread::current();
            if current.id() != boundary_thread {
                // Forwarded panics are re-raised without a hook, so the first
                // site recorded here is the one the report shows.
                error!(
                    location = ?location,
                    thread = current.name().unwrap_or("unnamed"),
                    "panic on background thread"
                );
            }
            let captured = PanicSite {
                location,
                backtrace: Backtrace::force_capture().to_string(),
            };
            let mut slot = site.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            slot.get_or_insert(captured);
        }));
    }

    let result = panic::catch_unwind(AssertUnwindSafe(|| body(&mut *platform)));

    let _ = panic::take_hook();
    panic::set_hook(previous);

    let fault = match result {
        Ok(Ok(code)) => return code,
        Ok(Err(e)) => Fault::Error(e),
        Err(payload) => {
            let site = site
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .take();
            Fault::from_panic(payload, site)
        }
    };
    recover(session, platform, &fault)
}

/// Restores the screen, reports `fault` and backs up every buffer.
fn recover<P: Platform>(session: &MutationLock<Session>, platform: &mut P, fault: &Fault) -> i32 {
    error!(fault = %fault, "crashed");
    platform.restore_screen();
    eprintln!("{}", fault.report());

    let report = shutdown::preserve(&session.lock());
    for (id, e) in &report.failed {
        warn!(buffer = ?id, error = %e, "backup failed");
        eprintln!("Failed to back up buffer: {}", e);
    }
    CRASH_EXIT_CODE
}

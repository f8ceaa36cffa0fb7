//! Shutdown coordination.
//!
//! | Reason       | Buffers finalized  | Terminal torn down |
//! |--------------|--------------------|--------------------|
//! | `Quit`       | all                | yes                |
//! | `EndOfInput` | unmodified only    | yes                |
//! | `Terminate`  | unmodified only    | yes                |
//! | `Reload`     | unmodified only    | no                 |
//!
//! Modified buffers are left unfinalized on the signal and end-of-input
//! paths, so their backups stay on disk.

use std::fmt;

use tracing::info;

use scribe_core::registry::BackupReport;
use scribe_core::Session;

use crate::frontend::Frontend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// The user quit.
    Quit,
    /// The terminal went away.
    EndOfInput,
    /// Hangup.
    Reload,
    /// Interrupt, terminate, quit or abort signal.
    Terminate,
}

impl ShutdownReason {
    pub fn finalizes_modified(self) -> bool {
        self == ShutdownReason::Quit
    }

    pub fn tears_down_terminal(self) -> bool {
        self != ShutdownReason::Reload
    }
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ShutdownReason::Quit => "quit",
            ShutdownReason::EndOfInput => "end of input",
            ShutdownReason::Reload => "reload",
            ShutdownReason::Terminate => "terminate",
        };
        f.write_str(s)
    }
}

/// Outcome of a clean shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shutdown {
    pub reason: ShutdownReason,
    /// Buffers finalized by this shutdown.
    pub finalized: usize,
    pub exit_code: i32,
}

/// Finalizes buffers and tears down the terminal according to `reason`.
pub fn shutdown<F: Frontend + ?Sized>(
    session: &mut Session,
    frontend: &mut F,
    reason: ShutdownReason,
) -> Shutdown {
    let finalized = if reason.finalizes_modified() {
        session.buffers.finalize_all()
    } else {
        session.buffers.finalize_unmodified()
    };
    if reason.tears_down_terminal() {
        frontend.teardown();
    }
    info!(%reason, finalized, open = session.buffers.len(), "shutting down");
    Shutdown {
        reason,
        finalized,
        exit_code: 0,
    }
}

/// Backs up every open buffer regardless of its modified state.
///
/// Used on the crash path; failures are reported, never escalated.
pub fn preserve(session: &Session) -> BackupReport {
    let report = session.buffers.backup_all();
    info!(
        written = report.written.len(),
        failed = report.failed.len(),
        "backed up open buffers"
    );
    report
}

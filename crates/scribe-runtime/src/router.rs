//! The event router.
//!
//! Every iteration renders, waits for the first ready source and dispatches
//! exactly that one. Dispatches that touch the session run under the
//! mutation lock; rendering takes the lock only to read.

use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, trace, warn};

use scribe_core::actions;
use scribe_core::{ExtensionFault, JobOrigin, JobResult, Session};

use crate::config::RuntimeConfig;
use crate::error::{panic_message, Result, RuntimeError};
use crate::event::Event;
use crate::frontend::Frontend;
use crate::lock::MutationLock;
use crate::shutdown::{self, Shutdown, ShutdownReason};
use crate::sources::{Ready, Sources};

pub struct Router<F> {
    session: MutationLock<Session>,
    frontend: F,
    sources: Sources,
    config: RuntimeConfig,
}

impl<F: Frontend> Router<F> {
    pub fn new(
        session: MutationLock<Session>,
        frontend: F,
        sources: Sources,
        config: RuntimeConfig,
    ) -> Self {
        Self {
            session,
            frontend,
            sources,
            config,
        }
    }

    pub fn session(&self) -> &MutationLock<Session> {
        &self.session
    }

    pub fn frontend(&self) -> &F {
        &self.frontend
    }

    pub fn render(&mut self) -> Result<()> {
        let session = self.session.lock();
        self.frontend.render(&session).map_err(RuntimeError::Render)
    }

    /// Discards redraw requests queued before the loop starts.
    pub fn discard_pending_redraws(&mut self) -> usize {
        self.sources.drain_redraws(self.config.redraw_queue_capacity)
    }

    /// Applies the first terminal event if it arrives within the configured
    /// timeout, typically the initial resize.
    pub async fn apply_initial_event(&mut self) -> Option<Shutdown> {
        let timeout = self.config.initial_event_timeout;
        match self.sources.first_input(timeout).await {
            Some(event) => self.dispatch(Ready::Input(event)),
            None => None,
        }
    }

    /// Renders, waits for one source and dispatches it.
    pub async fn step(&mut self) -> Result<Option<Shutdown>> {
        self.render()?;
        let ready = self.sources.next().await;
        trace!(source = ?ready.kind(), "dispatching");
        Ok(self.dispatch(ready))
    }

    /// Runs until a dispatch shuts the session down.
    pub async fn run(mut self) -> Result<Shutdown> {
        loop {
            if let Some(shutdown) = self.step().await? {
                return Ok(shutdown);
            }
        }
    }

    /// Dispatches one ready source.
    pub fn dispatch(&mut self, ready: Ready) -> Option<Shutdown> {
        match ready {
            Ready::Job(job) => {
                let mut session = self.session.lock();
                complete_job(&mut session, job);
                if !session.quit_requested() {
                    return None;
                }
                Some(shutdown::shutdown(&mut session, &mut self.frontend, ShutdownReason::Quit))
            }
            Ready::Autosave => {
                let failed = self.session.lock().save_all();
                debug!(failed, "autosave");
                None
            }
            Ready::CloseTerminal => None,
            Ready::Redraw => {
                let drained = self.sources.drain_redraws(self.config.redraw_drain_limit);
                trace!(drained, "coalesced redraw requests");
                None
            }
            Ready::Input(Event::Error(e)) => {
                warn!(error = %e, end_of_input = e.end_of_input, "terminal read failed");
                if !e.end_of_input {
                    return None;
                }
                Some(self.shutdown(ShutdownReason::EndOfInput))
            }
            Ready::Input(Event::Input(event)) => {
                let mut session = self.session.lock();
                if session.infobar.has_prompt() {
                    actions::handle_prompt_event(&mut session, &event);
                } else {
                    actions::handle_tab_event(&mut session, &event);
                }
                if !session.quit_requested() {
                    return None;
                }
                Some(shutdown::shutdown(&mut session, &mut self.frontend, ShutdownReason::Quit))
            }
            Ready::Reload => Some(self.shutdown(ShutdownReason::Reload)),
            Ready::Terminate => Some(self.shutdown(ShutdownReason::Terminate)),
            Ready::Fault(fault) => fault.resume(),
        }
    }

    fn shutdown(&mut self, reason: ShutdownReason) -> Shutdown {
        let mut session = self.session.lock();
        shutdown::shutdown(&mut session, &mut self.frontend, reason)
    }
}

/// Runs a job's completion callback.
///
/// A panic in a plugin job's callback is re-raised as an [`ExtensionFault`]
/// naming the plugin.
fn complete_job(session: &mut Session, job: JobResult) {
    let JobOrigin::Plugin(plugin) = job.origin.clone() else {
        job.complete(session);
        return;
    };
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| job.complete(session))) {
        let message = panic_message(payload.as_ref());
        panic::panic_any(ExtensionFault { plugin, message });
    }
}

//! Main entry point combining the router, the poller and signal listeners.

use tracing::{debug, info};

use scribe_core::Session;

use crate::config::{autosave_period, RuntimeConfig};
use crate::error::{Result, RuntimeError};
use crate::frontend::Frontend;
use crate::lock::{MutationLock, ScreenLock};
use crate::poller::{EventSource, InputPoller};
use crate::shutdown::Shutdown;
use crate::signals;
use crate::sources::{channels, Receivers, Senders, Sources};
use crate::router::Router;

/// Owns the router's channels and the single-threaded async runtime the
/// router runs on.
pub struct Runtime {
    config: RuntimeConfig,
    tokio: tokio::runtime::Runtime,
    senders: Senders,
    receivers: Receivers,
}

impl Runtime {
    /// Builds the async runtime and every router channel.
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        let tokio = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(RuntimeError::AsyncRuntime)?;
        let (senders, receivers) = channels(&config);
        Ok(Self {
            config,
            tokio,
            senders,
            receivers,
        })
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Senders for the session and for anything started before the loop.
    pub fn senders(&self) -> &Senders {
        &self.senders
    }

    /// Arms the loop and runs the router until shutdown.
    ///
    /// Arming order: autosave timer, signal listeners, input poller, then
    /// stale redraw requests are discarded and the first terminal event is
    /// given a short window to arrive before the first render.
    pub fn run<F, S>(
        self,
        session: MutationLock<Session>,
        frontend: F,
        events: S,
        screen: ScreenLock,
    ) -> Result<Shutdown>
    where
        F: Frontend,
        S: EventSource,
    {
        let Runtime {
            config,
            tokio,
            senders,
            receivers,
        } = self;

        tokio.block_on(async move {
            let autosave = autosave_period(session.lock().settings.number("autosave"));
            if let Some(period) = autosave {
                info!(seconds = period.as_secs_f64(), "autosave armed");
            }
            let sources = Sources::new(receivers, autosave);

            let Senders {
                input,
                terminate,
                reload,
                redraw,
                faults,
                ..
            } = senders;
            let listener = if config.handle_signals {
                Some(signals::listen(terminate, reload, redraw)?)
            } else {
                None
            };

            InputPoller::new(events, screen, input)
                .with_faults(faults)
                .spawn()?;

            let mut router = Router::new(session, frontend, sources, config);
            let discarded = router.discard_pending_redraws();
            debug!(discarded, "router armed");

            let result = match router.apply_initial_event().await {
                Some(shutdown) => Ok(shutdown),
                None => router.run().await,
            };
            if let Some(listener) = listener {
                listener.close();
            }
            result
        })
    }
}

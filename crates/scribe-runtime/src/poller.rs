//! Input poller.
//!
//! A dedicated thread repeatedly takes the screen lock, reads one terminal
//! event and hands it to the router through a single-slot queue. The send
//! blocks while the router still holds the previous event, so at most one
//! event is ever in flight.
//!
//! A panic inside the event source is caught and forwarded on the fault
//! channel, where the router picks it up and unwinds into the crash boundary.

use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

use tokio::sync::mpsc;
use tracing::{debug, error, trace};

use crate::error::{panic_message, FaultSender, Result, RuntimeError, ThreadFault};
use crate::event::Event;
use crate::lock::ScreenLock;

/// Something that yields terminal events.
pub trait EventSource: Send + 'static {
    /// Blocks for a bounded time waiting for the next event.
    ///
    /// `None` means nothing arrived; the poller simply asks again.
    fn poll_event(&mut self) -> Option<Event>;
}

/// Reads terminal events on its own thread.
pub struct InputPoller<S> {
    source: S,
    screen: ScreenLock,
    tx: mpsc::Sender<Event>,
    faults: Option<FaultSender>,
}

impl<S: EventSource> InputPoller<S> {
    pub fn new(source: S, screen: ScreenLock, tx: mpsc::Sender<Event>) -> Self {
        Self {
            source,
            screen,
            tx,
            faults: None,
        }
    }

    /// Forwards a panic in the event source to `faults`.
    pub fn with_faults(mut self, faults: FaultSender) -> Self {
        self.faults = Some(faults);
        self
    }

    /// Starts the poller thread.
    ///
    /// The thread is never joined; it ends on its own once the router has
    /// dropped its receiver.
    pub fn spawn(self) -> Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("input-poller".to_string())
            .spawn(move || self.run())
            .map_err(|source| RuntimeError::Thread {
                name: "input-poller",
                source,
            })
    }

    fn run(mut self) {
        debug!("input poller started");
        let faults = self.faults.take();
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| self.poll_loop())) {
            error!(panic = %panic_message(payload.as_ref()), "input poller panicked");
            if let Some(faults) = faults {
                if faults.send(ThreadFault::new("input-poller", payload)).is_err() {
                    debug!("input poller fault after the router stopped");
                }
            }
            return;
        }
        debug!("input poller stopped");
    }

    fn poll_loop(&mut self) {
        while !self.tx.is_closed() {
            let event = {
                let _screen = self.screen.lock();
                self.source.poll_event()
            };
            let Some(event) = event else {
                continue;
            };
            trace!(?event, "input event");
            if self.tx.blocking_send(event).is_err() {
                break;
            }
        }
    }
}

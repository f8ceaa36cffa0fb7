//! Process signal listeners.
//!
//! A listener thread forwards terminate-class and reload-class signals to the
//! router's single-slot signal queues. A full queue means the router has not
//! consumed the previous signal yet, so repeats are dropped. Resuming after a
//! stop requests a redraw.

use tokio::sync::mpsc;

use scribe_core::RedrawHandle;

use crate::error::Result;
use crate::event::SignalKind;

#[cfg(unix)]
use signal_hook::consts::signal::{SIGABRT, SIGCONT, SIGHUP, SIGINT, SIGQUIT, SIGTERM};

/// Maps a raw signal number to the class the router reacts to.
#[cfg(unix)]
pub fn classify(signal: i32) -> Option<SignalKind> {
    match signal {
        SIGINT | SIGTERM | SIGQUIT | SIGABRT => Some(SignalKind::Terminate),
        SIGHUP => Some(SignalKind::Reload),
        SIGCONT => Some(SignalKind::Resume),
        _ => None,
    }
}

/// Handle to the running listener.
pub struct SignalListener {
    #[cfg(unix)]
    handle: signal_hook::iterator::Handle,
}

impl SignalListener {
    /// Unregisters the handlers and lets the listener thread exit.
    pub fn close(&self) {
        #[cfg(unix)]
        self.handle.close();
    }
}

/// Registers the handlers and starts the listener thread.
#[cfg(unix)]
pub fn listen(
    terminate: mpsc::Sender<()>,
    reload: mpsc::Sender<()>,
    redraw: RedrawHandle,
) -> Result<SignalListener> {
    use signal_hook::iterator::Signals;
    use std::thread;
    use tracing::{debug, info};

    use crate::error::RuntimeError;

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGQUIT, SIGABRT, SIGHUP, SIGCONT])
        .map_err(RuntimeError::Signals)?;
    let handle = signals.handle();

    thread::Builder::new()
        .name("signals".to_string())
        .spawn(move || {
            for signal in signals.forever() {
                let tx = match classify(signal) {
                    Some(SignalKind::Terminate) => &terminate,
                    Some(SignalKind::Reload) => &reload,
                    Some(SignalKind::Resume) => {
                        debug!(signal, "resumed, requesting redraw");
                        redraw.request();
                        continue;
                    }
                    None => continue,
                };
                info!(signal, "received signal");
                if tx.try_send(()).is_err() {
                    debug!(signal, "signal already pending");
                }
            }
        })
        .map_err(|source| RuntimeError::Thread {
            name: "signals",
            source,
        })?;

    Ok(SignalListener { handle })
}

/// Signals are not forwarded on this platform; the queues stay silent.
#[cfg(not(unix))]
pub fn listen(
    terminate: mpsc::Sender<()>,
    reload: mpsc::Sender<()>,
    redraw: RedrawHandle,
) -> Result<SignalListener> {
    drop((terminate, reload, redraw));
    Ok(SignalListener {})
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        for signal in [SIGINT, SIGTERM, SIGQUIT, SIGABRT] {
            assert_eq!(classify(signal), Some(SignalKind::Terminate));
        }
        assert_eq!(classify(SIGHUP), Some(SignalKind::Reload));
        assert_eq!(classify(SIGCONT), Some(SignalKind::Resume));
        assert_eq!(classify(signal_hook::consts::SIGUSR1), None);
    }

    #[test]
    fn test_resume_requests_redraw() {
        use std::thread;
        use std::time::{Duration, Instant};

        let (terminate, _terminate_rx) = mpsc::channel(1);
        let (reload, mut reload_rx) = mpsc::channel(1);
        let (redraw, mut redraw_rx) = scribe_core::notify::redraw_channel(8);
        let listener = listen(terminate, reload, redraw).unwrap();

        signal_hook::low_level::raise(SIGCONT).unwrap();

        let deadline = Instant::now() + Duration::from_secs(2);
        while redraw_rx.try_recv().is_err() {
            assert!(Instant::now() < deadline, "no redraw after SIGCONT");
            thread::sleep(Duration::from_millis(5));
        }
        assert!(reload_rx.try_recv().is_err());
        listener.close();
    }
}

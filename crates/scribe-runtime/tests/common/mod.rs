#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use scribe_core::{ConfigDir, DeferredStdout, Session, Settings};
use scribe_runtime::{channels, Event, EventSource, Frontend, Receivers, RuntimeConfig, Senders};

/// Counts renders and teardowns.
#[derive(Clone, Default)]
pub struct RecordingFrontend {
    pub renders: Arc<AtomicUsize>,
    pub teardowns: Arc<AtomicUsize>,
}

impl RecordingFrontend {
    pub fn renders(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }

    pub fn teardowns(&self) -> usize {
        self.teardowns.load(Ordering::SeqCst)
    }
}

impl Frontend for RecordingFrontend {
    fn render(&mut self, _session: &Session) -> io::Result<()> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn teardown(&mut self) {
        self.teardowns.fetch_add(1, Ordering::SeqCst);
    }
}

/// Yields a fixed list of events, then nothing.
pub struct ScriptedEvents {
    events: VecDeque<Event>,
    pub polls: Arc<AtomicUsize>,
}

impl ScriptedEvents {
    pub fn new(events: impl IntoIterator<Item = Event>) -> Self {
        Self {
            events: events.into_iter().collect(),
            polls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl EventSource for ScriptedEvents {
    fn poll_event(&mut self) -> Option<Event> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let event = self.events.pop_front();
        if event.is_none() {
            thread::sleep(Duration::from_millis(5));
        }
        event
    }
}

pub fn session(root: &Path, senders: &Senders) -> Session {
    Session::new(
        ConfigDir::new(root),
        Settings::defaults(),
        senders.session_handles(),
        DeferredStdout::new(),
    )
}

pub fn setup(root: &Path) -> (Session, Senders, Receivers) {
    let (senders, receivers) = channels(&RuntimeConfig::default());
    let session = session(root, &senders);
    (session, senders, receivers)
}

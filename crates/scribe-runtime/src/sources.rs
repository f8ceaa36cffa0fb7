//! Event source channels and the readiness multiplexer.
//!
//! The router waits on seven sources in a fixed order: job results, the
//! autosave tick, terminal-close notifications, input events, redraw
//! requests, reload signals and terminate signals. Each wait starts polling
//! at the source after the one dispatched last, so a source that is always
//! ready cannot starve the others. A source whose senders are all gone is
//! never ready again.
//!
//! Panics caught on background threads arrive on a separate fault channel
//! that is checked before the rotation starts.

use std::future::poll_fn;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use scribe_core::jobs::{self, JobResult, JobSender};
use scribe_core::notify::{close_channel, redraw_channel, CloseNotifier, RedrawHandle, CLOSE_QUEUE_CAPACITY};
use scribe_core::SessionHandles;

use crate::config::RuntimeConfig;
use crate::error::{FaultSender, ThreadFault};
use crate::event::Event;

/// Sending halves of every router channel.
#[derive(Debug, Clone)]
pub struct Senders {
    pub jobs: JobSender,
    pub redraw: RedrawHandle,
    pub close_terms: CloseNotifier,
    pub input: mpsc::Sender<Event>,
    pub terminate: mpsc::Sender<()>,
    pub reload: mpsc::Sender<()>,
    pub faults: FaultSender,
}

impl Senders {
    /// Handles stored in the session for code running inside dispatches.
    pub fn session_handles(&self) -> SessionHandles {
        SessionHandles {
            jobs: self.jobs.clone(),
            redraw: self.redraw.clone(),
            close_terms: self.close_terms.clone(),
        }
    }
}

/// Receiving halves of every router channel.
#[derive(Debug)]
pub struct Receivers {
    pub jobs: mpsc::Receiver<JobResult>,
    pub redraw: mpsc::Receiver<()>,
    pub close_terms: mpsc::Receiver<()>,
    pub input: mpsc::Receiver<Event>,
    pub terminate: mpsc::Receiver<()>,
    pub reload: mpsc::Receiver<()>,
    pub faults: mpsc::UnboundedReceiver<ThreadFault>,
}

/// Creates every router channel.
pub fn channels(config: &RuntimeConfig) -> (Senders, Receivers) {
    let (jobs, jobs_rx) = jobs::channel(config.job_queue_capacity);
    let (redraw, redraw_rx) = redraw_channel(config.redraw_queue_capacity);
    let (close_terms, close_rx) = close_channel(CLOSE_QUEUE_CAPACITY);
    let (input, input_rx) = mpsc::channel(1);
    let (terminate, terminate_rx) = mpsc::channel(1);
    let (reload, reload_rx) = mpsc::channel(1);
    let (faults, faults_rx) = mpsc::unbounded_channel();

    (
        Senders {
            jobs,
            redraw,
            close_terms,
            input,
            terminate,
            reload,
            faults,
        },
        Receivers {
            jobs: jobs_rx,
            redraw: redraw_rx,
            close_terms: close_rx,
            input: input_rx,
            terminate: terminate_rx,
            reload: reload_rx,
            faults: faults_rx,
        },
    )
}

/// Which source produced a [`Ready`] value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Job,
    Autosave,
    CloseTerminal,
    Input,
    Redraw,
    Reload,
    Terminate,
    /// Not part of the rotation.
    Fault,
}

/// Polling order. Fairness rotates through it.
pub const SOURCE_ORDER: [SourceKind; 7] = [
    SourceKind::Job,
    SourceKind::Autosave,
    SourceKind::CloseTerminal,
    SourceKind::Input,
    SourceKind::Redraw,
    SourceKind::Reload,
    SourceKind::Terminate,
];

/// One ready source with its payload.
#[derive(Debug)]
pub enum Ready {
    Job(JobResult),
    Autosave,
    CloseTerminal,
    Input(Event),
    Redraw,
    Reload,
    Terminate,
    Fault(ThreadFault),
}

impl Ready {
    pub fn kind(&self) -> SourceKind {
        match self {
            Ready::Job(_) => SourceKind::Job,
            Ready::Autosave => SourceKind::Autosave,
            Ready::CloseTerminal => SourceKind::CloseTerminal,
            Ready::Input(_) => SourceKind::Input,
            Ready::Redraw => SourceKind::Redraw,
            Ready::Reload => SourceKind::Reload,
            Ready::Terminate => SourceKind::Terminate,
            Ready::Fault(_) => SourceKind::Fault,
        }
    }
}

/// A closed channel is treated as never ready.
fn open<T>(poll: Poll<Option<T>>) -> Poll<T> {
    match poll {
        Poll::Ready(Some(value)) => Poll::Ready(value),
        Poll::Ready(None) | Poll::Pending => Poll::Pending,
    }
}

/// Readiness multiplexer over the router's sources.
#[derive(Debug)]
pub struct Sources {
    rx: Receivers,
    autosave: Option<Interval>,
    next: usize,
}

impl Sources {
    /// Creates the multiplexer. The autosave timer, when armed, first fires
    /// one full period from now.
    ///
    /// Must be called from within a tokio runtime when `autosave` is set.
    pub fn new(rx: Receivers, autosave: Option<Duration>) -> Self {
        let autosave = autosave.map(|period| {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
        Self {
            rx,
            autosave,
            next: 0,
        }
    }

    pub fn autosave_armed(&self) -> bool {
        self.autosave.is_some()
    }

    /// Waits for the next ready source.
    pub async fn next(&mut self) -> Ready {
        poll_fn(|cx| self.poll_next(cx)).await
    }

    fn poll_next(&mut self, cx: &mut Context<'_>) -> Poll<Ready> {
        if let Poll::Ready(Some(fault)) = self.rx.faults.poll_recv(cx) {
            return Poll::Ready(Ready::Fault(fault));
        }
        for offset in 0..SOURCE_ORDER.len() {
            let index = (self.next + offset) % SOURCE_ORDER.len();
            if let Poll::Ready(ready) = self.poll_source(SOURCE_ORDER[index], cx) {
                self.next = (index + 1) % SOURCE_ORDER.len();
                return Poll::Ready(ready);
            }
        }
        Poll::Pending
    }

    fn poll_source(&mut self, kind: SourceKind, cx: &mut Context<'_>) -> Poll<Ready> {
        match kind {
            SourceKind::Job => open(self.rx.jobs.poll_recv(cx)).map(Ready::Job),
            SourceKind::Autosave => match self.autosave.as_mut() {
                Some(interval) => interval.poll_tick(cx).map(|_| Ready::Autosave),
                None => Poll::Pending,
            },
            SourceKind::CloseTerminal => {
                open(self.rx.close_terms.poll_recv(cx)).map(|()| Ready::CloseTerminal)
            }
            SourceKind::Input => open(self.rx.input.poll_recv(cx)).map(Ready::Input),
            SourceKind::Redraw => open(self.rx.redraw.poll_recv(cx)).map(|()| Ready::Redraw),
            SourceKind::Reload => open(self.rx.reload.poll_recv(cx)).map(|()| Ready::Reload),
            SourceKind::Terminate => {
                open(self.rx.terminate.poll_recv(cx)).map(|()| Ready::Terminate)
            }
            SourceKind::Fault => open(self.rx.faults.poll_recv(cx)).map(Ready::Fault),
        }
    }

    /// Consumes up to `limit` queued redraw requests without waiting.
    pub fn drain_redraws(&mut self, limit: usize) -> usize {
        let mut drained = 0;
        while drained < limit && self.rx.redraw.try_recv().is_ok() {
            drained += 1;
        }
        drained
    }

    /// Waits up to `timeout` for one input event.
    pub async fn first_input(&mut self, timeout: Duration) -> Option<Event> {
        time::timeout(timeout, self.rx.input.recv())
            .await
            .ok()
            .flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_core::{JobOrigin, Session};

    fn job() -> JobResult {
        JobResult::new(
            "",
            Vec::new(),
            JobOrigin::Editor,
            Box::new(|_: &mut Session, _: String, _: Vec<String>| {}),
        )
    }

    #[tokio::test]
    async fn test_round_robin_prevents_starvation() {
        let (tx, rx) = channels(&RuntimeConfig::default());
        let mut sources = Sources::new(rx, None);

        for _ in 0..3 {
            tx.jobs.post(job());
        }
        tx.input.send(Event::Input(crossterm::event::Event::FocusGained)).await.unwrap();
        tx.terminate.send(()).await.unwrap();

        let mut kinds = Vec::new();
        for _ in 0..5 {
            kinds.push(sources.next().await.kind());
        }

        assert_eq!(
            kinds,
            vec![
                SourceKind::Job,
                SourceKind::Input,
                SourceKind::Terminate,
                SourceKind::Job,
                SourceKind::Job,
            ]
        );
    }

    #[tokio::test]
    async fn test_closed_source_is_never_ready() {
        let (tx, rx) = channels(&RuntimeConfig::default());
        let mut sources = Sources::new(rx, None);
        let Senders { reload, redraw, .. } = tx;
        drop(reload);

        assert!(redraw.request());
        assert_eq!(sources.next().await.kind(), SourceKind::Redraw);

        let waited = time::timeout(Duration::from_millis(20), sources.next()).await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn test_fault_preempts_rotation() {
        let (tx, rx) = channels(&RuntimeConfig::default());
        let mut sources = Sources::new(rx, None);
        tx.jobs.post(job());
        tx.faults
            .send(ThreadFault::new("input-poller", Box::new("boom")))
            .unwrap();

        match sources.next().await {
            Ready::Fault(fault) => assert_eq!(fault.message(), "input-poller thread panicked: boom"),
            other => panic!("expected fault, got {other:?}"),
        }
        assert_eq!(sources.next().await.kind(), SourceKind::Job);
    }

    #[tokio::test]
    async fn test_drain_is_capped() {
        let (tx, rx) = channels(&RuntimeConfig::default());
        let mut sources = Sources::new(rx, None);
        for _ in 0..5 {
            tx.redraw.request();
        }

        assert_eq!(sources.drain_redraws(3), 3);
        assert_eq!(sources.drain_redraws(10), 2);
        assert_eq!(sources.drain_redraws(10), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_autosave_ticks_after_one_period() {
        let (_tx, rx) = channels(&RuntimeConfig::default());
        let mut sources = Sources::new(rx, Some(Duration::from_secs(5)));
        let start = Instant::now();

        assert_eq!(sources.next().await.kind(), SourceKind::Autosave);
        assert!(start.elapsed() >= Duration::from_secs(5));
    }
}

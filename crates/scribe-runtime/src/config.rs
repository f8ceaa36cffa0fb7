//! Runtime configuration.

use std::time::Duration;

use scribe_core::notify::REDRAW_QUEUE_CAPACITY;

/// Configuration for the event loop.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Capacity of the background job result queue.
    pub job_queue_capacity: usize,
    /// Capacity of the redraw request queue.
    pub redraw_queue_capacity: usize,
    /// Most queued redraw requests consumed by one redraw dispatch.
    pub redraw_drain_limit: usize,
    /// How long to wait for the first terminal event before the loop starts.
    pub initial_event_timeout: Duration,
    /// Whether to install terminate and reload signal listeners.
    pub handle_signals: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            job_queue_capacity: 100,
            redraw_queue_capacity: REDRAW_QUEUE_CAPACITY,
            redraw_drain_limit: REDRAW_QUEUE_CAPACITY,
            initial_event_timeout: Duration::from_millis(10),
            handle_signals: true,
        }
    }
}

impl RuntimeConfig {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the job queue capacity.
    pub fn with_job_queue_capacity(mut self, capacity: usize) -> Self {
        self.job_queue_capacity = capacity.max(1);
        self
    }

    /// Sets the redraw drain limit.
    pub fn with_redraw_drain_limit(mut self, limit: usize) -> Self {
        self.redraw_drain_limit = limit;
        self
    }

    /// Sets the initial event timeout.
    pub fn with_initial_event_timeout(mut self, timeout: Duration) -> Self {
        self.initial_event_timeout = timeout;
        self
    }

    /// Enables or disables signal listeners.
    pub fn with_signals(mut self, enabled: bool) -> Self {
        self.handle_signals = enabled;
        self
    }
}

/// Converts the `autosave` option (seconds) to a timer period.
///
/// Zero, negative and non-finite values disable autosave.
pub fn autosave_period(seconds: f64) -> Option<Duration> {
    if seconds.is_finite() && seconds > 0.0 {
        Some(Duration::from_secs_f64(seconds))
    } else {
        None
    }
}

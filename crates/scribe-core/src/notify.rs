//! Payload-free notifications consumed by the event router.

use tokio::sync::mpsc;

/// Queue capacity for redraw requests. A full queue already guarantees a
/// pending redraw, so further requests are dropped.
pub const REDRAW_QUEUE_CAPACITY: usize = 8;

/// Queue capacity for terminal-close notifications.
pub const CLOSE_QUEUE_CAPACITY: usize = 8;

/// Requests a repaint from outside a dispatch. The signal listener uses it
/// when the process resumes after a stop.
#[derive(Debug, Clone)]
pub struct RedrawHandle {
    tx: mpsc::Sender<()>,
}

impl RedrawHandle {
    /// Returns false when the request was coalesced into a pending one.
    pub fn request(&self) -> bool {
        self.tx.try_send(()).is_ok()
    }
}

pub fn redraw_channel(capacity: usize) -> (RedrawHandle, mpsc::Receiver<()>) {
    let (tx, rx) = mpsc::channel(capacity);
    (RedrawHandle { tx }, rx)
}

/// Signals that an embedded terminal closed.
///
/// Terminal panes live outside this workspace. They hold a clone from
/// [`Session::close_terms`](crate::Session::close_terms); the router consumes
/// the notification without touching state.
#[derive(Debug, Clone)]
pub struct CloseNotifier {
    tx: mpsc::Sender<()>,
}

impl CloseNotifier {
    pub fn notify(&self) -> bool {
        self.tx.try_send(()).is_ok()
    }
}

pub fn close_channel(capacity: usize) -> (CloseNotifier, mpsc::Receiver<()>) {
    let (tx, rx) = mpsc::channel(capacity);
    (CloseNotifier { tx }, rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redraw_requests_coalesce_when_full() {
        let (handle, mut rx) = redraw_channel(2);

        assert!(handle.request());
        assert!(handle.request());
        assert!(!handle.request());

        let mut pending = 0;
        while rx.try_recv().is_ok() {
            pending += 1;
        }
        assert_eq!(pending, 2);
    }
}

//! Locks shared between the router, the poller and the crash boundary.

use std::sync::{Arc, Mutex, MutexGuard};

/// Serializes every state mutation.
///
/// Poisoning is ignored: after a panic the crash boundary still needs the
/// session to back up buffers.
#[derive(Debug, Default)]
pub struct MutationLock<T> {
    inner: Arc<Mutex<T>>,
}

impl<T> Clone for MutationLock<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> MutationLock<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(value)),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Runs `f` with the lock held.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.lock())
    }
}

/// Guards terminal access between the input poller and code that suspends
/// the screen.
#[derive(Debug, Clone, Default)]
pub struct ScreenLock {
    inner: Arc<Mutex<()>>,
}

impl ScreenLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock(&self) -> MutexGuard<'_, ()> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

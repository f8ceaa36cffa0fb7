//! Deferred standard output.
//!
//! When standard output is not a terminal, buffers tagged for piped output
//! write their content here when finalized. The binary flushes it once, after
//! the editor has released the terminal.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

/// Process-wide deferred stdout text.
#[derive(Debug, Clone, Default)]
pub struct DeferredStdout {
    data: Arc<Mutex<Vec<u8>>>,
}

impl DeferredStdout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends bytes.
    pub fn write(&self, bytes: &[u8]) {
        self.data
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(bytes);
    }

    pub fn len(&self) -> usize {
        self.data.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Takes the accumulated bytes, leaving the buffer empty.
    pub fn take(&self) -> Vec<u8> {
        std::mem::take(&mut *self.data.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Writes the accumulated bytes to `out` and empties the buffer.
    pub fn flush_to(&self, mut out: impl Write) -> io::Result<()> {
        let bytes = self.take();
        if bytes.is_empty() {
            return Ok(());
        }
        out.write_all(&bytes)?;
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_between_clones() {
        let stdout = DeferredStdout::new();
        let clone = stdout.clone();

        clone.write(b"hello");

        assert_eq!(stdout.len(), 5);
    }

    #[test]
    fn test_flush_drains() {
        let stdout = DeferredStdout::new();
        stdout.write(b"abc");

        let mut out = Vec::new();
        stdout.flush_to(&mut out).unwrap();

        assert_eq!(out, b"abc");
        assert!(stdout.is_empty());
    }
}

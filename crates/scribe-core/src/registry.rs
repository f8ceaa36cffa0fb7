//! Registry of open buffers.
//!
//! The registry is the only owner of buffers for the lifetime of the process.
//! Bulk operations treat every buffer independently: one buffer failing never
//! stops the others from being processed.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::buffer::{Buffer, BufferId, BufferKind, Loc, SaveOptions};
use crate::error::{CoreError, Result};
use crate::stdout::DeferredStdout;

/// Outcome of backing up every open buffer.
#[derive(Debug, Default)]
pub struct BackupReport {
    pub written: Vec<PathBuf>,
    pub failed: Vec<(BufferId, CoreError)>,
}

/// Owner of every open buffer.
#[derive(Debug)]
pub struct BufferRegistry {
    buffers: Vec<Buffer>,
    next_id: u64,
    backup_dir: PathBuf,
    stdout: DeferredStdout,
}

impl BufferRegistry {
    pub fn new(backup_dir: impl Into<PathBuf>, stdout: DeferredStdout) -> Self {
        Self {
            buffers: Vec::new(),
            next_id: 1,
            backup_dir: backup_dir.into(),
            stdout,
        }
    }

    fn allocate_id(&mut self) -> BufferId {
        let id = BufferId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Opens a file into a new buffer.
    pub fn open(&mut self, path: &Path, kind: BufferKind, start: Option<Loc>) -> Result<BufferId> {
        let id = self.allocate_id();
        let buffer = Buffer::open(id, path, kind, start)?;
        self.buffers.push(buffer);
        Ok(id)
    }

    /// Creates a buffer from in-memory text.
    pub fn from_text(&mut self, text: &str, kind: BufferKind, start: Option<Loc>) -> BufferId {
        let id = self.allocate_id();
        self.buffers
            .push(Buffer::from_text(id, text, None, kind, start));
        id
    }

    pub fn get(&self, id: BufferId) -> Option<&Buffer> {
        self.buffers.iter().find(|b| b.id() == id)
    }

    pub fn get_mut(&mut self, id: BufferId) -> Option<&mut Buffer> {
        self.buffers.iter_mut().find(|b| b.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Buffer> {
        self.buffers.iter()
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    pub fn any_modified(&self) -> bool {
        self.buffers.iter().any(Buffer::modified)
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Saves one buffer and drops its now-stale backup.
    pub fn save(&mut self, id: BufferId, opts: SaveOptions) -> Result<()> {
        let backup_dir = self.backup_dir.clone();
        let buffer = self
            .get_mut(id)
            .ok_or_else(|| CoreError::Command(format!("no buffer {}", id)))?;
        buffer.save(opts)?;
        let _ = std::fs::remove_file(backup_dir.join(buffer.backup_name()));
        Ok(())
    }

    /// Saves every open buffer. Failures are collected, never escalated.
    pub fn save_all(&mut self, opts: SaveOptions) -> Vec<(BufferId, CoreError)> {
        let ids: Vec<BufferId> = self.buffers.iter().map(Buffer::id).collect();
        let mut failed = Vec::new();
        for id in ids {
            if let Err(e) = self.save(id, opts) {
                debug!(buffer = %id, error = %e, "save failed");
                failed.push((id, e));
            }
        }
        failed
    }

    /// Finalizes every buffer whose modified flag is false.
    ///
    /// Modified buffers are left untouched so their backups survive.
    pub fn finalize_unmodified(&mut self) -> usize {
        let mut count = 0;
        for buffer in self.buffers.iter_mut().filter(|b| !b.modified()) {
            buffer.finalize(&self.backup_dir, &self.stdout);
            count += 1;
        }
        count
    }

    /// Finalizes every buffer regardless of its modified flag.
    pub fn finalize_all(&mut self) -> usize {
        for buffer in &mut self.buffers {
            buffer.finalize(&self.backup_dir, &self.stdout);
        }
        self.buffers.len()
    }

    /// Backs up every open buffer exactly once, regardless of modified state.
    pub fn backup_all(&self) -> BackupReport {
        let mut report = BackupReport::default();
        for buffer in &self.buffers {
            match buffer.backup(&self.backup_dir) {
                Ok(path) => report.written.push(path),
                Err(e) => {
                    warn!(buffer = %buffer.id(), error = %e, "backup failed");
                    report.failed.push((buffer.id(), e));
                }
            }
        }
        report
    }
}

//! Open documents.
//!
//! A buffer is a list of lines plus a cursor and a file binding. Text storage
//! is deliberately simple; the runtime only relies on the modified flag and
//! the save / backup / finalize operations.

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::atomic::atomic_write;
use crate::error::{CoreError, Result};
use crate::settings::Settings;
use crate::stdout::DeferredStdout;

/// A 0-indexed position in a buffer. `col` counts characters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Loc {
    pub line: usize,
    pub col: usize,
}

impl Loc {
    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

/// How a buffer behaves when it is closed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BufferKind {
    /// Regular file-backed buffer.
    #[default]
    Default,
    /// Standard output is piped: content is emitted on stdout when finalized.
    Stdout,
}

/// Identifier of a buffer inside the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub(crate) u64);

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Line terminator a buffer writes back out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineEnding {
    #[default]
    Unix,
    Dos,
}

impl LineEnding {
    /// `Dos` only when every line break in `text` is `\r\n`. Mixed text
    /// stays `Unix` and keeps its carriage returns inside the lines.
    pub fn detect(text: &str) -> Self {
        let breaks = text.matches('\n').count();
        if breaks > 0 && text.matches("\r\n").count() == breaks {
            LineEnding::Dos
        } else {
            LineEnding::Unix
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Unix => "\n",
            LineEnding::Dos => "\r\n",
        }
    }
}

/// Options applied when writing a buffer to disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveOptions {
    pub eof_newline: bool,
    pub dos_line_endings: bool,
}

impl SaveOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            eof_newline: settings.bool("eofnewline"),
            dos_line_endings: settings.text("fileformat") == "dos",
        }
    }
}

/// An open document.
#[derive(Debug, Clone)]
pub struct Buffer {
    id: BufferId,
    path: Option<PathBuf>,
    kind: BufferKind,
    lines: Vec<String>,
    line_ending: LineEnding,
    cursor: Loc,
    modified: bool,
    finalized: bool,
}

impl Buffer {
    /// Opens a file. A path that does not exist yet yields an empty buffer
    /// bound to that path.
    pub fn open(id: BufferId, path: &Path, kind: BufferKind, start: Option<Loc>) -> Result<Self> {
        if path.is_dir() {
            return Err(CoreError::IsDirectory(path.to_path_buf()));
        }
        let text = match fs::read(path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
            Err(source) => {
                return Err(CoreError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        debug!(path = %path.display(), bytes = text.len(), "opened buffer");
        Ok(Self::from_text(id, &text, Some(absolute(path)), kind, start))
    }

    /// Creates a buffer from in-memory text.
    pub fn from_text(
        id: BufferId,
        text: &str,
        path: Option<PathBuf>,
        kind: BufferKind,
        start: Option<Loc>,
    ) -> Self {
        let line_ending = LineEnding::detect(text);
        let lines: Vec<String> = match line_ending {
            LineEnding::Dos => text.split("\r\n").map(str::to_string).collect(),
            LineEnding::Unix => text.split('\n').map(str::to_string).collect(),
        };
        let mut buffer = Self {
            id,
            path,
            kind,
            lines,
            line_ending,
            cursor: Loc::default(),
            modified: false,
            finalized: false,
        };
        if let Some(start) = start {
            buffer.set_cursor(start);
        }
        buffer
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn kind(&self) -> BufferKind {
        self.kind
    }

    /// Display name: the file path, or `No name`.
    pub fn name(&self) -> String {
        match &self.path {
            Some(path) => path.display().to_string(),
            None => "No name".to_string(),
        }
    }

    pub fn modified(&self) -> bool {
        self.modified
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn cursor(&self) -> Loc {
        self.cursor
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// Content with the line endings it was read with.
    pub fn text(&self) -> String {
        self.lines.join(self.line_ending.as_str())
    }

    /// Binds the buffer to a new path. Used by `save <path>`.
    pub fn set_path(&mut self, path: &Path) {
        self.path = Some(absolute(path));
    }

    /// Moves the cursor, clamping it to the content.
    pub fn set_cursor(&mut self, loc: Loc) {
        let line = loc.line.min(self.lines.len().saturating_sub(1));
        let col = loc.col.min(self.line_len(line));
        self.cursor = Loc::new(line, col);
    }

    fn line_len(&self, line: usize) -> usize {
        self.lines.get(line).map_or(0, |l| l.chars().count())
    }

    /// Writes the buffer to its file.
    pub fn save(&mut self, opts: SaveOptions) -> Result<()> {
        let path = self.path.clone().ok_or(CoreError::NoFileName)?;
        let ending = if opts.dos_line_endings {
            LineEnding::Dos
        } else {
            self.line_ending
        };
        let mut text = self.lines.join(ending.as_str());
        if opts.eof_newline && !text.is_empty() && !text.ends_with('\n') {
            text.push_str(ending.as_str());
        }
        fs::write(&path, text).map_err(|source| CoreError::Write {
            path: path.clone(),
            source,
        })?;
        self.modified = false;
        debug!(buffer = %self.id, path = %path.display(), "saved buffer");
        Ok(())
    }

    /// File name used for this buffer's backup inside the backups directory.
    pub fn backup_name(&self) -> String {
        match &self.path {
            Some(path) => escape_path(path),
            None => format!("unnamed-{}", self.id),
        }
    }

    /// Writes the buffer content to the backups directory, whatever its
    /// modified state.
    pub fn backup(&self, dir: &Path) -> Result<PathBuf> {
        let target = dir.join(self.backup_name());
        atomic_write(&target, self.text().as_bytes())?;
        Ok(target)
    }

    /// Releases the buffer: its backup is removed and piped-output buffers
    /// emit their content. Calling it again is a no-op.
    pub fn finalize(&mut self, backup_dir: &Path, stdout: &DeferredStdout) {
        if self.finalized {
            return;
        }
        let backup = backup_dir.join(self.backup_name());
        if let Err(e) = fs::remove_file(&backup) {
            if e.kind() != ErrorKind::NotFound {
                warn!(buffer = %self.id, error = %e, "failed to remove backup");
            }
        }
        if self.kind == BufferKind::Stdout {
            stdout.write(self.text().as_bytes());
        }
        self.finalized = true;
    }

    pub fn insert_char(&mut self, c: char) {
        let Loc { line, col } = self.cursor;
        let idx = byte_index(&self.lines[line], col);
        self.lines[line].insert(idx, c);
        self.cursor.col += 1;
        self.modified = true;
    }

    /// Inserts text that may span several lines.
    pub fn insert_text(&mut self, text: &str) {
        let text = text.replace("\r\n", "\n");
        for (i, part) in text.split('\n').enumerate() {
            if i > 0 {
                self.insert_newline(false);
            }
            for c in part.chars() {
                self.insert_char(c);
            }
        }
    }

    /// Splits the current line. With `autoindent` the new line copies the
    /// leading whitespace of the current one.
    pub fn insert_newline(&mut self, autoindent: bool) {
        let Loc { line, col } = self.cursor;
        let idx = byte_index(&self.lines[line], col);
        let rest = self.lines[line].split_off(idx);
        let indent: String = if autoindent {
            self.lines[line]
                .chars()
                .take_while(|c| c.is_whitespace())
                .collect()
        } else {
            String::new()
        };
        let col = indent.chars().count();
        self.lines.insert(line + 1, indent + &rest);
        self.cursor = Loc::new(line + 1, col);
        self.modified = true;
    }

    /// Deletes the character before the cursor, joining lines at column 0.
    pub fn backspace(&mut self) {
        let Loc { line, col } = self.cursor;
        if col > 0 {
            let idx = byte_index(&self.lines[line], col - 1);
            self.lines[line].remove(idx);
            self.cursor.col -= 1;
        } else if line > 0 {
            let current = self.lines.remove(line);
            let prev_len = self.line_len(line - 1);
            self.lines[line - 1].push_str(&current);
            self.cursor = Loc::new(line - 1, prev_len);
        } else {
            return;
        }
        self.modified = true;
    }

    pub fn move_left(&mut self) {
        let Loc { line, col } = self.cursor;
        if col > 0 {
            self.cursor.col -= 1;
        } else if line > 0 {
            self.cursor = Loc::new(line - 1, self.line_len(line - 1));
        }
    }

    pub fn move_right(&mut self) {
        let Loc { line, col } = self.cursor;
        if col < self.line_len(line) {
            self.cursor.col += 1;
        } else if line + 1 < self.lines.len() {
            self.cursor = Loc::new(line + 1, 0);
        }
    }

    pub fn move_up(&mut self) {
        if self.cursor.line > 0 {
            self.set_cursor(Loc::new(self.cursor.line - 1, self.cursor.col));
        }
    }

    pub fn move_down(&mut self) {
        self.set_cursor(Loc::new(self.cursor.line + 1, self.cursor.col));
    }

    pub fn move_home(&mut self) {
        self.cursor.col = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor.col = self.line_len(self.cursor.line);
    }

    /// The text of the cursor line.
    pub fn current_line(&self) -> &str {
        &self.lines[self.cursor.line]
    }
}

fn byte_index(line: &str, col: usize) -> usize {
    line.char_indices().nth(col).map_or(line.len(), |(i, _)| i)
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Flattens an absolute path into a single file name.
pub fn escape_path(path: &Path) -> String {
    path.to_string_lossy().replace('/', "%")
}

/// Reverses [`escape_path`].
pub fn unescape_path(name: &str) -> PathBuf {
    PathBuf::from(name.replace('%', "/"))
}

/// Deletes backups whose original file no longer exists.
///
/// Returns the removed backup paths.
pub fn clean_orphan_backups(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(CoreError::Read {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    let mut removed = Vec::new();
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        let orphan = name.starts_with("unnamed-") || !unescape_path(&name).exists();
        if !orphan {
            continue;
        }
        let path = entry.path();
        fs::remove_file(&path).map_err(|source| CoreError::Write {
            path: path.clone(),
            source,
        })?;
        removed.push(path);
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn id(n: u64) -> BufferId {
        BufferId(n)
    }

    #[test]
    fn test_open_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("new.txt");

        let buffer = Buffer::open(id(1), &path, BufferKind::Default, None).unwrap();

        assert_eq!(buffer.text(), "");
        assert_eq!(buffer.path(), Some(path.as_path()));
        assert!(!buffer.modified());
    }

    #[test]
    fn test_open_directory_fails() {
        let dir = tempdir().unwrap();
        let result = Buffer::open(id(1), dir.path(), BufferKind::Default, None);
        assert!(matches!(result, Err(CoreError::IsDirectory(_))));
    }

    #[test]
    fn test_start_position_is_clamped() {
        let buffer = Buffer::from_text(
            id(1),
            "one\ntwo",
            None,
            BufferKind::Default,
            Some(Loc::new(10, 10)),
        );
        assert_eq!(buffer.cursor(), Loc::new(1, 3));
    }

    #[test]
    fn test_crlf_text_keeps_its_line_endings() {
        let buffer = Buffer::from_text(id(1), "one\r\ntwo\r\n", None, BufferKind::Default, None);

        assert_eq!(buffer.line_ending(), LineEnding::Dos);
        assert_eq!(buffer.lines(), ["one", "two", ""]);
        assert_eq!(buffer.text(), "one\r\ntwo\r\n");
    }

    #[test]
    fn test_mixed_line_endings_are_kept_verbatim() {
        let buffer = Buffer::from_text(id(1), "one\r\ntwo\n", None, BufferKind::Default, None);

        assert_eq!(buffer.line_ending(), LineEnding::Unix);
        assert_eq!(buffer.lines(), ["one\r", "two", ""]);
        assert_eq!(buffer.text(), "one\r\ntwo\n");
    }

    #[test]
    fn test_save_keeps_dos_file_dos() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("win.txt");
        fs::write(&path, "alpha\r\nbeta").unwrap();
        let mut buffer = Buffer::open(id(1), &path, BufferKind::Default, None).unwrap();
        buffer.set_cursor(Loc::new(1, 4));
        buffer.insert_char('!');

        let opts = SaveOptions {
            eof_newline: true,
            dos_line_endings: false,
        };
        buffer.save(opts).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "alpha\r\nbeta!\r\n");
    }

    #[test]
    fn test_piped_crlf_emits_unchanged() {
        let dir = tempdir().unwrap();
        let stdout = DeferredStdout::new();
        let mut buffer = Buffer::from_text(id(1), "x\r\ny\r\n", None, BufferKind::Stdout, None);

        buffer.finalize(dir.path(), &stdout);

        assert_eq!(stdout.take(), b"x\r\ny\r\n".to_vec());
    }

    #[test]
    fn test_editing_sets_modified() {
        let mut buffer = Buffer::from_text(id(1), "ab", None, BufferKind::Default, None);
        buffer.move_end();
        buffer.insert_char('c');
        buffer.insert_newline(false);
        buffer.insert_text("d\ne");

        assert!(buffer.modified());
        assert_eq!(buffer.text(), "abc\nd\ne");
        assert_eq!(buffer.cursor(), Loc::new(2, 1));
    }

    #[test]
    fn test_backspace_joins_lines() {
        let mut buffer =
            Buffer::from_text(id(1), "ab\ncd", None, BufferKind::Default, Some(Loc::new(1, 0)));
        buffer.backspace();
        assert_eq!(buffer.text(), "abcd");
        assert_eq!(buffer.cursor(), Loc::new(0, 2));
    }

    #[test]
    fn test_autoindent_copies_leading_whitespace() {
        let mut buffer = Buffer::from_text(id(1), "    let x;", None, BufferKind::Default, None);
        buffer.move_end();
        buffer.insert_newline(true);
        assert_eq!(buffer.lines()[1], "    ");
        assert_eq!(buffer.cursor(), Loc::new(1, 4));
    }

    #[test]
    fn test_save_writes_and_clears_modified() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let mut buffer = Buffer::open(id(1), &path, BufferKind::Default, None).unwrap();
        buffer.insert_text("hi");

        buffer
            .save(SaveOptions {
                eof_newline: true,
                dos_line_endings: false,
            })
            .unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "hi\n");
        assert!(!buffer.modified());
    }

    #[test]
    fn test_save_unnamed_fails() {
        let mut buffer = Buffer::from_text(id(1), "x", None, BufferKind::Default, None);
        assert!(matches!(
            buffer.save(SaveOptions::default()),
            Err(CoreError::NoFileName)
        ));
    }

    #[test]
    fn test_backup_and_finalize_removes_backup() {
        let dir = tempdir().unwrap();
        let backups = dir.path().join("backups");
        let stdout = DeferredStdout::new();
        let mut buffer = Buffer::from_text(id(7), "draft", None, BufferKind::Default, None);

        let backup = buffer.backup(&backups).unwrap();
        assert_eq!(fs::read_to_string(&backup).unwrap(), "draft");
        assert!(backup.ends_with("unnamed-7"));

        buffer.finalize(&backups, &stdout);
        assert!(!backup.exists());
        assert!(buffer.is_finalized());
        assert!(stdout.is_empty());
    }

    #[test]
    fn test_finalize_stdout_buffer_emits_once() {
        let dir = tempdir().unwrap();
        let stdout = DeferredStdout::new();
        let mut buffer = Buffer::from_text(id(1), "piped", None, BufferKind::Stdout, None);

        buffer.finalize(dir.path(), &stdout);
        buffer.finalize(dir.path(), &stdout);

        assert_eq!(stdout.take(), b"piped");
    }

    #[test]
    fn test_escape_round_trip() {
        let path = Path::new("/home/user/notes.txt");
        assert_eq!(escape_path(path), "%home%user%notes.txt");
        assert_eq!(unescape_path(&escape_path(path)), path);
    }

    #[test]
    fn test_clean_orphan_backups() {
        let dir = tempdir().unwrap();
        let backups = dir.path().join("backups");
        fs::create_dir_all(&backups).unwrap();
        let live = dir.path().join("live.txt");
        fs::write(&live, "x").unwrap();
        fs::write(backups.join(escape_path(&live)), "x").unwrap();
        fs::write(backups.join(escape_path(&dir.path().join("gone.txt"))), "y").unwrap();

        let removed = clean_orphan_backups(&backups).unwrap();

        assert_eq!(removed.len(), 1);
        assert!(backups.join(escape_path(&live)).exists());
    }
}

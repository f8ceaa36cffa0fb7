//! The session context object.
//!
//! Exactly one `Session` exists per process. It owns every piece of mutable
//! editor state and is shared between the bootstrap, the event router and
//! job callbacks through the runtime's mutation lock.

use std::path::Path;

use tracing::{debug, warn};

use crate::bindings::KeyBindings;
use crate::buffer::{Buffer, BufferId, BufferKind, SaveOptions};
use crate::clipboard::{Clipboard, ClipboardMethod};
use crate::colorscheme::Colorscheme;
use crate::commands::CommandRegistry;
use crate::config::ConfigDir;
use crate::error::Result;
use crate::infobar::InfoBar;
use crate::jobs::JobSender;
use crate::notify::{CloseNotifier, RedrawHandle};
use crate::plugin::PluginHost;
use crate::registry::BufferRegistry;
use crate::runtime_files::RuntimeFiles;
use crate::settings::Settings;
use crate::stdout::DeferredStdout;
use crate::tabs::TabList;

/// Senders the session hands out to code that runs outside a dispatch.
#[derive(Debug, Clone)]
pub struct SessionHandles {
    pub jobs: JobSender,
    pub redraw: RedrawHandle,
    pub close_terms: CloseNotifier,
}

#[derive(Debug)]
pub struct Session {
    pub config: ConfigDir,
    pub settings: Settings,
    pub runtime_files: RuntimeFiles,
    pub colorscheme: Colorscheme,
    pub plugins: PluginHost,
    pub bindings: KeyBindings,
    pub commands: CommandRegistry,
    pub clipboard: Clipboard,
    pub buffers: BufferRegistry,
    pub tabs: TabList,
    pub infobar: InfoBar,
    size: (u16, u16),
    handles: SessionHandles,
    quit_requested: bool,
}

impl Session {
    /// Creates a session with default collaborators. The bootstrap replaces
    /// them step by step.
    pub fn new(
        config: ConfigDir,
        settings: Settings,
        handles: SessionHandles,
        stdout: DeferredStdout,
    ) -> Self {
        let buffers = BufferRegistry::new(config.backups_dir(), stdout);
        Self {
            config,
            settings,
            runtime_files: RuntimeFiles::default(),
            colorscheme: Colorscheme::builtin(),
            plugins: PluginHost::default(),
            bindings: KeyBindings::defaults(),
            commands: CommandRegistry::defaults(),
            clipboard: Clipboard::default(),
            buffers,
            tabs: TabList::default(),
            infobar: InfoBar::default(),
            size: (80, 24),
            handles,
            quit_requested: false,
        }
    }

    pub fn jobs(&self) -> &JobSender {
        &self.handles.jobs
    }

    pub fn redraw(&self) -> &RedrawHandle {
        &self.handles.redraw
    }

    pub fn close_terms(&self) -> &CloseNotifier {
        &self.handles.close_terms
    }

    /// Asks the router to end the session after the current dispatch.
    pub fn request_quit(&mut self) {
        self.quit_requested = true;
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    /// Terminal size as (width, height).
    pub fn size(&self) -> (u16, u16) {
        self.size
    }

    pub fn set_size(&mut self, width: u16, height: u16) {
        self.size = (width, height);
        self.adjust_scroll();
    }

    pub fn save_options(&self) -> SaveOptions {
        SaveOptions::from_settings(&self.settings)
    }

    /// Rows available to panes after the tab bar and info bar.
    pub fn editor_height(&self) -> u16 {
        let mut height = self.size.1;
        if self.tabs.len() > 1 {
            height = height.saturating_sub(1);
        }
        if self.settings.bool("infobar") {
            height = height.saturating_sub(1);
        }
        height
    }

    /// Text rows of each pane in the active tab, excluding status lines.
    pub fn pane_text_heights(&self) -> Vec<usize> {
        let Some(tab) = self.tabs.active() else {
            return Vec::new();
        };
        let status = u16::from(self.settings.bool("statusline"));
        let height = self.editor_height();
        match tab.split_dir() {
            crate::tabs::SplitDir::Horizontal => tab
                .pane_lengths(self.size.0, height)
                .into_iter()
                .map(|h| usize::from(h.saturating_sub(status)))
                .collect(),
            crate::tabs::SplitDir::Vertical => {
                vec![usize::from(height.saturating_sub(status)); tab.panes().len()]
            }
        }
    }

    pub fn active_buffer_id(&self) -> Option<BufferId> {
        self.tabs
            .active()
            .and_then(|t| t.active_pane())
            .map(|p| p.buffer())
    }

    pub fn active_buffer(&self) -> Option<&Buffer> {
        self.buffers.get(self.active_buffer_id()?)
    }

    pub fn active_buffer_mut(&mut self) -> Option<&mut Buffer> {
        let id = self.active_buffer_id()?;
        self.buffers.get_mut(id)
    }

    /// Scrolls every pane of the active tab so its cursor stays visible.
    pub fn adjust_scroll(&mut self) {
        let heights = self.pane_text_heights();
        let margin = self.settings.number("scrollmargin") as usize;
        let Some(tab) = self.tabs.active_mut() else {
            return;
        };
        for (pane, height) in tab.panes_mut().iter_mut().zip(heights) {
            let Some(buffer) = self.buffers.get(pane.buffer()) else {
                continue;
            };
            pane.scroll_to(buffer.cursor().line, height, margin);
        }
    }

    /// Opens a file in a new tab.
    pub fn open_in_new_tab(&mut self, path: &Path) -> Result<BufferId> {
        let id = self.buffers.open(path, BufferKind::Default, None)?;
        self.tabs.push(id);
        self.adjust_scroll();
        Ok(id)
    }

    /// Saves the active buffer and starts the `onsave` hooks.
    pub fn save_active(&mut self) -> Result<()> {
        let Some(id) = self.active_buffer_id() else {
            return Ok(());
        };
        let opts = self.save_options();
        self.buffers.save(id, opts)?;
        if let Some(buffer) = self.buffers.get(id) {
            let name = buffer.name();
            self.infobar.message(format!("Saved {}", name));
            let args = buffer
                .path()
                .map(|p| vec![p.display().to_string()])
                .unwrap_or_default();
            self.plugins.spawn_hook_jobs("onsave", args, &self.handles.jobs);
        }
        Ok(())
    }

    /// Saves every buffer. Used by autosave and the quit prompt.
    pub fn save_all(&mut self) -> usize {
        let failed = self.buffers.save_all(self.save_options());
        for (id, e) in &failed {
            debug!(buffer = %id, error = %e, "save failed");
        }
        failed.len()
    }

    /// Reacts to an option that changed at runtime.
    pub fn apply_setting(&mut self, option: &str) {
        match option {
            "colorscheme" => {
                let name = self.settings.text("colorscheme").to_string();
                match Colorscheme::load(&name, &self.runtime_files) {
                    Ok(scheme) => self.colorscheme = scheme,
                    Err(e) => self.infobar.error(e.to_string()),
                }
            }
            "clipboard" => {
                if let Ok(method) = ClipboardMethod::from_setting(self.settings.text("clipboard")) {
                    let (clipboard, err) = Clipboard::initialize(method);
                    self.clipboard = clipboard;
                    if let Some(e) = err {
                        warn!(error = %e, "clipboard fell back to the internal register");
                        self.infobar.error(e.to_string());
                    }
                }
            }
            "infobar" | "statusline" | "scrollmargin" => self.adjust_scroll(),
            _ => {}
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::session;
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_editor_height_accounts_for_bars() {
        let dir = tempdir().unwrap();
        let (mut s, _rx) = session(dir.path());
        let a = s.buffers.from_text("a", BufferKind::Default, None);
        let b = s.buffers.from_text("b", BufferKind::Default, None);

        s.tabs = TabList::from_buffers(&[a], "tab");
        s.set_size(80, 24);
        assert_eq!(s.editor_height(), 23);

        s.tabs = TabList::from_buffers(&[a, b], "tab");
        assert_eq!(s.editor_height(), 22);
        assert_eq!(s.pane_text_heights(), vec![21]);
    }

    #[test]
    fn test_open_in_new_tab_activates_it() {
        let dir = tempdir().unwrap();
        let (mut s, _rx) = session(dir.path());
        let first = s.buffers.from_text("", BufferKind::Default, None);
        s.tabs = TabList::from_buffers(&[first], "tab");

        let id = s.open_in_new_tab(&dir.path().join("new.txt")).unwrap();

        assert_eq!(s.tabs.len(), 2);
        assert_eq!(s.active_buffer_id(), Some(id));
    }

    #[test]
    fn test_save_active_writes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        let (mut s, _rx) = session(dir.path());
        let id = s.open_in_new_tab(&path).unwrap();
        s.buffers.get_mut(id).unwrap().insert_text("hi");

        s.save_active().unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hi\n");
        assert!(!s.active_buffer().unwrap().modified());
    }
}

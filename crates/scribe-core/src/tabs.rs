//! Tabs and panes.
//!
//! A tab holds one or more panes split in a single direction. Each pane is a
//! view onto a buffer and remembers its first visible line; the scroll
//! position is adjusted while dispatching input, never while rendering.

use crate::buffer::BufferId;

/// How a tab's panes are arranged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitDir {
    /// Panes stacked top to bottom.
    Horizontal,
    /// Panes side by side.
    Vertical,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pane {
    buffer: BufferId,
    top_line: usize,
}

impl Pane {
    pub fn new(buffer: BufferId) -> Self {
        Self {
            buffer,
            top_line: 0,
        }
    }

    pub fn buffer(&self) -> BufferId {
        self.buffer
    }

    pub fn top_line(&self) -> usize {
        self.top_line
    }

    /// Scrolls so that `cursor_line` is visible with `margin` lines of
    /// context where the height allows it.
    pub fn scroll_to(&mut self, cursor_line: usize, height: usize, margin: usize) {
        if height == 0 {
            self.top_line = cursor_line;
            return;
        }
        let margin = margin.min(height.saturating_sub(1) / 2);
        if cursor_line < self.top_line + margin {
            self.top_line = cursor_line.saturating_sub(margin);
        } else if cursor_line + margin >= self.top_line + height {
            self.top_line = cursor_line + margin + 1 - height;
        }
    }
}

#[derive(Debug, Clone)]
pub struct Tab {
    panes: Vec<Pane>,
    active: usize,
    split: SplitDir,
}

impl Tab {
    pub fn single(buffer: BufferId) -> Self {
        Self::split(vec![buffer], SplitDir::Horizontal)
    }

    /// Creates a tab with one pane per buffer. `buffers` must not be empty.
    fn split(buffers: Vec<BufferId>, split: SplitDir) -> Self {
        Self {
            panes: buffers.into_iter().map(Pane::new).collect(),
            active: 0,
            split,
        }
    }

    pub fn panes(&self) -> &[Pane] {
        &self.panes
    }

    pub fn panes_mut(&mut self) -> &mut [Pane] {
        &mut self.panes
    }

    pub fn split_dir(&self) -> SplitDir {
        self.split
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_pane(&self) -> Option<&Pane> {
        self.panes.get(self.active)
    }

    pub fn active_pane_mut(&mut self) -> Option<&mut Pane> {
        self.panes.get_mut(self.active)
    }

    pub fn next_pane(&mut self) {
        if !self.panes.is_empty() {
            self.active = (self.active + 1) % self.panes.len();
        }
    }

    /// Sizes of the pane areas along the split direction.
    ///
    /// Vertical splits reserve one column between neighbours for the divider.
    pub fn pane_lengths(&self, width: u16, height: u16) -> Vec<u16> {
        match self.split {
            SplitDir::Horizontal => split_lengths(height, self.panes.len()),
            SplitDir::Vertical => {
                let dividers = self.panes.len().saturating_sub(1) as u16;
                split_lengths(width.saturating_sub(dividers), self.panes.len())
            }
        }
    }
}

/// Divides `total` into `n` lengths, giving the remainder to the first ones.
pub fn split_lengths(total: u16, n: usize) -> Vec<u16> {
    if n == 0 {
        return Vec::new();
    }
    let n16 = n as u16;
    let base = total / n16;
    let extra = (total % n16) as usize;
    (0..n).map(|i| base + u16::from(i < extra)).collect()
}

/// Every open tab and the active one.
#[derive(Debug, Clone, Default)]
pub struct TabList {
    tabs: Vec<Tab>,
    active: usize,
}

impl TabList {
    /// Arranges the initial buffers according to the `multiopen` option.
    pub fn from_buffers(ids: &[BufferId], multiopen: &str) -> Self {
        let tabs = match (multiopen, ids) {
            (_, []) => Vec::new(),
            ("hsplit", _) => vec![Tab::split(ids.to_vec(), SplitDir::Horizontal)],
            ("vsplit", _) => vec![Tab::split(ids.to_vec(), SplitDir::Vertical)],
            _ => ids.iter().copied().map(Tab::single).collect(),
        };
        Self { tabs, active: 0 }
    }

    /// Adds a tab for `buffer` and makes it active.
    pub fn push(&mut self, buffer: BufferId) {
        self.tabs.push(Tab::single(buffer));
        self.active = self.tabs.len() - 1;
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tab> {
        self.tabs.iter()
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active(&self) -> Option<&Tab> {
        self.tabs.get(self.active)
    }

    pub fn active_mut(&mut self) -> Option<&mut Tab> {
        self.tabs.get_mut(self.active)
    }

    pub fn next(&mut self) {
        if !self.tabs.is_empty() {
            self.active = (self.active + 1) % self.tabs.len();
        }
    }

    pub fn previous(&mut self) {
        if !self.tabs.is_empty() {
            self.active = (self.active + self.tabs.len() - 1) % self.tabs.len();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: u64) -> Vec<BufferId> {
        (1..=n).map(BufferId).collect()
    }

    #[test]
    fn test_multiopen_arrangements() {
        let tabs = TabList::from_buffers(&ids(3), "tab");
        assert_eq!(tabs.len(), 3);

        let tabs = TabList::from_buffers(&ids(3), "vsplit");
        assert_eq!(tabs.len(), 1);
        let tab = tabs.active().unwrap();
        assert_eq!(tab.panes().len(), 3);
        assert_eq!(tab.split_dir(), SplitDir::Vertical);

        assert!(TabList::from_buffers(&[], "tab").is_empty());
    }

    #[test]
    fn test_tab_cycling_wraps() {
        let mut tabs = TabList::from_buffers(&ids(2), "tab");
        tabs.previous();
        assert_eq!(tabs.active_index(), 1);
        tabs.next();
        assert_eq!(tabs.active_index(), 0);

        tabs.push(BufferId(9));
        assert_eq!(tabs.active_index(), 2);
    }

    #[test]
    fn test_split_lengths_fill_total() {
        assert_eq!(split_lengths(10, 3), vec![4, 3, 3]);
        assert_eq!(split_lengths(7, 1), vec![7]);

        let tab = Tab::split(ids(2), SplitDir::Vertical);
        assert_eq!(tab.pane_lengths(81, 24), vec![40, 40]);
    }

    #[test]
    fn test_scroll_keeps_margin() {
        let mut pane = Pane::new(BufferId(1));

        pane.scroll_to(12, 10, 3);
        assert_eq!(pane.top_line(), 6);

        pane.scroll_to(7, 10, 3);
        assert_eq!(pane.top_line(), 4);

        pane.scroll_to(8, 10, 3);
        assert_eq!(pane.top_line(), 4);
    }
}

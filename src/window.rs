//! Chat windows and the window registry
//!
//! Each window owns a scrollback, a scrollable pane `rows - 2` tall and,
//! for channels, a nicklist pane at the right edge. Only `rows - 3` pane
//! rows are visible (the statusbar covers the last one), which is the
//! `HEIGHT` used by all scroll arithmetic.
//!
//! Scrolling freezes the view: while `scroll.mode` is set, appended lines
//! are stored but not painted, and `saved_size` remembers the buffer size
//! at the moment the view froze.

use tracing::debug;

use crate::colors::Palette;
use crate::error::WindowError;
use crate::nicklist::Nicklist;
use crate::paint::{self, represent_count};
use crate::scrollback::Scrollback;
use crate::surface::Surface;

pub const STATUS_LABEL: &str = "(status)";

/// Lines moved by a plain scroll step
pub const SCROLL_OFFSET: usize = 6;

/// Channel names start with one of `& # + !`
pub fn is_irc_channel(label: &str) -> bool {
    matches!(label.chars().next(), Some('&' | '#' | '+' | '!'))
}

/// Input prompt for a window
pub fn prompt_for(label: &str) -> String {
    if label.eq_ignore_ascii_case(STATUS_LABEL) {
        "> ".to_string()
    } else if is_irc_channel(label) {
        format!("{label}: ")
    } else {
        format!("{label}> ")
    }
}

/// Visible pane rows for a terminal `rows` tall
pub fn view_height(rows: u16) -> usize {
    rows.saturating_sub(3) as usize
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollState {
    pub mode: bool,
    pub saved_size: usize,
    pub count: usize,
}

impl ScrollState {
    fn at_top(&self) -> bool {
        self.saved_size > 0 && self.saved_size == self.count
    }
}

#[derive(Debug, Clone)]
pub struct Window {
    pub label: String,
    pub title: Option<String>,
    pub refnum: usize,
    pub scrollback: Scrollback,
    pub scroll: ScrollState,
    pub logging: bool,
    pub nicklist: Nicklist,
    pub chanmodes: String,
    pub received_names: bool,
    nick_width: u16,
    pane: Surface,
    nick_pane: Option<Surface>,
}

impl Window {
    pub fn new(
        label: &str,
        title: Option<&str>,
        refnum: usize,
        capacity: usize,
        rows: u16,
        cols: u16,
    ) -> Self {
        let mut window = Self {
            label: label.to_string(),
            title: title.filter(|t| !t.is_empty()).map(str::to_string),
            refnum,
            scrollback: Scrollback::new(capacity),
            scroll: ScrollState::default(),
            logging: false,
            nicklist: Nicklist::new(),
            chanmodes: String::new(),
            received_names: false,
            nick_width: 0,
            pane: Surface::scrolling(0, 0),
            nick_pane: None,
        };
        window.layout(rows, cols);
        window
    }

    pub fn is_status(&self) -> bool {
        self.label.eq_ignore_ascii_case(STATUS_LABEL)
    }

    pub fn is_channel(&self) -> bool {
        is_irc_channel(&self.label)
    }

    pub fn pane(&self) -> &Surface {
        &self.pane
    }

    pub fn nick_pane(&self) -> Option<&Surface> {
        self.nick_pane.as_ref()
    }

    /// Width reserved for the nicklist at the last layout (0 = none)
    pub fn nicklist_width(&self) -> u16 {
        self.nick_width
    }

    fn layout(&mut self, rows: u16, cols: u16) {
        let panel_rows = rows.saturating_sub(2);
        if self.is_channel() {
            let width = self.nicklist.width();
            self.nick_width = width;
            self.nick_pane
                .get_or_insert_with(|| Surface::new(width, panel_rows))
                .resize(width, panel_rows);
            self.pane.resize(cols.saturating_sub(width), panel_rows);
        } else {
            self.nick_width = 0;
            self.nick_pane = None;
            self.pane.resize(cols, panel_rows);
        }
    }

    /// Store a line and paint it unless the view is frozen
    pub fn append(&mut self, palette: &mut Palette, text: &str, indent: usize) {
        self.scrollback.append(text, indent);
        if !self.scroll.mode {
            paint::puts(&mut self.pane, Some(palette), text, indent, 0);
        }
    }

    /// Repaint from scrollback position `pos`.
    ///
    /// With `limited`, each line may use only the rows still free, so the
    /// view ends exactly at the last visible row.
    pub fn redraw(
        &mut self,
        palette: &mut Palette,
        rows: u16,
        pos: usize,
        limited: bool,
    ) -> Result<(), WindowError> {
        if self.scrollback.is_empty() {
            return Ok(());
        }
        if pos >= self.scrollback.len() {
            return Err(WindowError::BadPosition { pos });
        }
        self.paint_from(palette, rows, pos, limited);
        Ok(())
    }

    fn paint_from(&mut self, palette: &mut Palette, rows: u16, pos: usize, limited: bool) {
        let height = view_height(rows);
        if self.scrollback.is_empty() {
            return;
        }
        self.pane.erase();

        let mut i = 0;
        for line in self.scrollback.iter_from(pos) {
            if i >= height {
                break;
            }
            if limited {
                i += paint::puts(
                    &mut self.pane,
                    Some(&mut *palette),
                    &line.text,
                    line.indent,
                    height - i,
                );
            } else {
                paint::puts(&mut self.pane, Some(&mut *palette), &line.text, line.indent, 0);
                i += 1;
            }
        }
    }

    fn redraw_tail(&mut self, palette: &mut Palette, rows: u16) {
        let pos = self.scrollback.len().saturating_sub(view_height(rows));
        self.paint_from(palette, rows, pos, false);
    }

    fn redraw_frozen(&mut self, palette: &mut Palette, rows: u16) {
        let pos = self.scroll.saved_size.saturating_sub(self.scroll.count);
        self.paint_from(palette, rows, pos, true);
    }

    fn unfreeze(&mut self) {
        self.scroll = ScrollState::default();
    }

    /// Scroll towards older lines. Returns false (beep) when there is
    /// nothing to scroll or the view is already at the top.
    pub fn scroll_up(&mut self, palette: &mut Palette, rows: u16, step: usize) -> bool {
        let height = view_height(rows);
        let size = self.scrollback.len();

        if size <= height || self.scroll.at_top() {
            return false;
        }

        if !self.scroll.mode {
            self.scroll.saved_size = size;
            self.scroll.mode = true;
        }

        let s = &mut self.scroll;
        if s.count > s.saved_size {
            s.count = s.saved_size;
        } else {
            if s.count == 0 {
                s.count += height;
            }
            s.count = (s.count + step).min(s.saved_size);
        }

        if self.scroll.at_top() {
            self.paint_from(palette, rows, 0, true);
        } else {
            self.redraw_frozen(palette, rows);
        }
        true
    }

    /// Scroll towards newer lines, leaving scroll mode once the tail is
    /// back in view. Returns false (beep) when not scrolled.
    pub fn scroll_down(&mut self, palette: &mut Palette, rows: u16, step: usize) -> bool {
        if !self.scroll.mode {
            return false;
        }

        self.scroll.count = self.scroll.count.saturating_sub(step);

        if self.scroll.count <= view_height(rows) {
            self.unfreeze();
            self.redraw_tail(palette, rows);
        } else {
            self.redraw_frozen(palette, rows);
        }
        true
    }

    /// Scrollback index of the first visible line
    pub fn view_top(&self, rows: u16) -> usize {
        if self.scroll.mode {
            self.scroll.saved_size.saturating_sub(self.scroll.count)
        } else {
            self.scrollback.len().saturating_sub(view_height(rows))
        }
    }

    /// Lines above the view that fill one screen at the current width
    pub fn page_up_amount(&self, rows: u16) -> usize {
        let height = view_height(rows);
        let top = self.view_top(rows).min(self.scrollback.len());
        let lines = self.scrollback.iter().take(top).rev();
        self.entries_filling(lines, height)
    }

    /// Lines from the view top that fill one screen at the current width
    pub fn page_down_amount(&self, rows: u16) -> usize {
        let height = view_height(rows);
        let lines = self.scrollback.iter_from(self.view_top(rows));
        self.entries_filling(lines, height)
    }

    fn entries_filling<'a>(
        &self,
        lines: impl Iterator<Item = &'a crate::scrollback::Line>,
        height: usize,
    ) -> usize {
        let width = self.pane.width();
        let mut filled = 0;
        let mut entries = 0;
        for line in lines {
            if filled >= height {
                break;
            }
            filled += represent_count(&line.text, line.indent, width).max(1);
            entries += 1;
        }
        entries.max(1)
    }

    pub fn page_up(&mut self, palette: &mut Palette, rows: u16) -> bool {
        let amount = self.page_up_amount(rows);
        self.scroll_up(palette, rows, amount)
    }

    pub fn page_down(&mut self, palette: &mut Palette, rows: u16) -> bool {
        let amount = self.page_down_amount(rows);
        self.scroll_down(palette, rows, amount)
    }

    /// Re-layout after a terminal size change and repaint
    pub fn recreate(&mut self, palette: &mut Palette, rows: u16, cols: u16) {
        self.layout(rows, cols);
        self.draw_nicklist(rows);

        if self.scroll.mode {
            if self.scroll.count <= view_height(rows) {
                self.unfreeze();
                self.redraw_tail(palette, rows);
            } else {
                self.redraw_frozen(palette, rows);
            }
            return;
        }
        self.redraw_tail(palette, rows);
    }

    pub fn draw_nicklist(&mut self, rows: u16) {
        if !self.received_names {
            return;
        }
        if let Some(pane) = self.nick_pane.as_mut() {
            self.nicklist.draw(pane, view_height(rows));
        }
    }

    /// Redraw the nicklist after membership changes; a width change
    /// re-lays out the whole window
    pub fn update_nicklist(&mut self, palette: &mut Palette, rows: u16, cols: u16) -> bool {
        if !self.is_channel() || !self.received_names {
            return false;
        }
        if self.nicklist.width() != self.nick_width {
            self.recreate(palette, rows, cols);
        } else {
            self.draw_nicklist(rows);
        }
        true
    }

    /// Returns false (beep) when the window has no nicklist
    pub fn nicklist_scroll_up(&mut self, rows: u16) -> bool {
        if !self.is_channel() || !self.received_names || self.nick_width == 0 {
            return false;
        }
        self.nicklist.scroll_up();
        self.draw_nicklist(rows);
        true
    }

    pub fn nicklist_scroll_down(&mut self, rows: u16) -> bool {
        if !self.is_channel() || !self.received_names || self.nick_width == 0 {
            return false;
        }
        self.nicklist.scroll_down();
        self.draw_nicklist(rows);
        true
    }
}

/// All open windows in open order; index + 1 is the refnum
#[derive(Debug)]
pub struct WindowRegistry {
    windows: Vec<Window>,
    active: usize,
    rows: u16,
    cols: u16,
    max_windows: usize,
    capacity: usize,
    default_logging: bool,
}

impl WindowRegistry {
    /// Create the registry with the status window open and active
    pub fn new(rows: u16, cols: u16, max_windows: usize, capacity: usize) -> Self {
        let status = Window::new(STATUS_LABEL, None, 1, capacity, rows, cols);
        Self {
            windows: vec![status],
            active: 0,
            rows,
            cols,
            max_windows,
            capacity,
            default_logging: false,
        }
    }

    /// Logging flag given to windows spawned from now on
    pub fn set_default_logging(&mut self, on: bool) {
        self.default_logging = on;
    }

    pub fn geometry(&self) -> (u16, u16) {
        (self.rows, self.cols)
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Window> {
        self.windows.iter()
    }

    fn index_of(&self, label: &str) -> Option<usize> {
        if label.is_empty() {
            return None;
        }
        self.windows
            .iter()
            .position(|w| w.label.eq_ignore_ascii_case(label))
    }

    pub fn get(&self, label: &str) -> Option<&Window> {
        self.index_of(label).map(|i| &self.windows[i])
    }

    pub fn get_mut(&mut self, label: &str) -> Option<&mut Window> {
        self.index_of(label).map(move |i| &mut self.windows[i])
    }

    pub fn by_refnum(&self, refnum: usize) -> Option<&Window> {
        refnum.checked_sub(1).and_then(|i| self.windows.get(i))
    }

    pub fn status(&self) -> &Window {
        &self.windows[0]
    }

    pub fn status_mut(&mut self) -> &mut Window {
        &mut self.windows[0]
    }

    pub fn active(&self) -> &Window {
        &self.windows[self.active]
    }

    pub fn active_mut(&mut self) -> &mut Window {
        &mut self.windows[self.active]
    }

    /// Open a window, or reuse the one already carrying `label`
    pub fn spawn(&mut self, label: &str, title: Option<&str>) -> Result<(), WindowError> {
        if label.is_empty() {
            return Err(WindowError::InvalidLabel(label.to_string()));
        }
        if self.index_of(label).is_some() {
            return Ok(());
        }
        if self.windows.len() + 1 > self.max_windows {
            return Err(WindowError::LimitExceeded {
                limit: self.max_windows,
            });
        }

        let refnum = self.windows.len() + 1;
        let mut window = Window::new(label, title, refnum, self.capacity, self.rows, self.cols);
        window.logging = self.default_logging;
        self.windows.push(window);
        self.active = refnum - 1;
        debug!(label, refnum, "spawned window");
        Ok(())
    }

    /// Close a window, renumber the rest and focus the last one
    pub fn destroy(&mut self, label: &str) -> Result<(), WindowError> {
        if label.is_empty() || label.eq_ignore_ascii_case(STATUS_LABEL) {
            return Err(WindowError::InvalidLabel(label.to_string()));
        }
        let index = self
            .index_of(label)
            .ok_or_else(|| WindowError::NotFound(label.to_string()))?;

        self.windows.remove(index);
        for (i, w) in self.windows.iter_mut().enumerate() {
            w.refnum = i + 1;
        }
        debug_assert_eq!(self.windows[0].refnum, 1);
        debug_assert!(self.windows[0].is_status());

        self.active = self.windows.len() - 1;
        debug!(label, "destroyed window");
        Ok(())
    }

    /// Make `label` active. Returns whether the active window changed.
    pub fn change_by_label(&mut self, label: &str) -> Result<bool, WindowError> {
        let index = self
            .index_of(label)
            .ok_or_else(|| WindowError::NotFound(label.to_string()))?;
        let changed = index != self.active;
        self.active = index;
        Ok(changed)
    }

    pub fn change_by_refnum(&mut self, refnum: usize) -> Result<bool, WindowError> {
        if refnum == 0 || refnum > self.windows.len() {
            return Err(WindowError::NotFound(refnum.to_string()));
        }
        let changed = refnum - 1 != self.active;
        self.active = refnum - 1;
        Ok(changed)
    }

    pub fn select_next(&mut self) -> bool {
        let next = self.active().refnum + 1;
        self.change_by_refnum(next).unwrap_or(false)
    }

    pub fn select_prev(&mut self) -> bool {
        let prev = self.active().refnum - 1;
        self.change_by_refnum(prev).unwrap_or(false)
    }

    /// Set a window title; empty titles are ignored
    pub fn new_window_title(&mut self, label: &str, title: &str) -> bool {
        if title.is_empty() {
            return false;
        }
        match self.get_mut(label) {
            Some(w) => {
                w.title = Some(title.to_string());
                true
            }
            None => false,
        }
    }

    /// Close every window that is neither the status window nor a channel
    pub fn close_all_private_conversations(&mut self) -> usize {
        let private: Vec<String> = self
            .windows
            .iter()
            .filter(|w| !w.is_status() && !w.is_channel())
            .map(|w| w.label.clone())
            .collect();

        private
            .iter()
            .filter(|label| self.destroy(label).is_ok())
            .count()
    }

    pub fn recreate_all(&mut self, palette: &mut Palette, rows: u16, cols: u16) {
        self.rows = rows;
        self.cols = cols;
        for w in &mut self.windows {
            w.recreate(palette, rows, cols);
        }
    }

    /// Channel windows, for bulk operations like rejoin or names reset
    pub fn channels_mut(&mut self) -> impl Iterator<Item = &mut Window> {
        self.windows.iter_mut().filter(|w| w.is_channel())
    }
}

//! In-memory terminal surfaces
//!
//! A [`Surface`] is a grid of cells with a cursor and current attributes,
//! behaving like a curses window: characters land at the cursor, a newline
//! clears the rest of the row, and a scrollable surface scrolls when the
//! cursor moves past its last row. Window panes, the nicklist and the two
//! input panels are all surfaces; the screen composes them into ANSI
//! output.

use crossterm::style::{Attribute, Color, SetAttribute, SetBackgroundColor, SetForegroundColor};
use crossterm::Command;

use crate::colors::Palette;
use crate::width::char_width;

/// Attributes applied to painted cells
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Attrs {
    pub bold: bool,
    pub underline: bool,
    pub reverse: bool,
    /// Color pair slot, 0 = no color
    pub pair: i16,
}

/// A single cell. `ch == '\0'` marks the trailing half of a wide glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub attrs: Attrs,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            attrs: Attrs::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Surface {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
    cur_y: u16,
    cur_x: u16,
    attrs: Attrs,
    blank: Cell,
    scrollable: bool,
}

impl Surface {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::default(); width as usize * height as usize],
            cur_y: 0,
            cur_x: 0,
            attrs: Attrs::default(),
            blank: Cell::default(),
            scrollable: false,
        }
    }

    /// A surface that scrolls its content up when the cursor runs off the bottom
    pub fn scrolling(width: u16, height: u16) -> Self {
        let mut s = Self::new(width, height);
        s.scrollable = true;
        s
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Cell used for cleared space. Bars set a colored blank so their
    /// whole row carries the bar colors.
    pub fn set_background(&mut self, attrs: Attrs) {
        self.blank = Cell { ch: ' ', attrs };
    }

    pub fn is_scrollable(&self) -> bool {
        self.scrollable
    }

    /// Change geometry. Content is discarded; callers redraw afterwards.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.cells = vec![self.blank; width as usize * height as usize];
        self.cur_y = 0;
        self.cur_x = 0;
    }

    /// Cursor as (row, column)
    pub fn cursor(&self) -> (u16, u16) {
        (self.cur_y, self.cur_x)
    }

    pub fn move_to(&mut self, y: u16, x: u16) {
        self.cur_y = y.min(self.height.saturating_sub(1));
        self.cur_x = x.min(self.width);
    }

    pub fn attrs(&self) -> Attrs {
        self.attrs
    }

    pub fn set_attrs(&mut self, attrs: Attrs) {
        self.attrs = attrs;
    }

    fn index(&self, y: u16, x: u16) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    pub fn cell(&self, y: u16, x: u16) -> Option<&Cell> {
        self.index(y, x).map(|i| &self.cells[i])
    }

    /// Blank every cell and home the cursor
    pub fn erase(&mut self) {
        self.cells.fill(self.blank);
        self.cur_y = 0;
        self.cur_x = 0;
    }

    /// Blank from the cursor to the end of its row
    pub fn clear_to_eol(&mut self) {
        for x in self.cur_x..self.width {
            if let Some(i) = self.index(self.cur_y, x) {
                self.cells[i] = self.blank;
            }
        }
    }

    /// Move to the start of the next row, clearing the rest of this one.
    /// A scrollable surface scrolls at the bottom; others stay on the last row.
    pub fn newline(&mut self) {
        self.clear_to_eol();
        self.cur_x = 0;
        if self.cur_y + 1 < self.height {
            self.cur_y += 1;
        } else if self.scrollable {
            self.scroll_one();
        }
    }

    fn scroll_one(&mut self) {
        let w = self.width as usize;
        if self.cells.len() >= w {
            self.cells.drain(..w);
            self.cells.extend(std::iter::repeat(self.blank).take(w));
        }
    }

    /// Write a glyph at the cursor with the current attributes.
    ///
    /// Returns `false` when the glyph has no width or cannot be placed.
    pub fn add_char(&mut self, c: char) -> bool {
        let w = char_width(c) as u16;
        if w == 0 || w > self.width || self.height == 0 {
            return false;
        }
        if self.cur_x + w > self.width {
            if !self.scrollable {
                return false;
            }
            self.newline();
        }

        let attrs = self.attrs;
        if let Some(i) = self.index(self.cur_y, self.cur_x) {
            self.cells[i] = Cell { ch: c, attrs };
        }
        for dx in 1..w {
            if let Some(i) = self.index(self.cur_y, self.cur_x + dx) {
                self.cells[i] = Cell { ch: '\0', attrs };
            }
        }
        self.cur_x += w;
        true
    }

    /// Write a string of glyphs (no markup interpretation)
    pub fn add_str(&mut self, s: &str) {
        for c in s.chars() {
            self.add_char(c);
        }
    }

    /// Insert a glyph at the cursor, shifting the rest of the row right.
    /// The cursor does not move.
    pub fn insert_char(&mut self, c: char) -> bool {
        let w = char_width(c) as u16;
        if w == 0 || self.height == 0 || self.cur_x + w > self.width {
            return false;
        }
        let row = self.cur_y as usize * self.width as usize;
        let start = row + self.cur_x as usize;
        let end = row + self.width as usize;
        let attrs = self.attrs;

        self.cells[start..end].rotate_right(w as usize);
        self.cells[start] = Cell { ch: c, attrs };
        for dx in 1..w as usize {
            self.cells[start + dx] = Cell { ch: '\0', attrs };
        }
        // a wide glyph pushed half off the edge is blanked
        if let Some(last) = self.cells.get_mut(end - 1) {
            if char_width(last.ch) > 1 {
                *last = self.blank;
            }
        }
        true
    }

    /// Delete `n` columns at the cursor, shifting the rest of the row left
    pub fn delete_cols(&mut self, n: u16) {
        if self.cur_x >= self.width || self.height == 0 {
            return;
        }
        let row = self.cur_y as usize * self.width as usize;
        let start = row + self.cur_x as usize;
        let end = row + self.width as usize;
        let n = (n as usize).min(end - start);

        self.cells[start..end].rotate_left(n);
        self.cells[end - n..end].fill(self.blank);
    }

    /// Text of one row, wide-glyph padding removed, trailing blanks trimmed
    pub fn row_text(&self, y: u16) -> String {
        if y >= self.height {
            return String::new();
        }
        let start = y as usize * self.width as usize;
        let row = &self.cells[start..start + self.width as usize];
        let text: String = row.iter().filter(|c| c.ch != '\0').map(|c| c.ch).collect();
        text.trim_end().to_string()
    }

    /// All rows, for tests and debugging
    pub fn lines(&self) -> Vec<String> {
        (0..self.height).map(|y| self.row_text(y)).collect()
    }

    /// Render one row as an ANSI string, starting with a style reset
    pub fn row_ansi(&self, y: u16, palette: &Palette) -> String {
        let mut output = String::new();
        if y >= self.height {
            return output;
        }

        let _ = SetAttribute(Attribute::Reset).write_ansi(&mut output);
        let mut last = Attrs::default();

        for x in 0..self.width {
            let cell = &self.cells[y as usize * self.width as usize + x as usize];
            if cell.ch == '\0' {
                continue;
            }

            if cell.attrs != last {
                let _ = SetAttribute(Attribute::Reset).write_ansi(&mut output);
                if cell.attrs.bold {
                    let _ = SetAttribute(Attribute::Bold).write_ansi(&mut output);
                }
                if cell.attrs.underline {
                    let _ = SetAttribute(Attribute::Underlined).write_ansi(&mut output);
                }
                if cell.attrs.reverse {
                    let _ = SetAttribute(Attribute::Reverse).write_ansi(&mut output);
                }
                // uncolored cells take the background pair, like a curses bkgd
                let pair = match cell.attrs.pair {
                    0 => self.blank.attrs.pair,
                    pair => pair,
                };
                if let Some((fg, bg)) = palette.pair_colors(pair) {
                    if fg != Color::Reset {
                        let _ = SetForegroundColor(fg).write_ansi(&mut output);
                    }
                    if bg != Color::Reset {
                        let _ = SetBackgroundColor(bg).write_ansi(&mut output);
                    }
                }
                last = cell.attrs;
            }

            output.push(cell.ch);
        }

        let _ = SetAttribute(Attribute::Reset).write_ansi(&mut output);
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_default() {
        let cell = Cell::default();
        assert_eq!(cell.ch, ' ');
        assert_eq!(cell.attrs.pair, 0);
        assert!(!cell.attrs.bold);
    }

    #[test]
    fn test_add_and_newline() {
        let mut s = Surface::scrolling(10, 3);
        s.add_str("Hello");
        s.newline();
        s.add_str("World");
        assert_eq!(s.row_text(0), "Hello");
        assert_eq!(s.row_text(1), "World");
        assert_eq!(s.cursor(), (1, 5));
    }

    #[test]
    fn test_scrolls_at_bottom() {
        let mut s = Surface::scrolling(5, 2);
        s.add_str("a");
        s.newline();
        s.add_str("b");
        s.newline();
        s.add_str("c");
        assert_eq!(s.lines(), vec!["b", "c"]);
    }

    #[test]
    fn test_fixed_surface_does_not_scroll() {
        let mut s = Surface::new(3, 1);
        s.add_str("abcd");
        assert_eq!(s.row_text(0), "abc");
        s.newline();
        assert_eq!(s.cursor(), (0, 0));
    }

    #[test]
    fn test_wide_glyph_takes_two_cells() {
        let mut s = Surface::new(6, 1);
        s.add_str("日x");
        assert_eq!(s.cell(0, 1).unwrap().ch, '\0');
        assert_eq!(s.row_text(0), "日x");
        assert_eq!(s.cursor(), (0, 3));
    }

    #[test]
    fn test_insert_and_delete() {
        let mut s = Surface::new(8, 1);
        s.add_str("acd");
        s.move_to(0, 1);
        s.insert_char('b');
        assert_eq!(s.row_text(0), "abcd");
        assert_eq!(s.cursor(), (0, 1));

        s.delete_cols(1);
        assert_eq!(s.row_text(0), "acd");
    }

    #[test]
    fn test_erase_homes_cursor() {
        let mut s = Surface::scrolling(4, 2);
        s.add_str("xy");
        s.erase();
        assert_eq!(s.cursor(), (0, 0));
        assert_eq!(s.row_text(0), "");
    }

    #[test]
    fn test_background_fills_cleared_space() {
        let mut s = Surface::new(4, 1);
        let bar = Attrs {
            pair: 3,
            ..Attrs::default()
        };
        s.set_background(bar);
        s.add_str("ab");
        s.erase();
        assert_eq!(s.cell(0, 3).unwrap().attrs, bar);
        assert_eq!(s.row_text(0), "");
    }

    #[test]
    fn test_row_ansi_output() {
        let palette = Palette::disabled();
        let mut s = Surface::new(5, 1);
        s.set_attrs(Attrs {
            bold: true,
            ..Attrs::default()
        });
        s.add_str("Hi");
        let ansi = s.row_ansi(0, &palette);
        assert!(ansi.contains("Hi"));
        assert!(ansi.contains("\x1b[1m"));
    }
}

//! Display width of characters on the terminal
//!
//! Every column computation in the crate (word-wrap, indentation, the input
//! cursor) goes through [`char_width`] so the paint engine and the line
//! editor always agree on where a glyph ends.

use unicode_width::UnicodeWidthChar;

/// Columns occupied by a full-width (East Asian wide) glyph.
///
/// Some terminals draw full-width glyphs one column narrower than the
/// Unicode tables claim. Set this to 1 when targeting one of them.
pub const WIDE_GLYPH_COLUMNS: usize = 2;

/// Visible width of a single character: 0 for combining marks and control
/// characters, 1 for ordinary glyphs, [`WIDE_GLYPH_COLUMNS`] for wide ones.
pub fn char_width(c: char) -> usize {
    match c.width() {
        None | Some(0) => 0,
        Some(1) => 1,
        Some(_) => WIDE_GLYPH_COLUMNS,
    }
}

/// Sum of [`char_width`] over a string (no markup handling)
pub fn str_width(s: &str) -> usize {
    s.chars().map(char_width).sum()
}

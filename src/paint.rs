//! Paint engine: markup interpretation and word-wrap
//!
//! [`puts`] writes one stored line onto a surface. Decoration bytes toggle
//! the paint state, color codes resolve through the palette, and on
//! scrollable surfaces the text is word-wrapped with an optional indent for
//! continuation rows. The return value is the "represent count": how many
//! physical rows the line consumed, which the scroll bookkeeping relies on.

use std::sync::{Mutex, MutexGuard, Once, OnceLock};

use tracing::debug;

use crate::colors::Palette;
use crate::markup::{self, BLINK, BOLD, COLOR, NORMAL, REVERSE, UNDERLINE};
use crate::surface::{Attrs, Surface};
use crate::width::char_width;

/// Narrowest surface worth painting on
const MIN_COLS: u16 = 2;

static OUTPUT_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
static UNPLACEABLE: Once = Once::new();

/// Process-wide lock serializing every write to a terminal surface and every
/// frame flush. Never hold it across blocking I/O, and never nest it.
pub fn output_lock() -> MutexGuard<'static, ()> {
    OUTPUT_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Decoration toggles for a single paint call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaintState {
    pub blink: bool,
    pub bold: bool,
    pub color: bool,
    pub reverse: bool,
    pub underline: bool,
    color_bold: bool,
    pair: i16,
}

impl PaintState {
    /// Surface attributes for the current toggles. Blink is tracked but
    /// never shown.
    pub fn attrs(&self) -> Attrs {
        Attrs {
            bold: self.bold || self.color_bold,
            underline: self.underline,
            reverse: self.reverse,
            pair: self.pair,
        }
    }

    fn clear_color(&mut self) {
        self.color = false;
        self.color_bold = false;
        self.pair = 0;
    }
}

/// Paint `text` onto `surface` under the output lock.
///
/// * `indent`: blanks written at the start of every continuation row (0 = none)
/// * `max_lines`: stop after this many rows have been started (0 = no cap)
///
/// Returns the number of rows started, including the final newline on
/// scrollable surfaces.
pub fn puts(
    surface: &mut Surface,
    palette: Option<&mut Palette>,
    text: &str,
    indent: usize,
    max_lines: usize,
) -> usize {
    let _guard = output_lock();
    paint(surface, palette, text, indent, max_lines)
}

/// Rows `text` would occupy on a surface `width` columns wide
pub fn represent_count(text: &str, indent: usize, width: u16) -> usize {
    let mut scratch = Surface::scrolling(width, 1);
    paint(&mut scratch, None, text, indent, 0)
}

fn paint(
    surface: &mut Surface,
    mut palette: Option<&mut Palette>,
    text: &str,
    indent: usize,
    max_lines: usize,
) -> usize {
    if text.is_empty() || surface.width() < MIN_COLS || surface.height() == 0 {
        return 0;
    }

    let mut chars: Vec<char> = text
        .chars()
        .map(|c| if matches!(c, '\x0c' | '\t' | '\x0b') { ' ' } else { c })
        .collect();
    let scrollable = surface.is_scrollable();
    if scrollable {
        chars.push('\n');
    }

    let maxx = surface.width() as usize - 1;
    // continuation rows keep at least one column for text
    let indent = indent.min(maxx.saturating_sub(1));
    let mut state = PaintState::default();
    let mut insert_count = 0usize;
    let mut line_count = 0usize;
    let mut rep_count = 0usize;
    let mut i = 0;

    surface.set_attrs(state.attrs());

    while i < chars.len() {
        let c = chars[i];
        i += 1;

        match c {
            BLINK => state.blink = !state.blink,
            BOLD => state.bold = !state.bold,
            REVERSE => state.reverse = !state.reverse,
            UNDERLINE => state.underline = !state.underline,
            NORMAL => state = PaintState::default(),
            COLOR => {
                if state.color {
                    state.clear_color();
                }
                let code = markup::parse_color_code(&chars[i..]);
                i += code.len;
                if let Some(resolved) = palette.as_deref_mut().and_then(|p| p.set_color(code)) {
                    state.color = true;
                    state.color_bold = resolved.bold;
                    state.pair = resolved.pair;
                }
            }
            '\n' if scrollable => {
                surface.newline();
                insert_count = 0;
                rep_count += 1;
                line_count += 1;
                if max_lines > 0 && line_count >= max_lines {
                    break;
                }
                if indent > 0 && i < chars.len() {
                    do_indent(surface, indent, &mut insert_count);
                }
            }
            c if c.is_control() => {}
            c if !scrollable => {
                surface.add_char(c);
            }
            c => {
                let w = char_width(c);
                let needed = if c == ' ' {
                    1 + next_word_width(&chars[i..])
                } else {
                    w
                };

                if insert_count + needed <= maxx {
                    put_glyph(surface, c, &mut insert_count);
                } else {
                    surface.newline();
                    insert_count = 0;
                    rep_count += 1;
                    line_count += 1;
                    if max_lines > 0 && line_count >= max_lines {
                        break;
                    }
                    if indent > 0 {
                        do_indent(surface, indent, &mut insert_count);
                    }
                    if c != ' ' {
                        put_glyph(surface, c, &mut insert_count);
                    }
                }
            }
        }

        surface.set_attrs(state.attrs());
    }

    surface.set_attrs(Attrs::default());
    rep_count
}

fn put_glyph(surface: &mut Surface, c: char, insert_count: &mut usize) {
    if surface.add_char(c) {
        *insert_count += char_width(c);
    } else if char_width(c) > 0 {
        UNPLACEABLE.call_once(|| {
            debug!(glyph = %c.escape_unicode(), "glyph does not fit the surface, skipped");
        });
    }
}

/// Blanks for a continuation row, painted without attributes
fn do_indent(surface: &mut Surface, indent: usize, insert_count: &mut usize) {
    let saved = surface.attrs();
    surface.set_attrs(Attrs::default());
    for _ in 0..indent {
        surface.add_char(' ');
        *insert_count += 1;
    }
    surface.set_attrs(saved);
}

/// Width of the word starting at `rest`, up to the next blank or newline.
/// Decoration bytes and color codes inside the word count as zero width.
fn next_word_width(rest: &[char]) -> usize {
    let end = rest
        .iter()
        .position(|&c| c == ' ' || c == '\n')
        .unwrap_or(rest.len());
    let word: String = rest[..end].iter().collect();
    markup::visible_width(&word)
}

//! In-band text decoration bytes
//!
//! IRC text carries its formatting inline: single control bytes toggle
//! bold/underline/reverse/blink, NORMAL resets everything and COLOR
//! introduces a numeric color code:
//!
//! ```text
//! ^C fg [fg] [, [bg [bg]]]
//! ```
//!
//! Stored scrollback lines keep these bytes verbatim; [`strip_markup`]
//! produces the plain variant used by logs and no-color terminals.

use crate::width::char_width;

pub const BLINK: char = '\x1d';
pub const BOLD: char = '\x02';
pub const COLOR: char = '\x03';
pub const NORMAL: char = '\x0f';
pub const REVERSE: char = '\x16';
pub const UNDERLINE: char = '\x1f';

/// True for any of the six decoration bytes
pub fn is_markup(c: char) -> bool {
    matches!(c, BLINK | BOLD | COLOR | NORMAL | REVERSE | UNDERLINE)
}

/// Letter shown in place of a decoration byte inside the input line
pub fn display_letter(c: char) -> Option<char> {
    match c {
        BLINK => Some('I'),
        BOLD => Some('B'),
        COLOR => Some('C'),
        NORMAL => Some('N'),
        REVERSE => Some('R'),
        UNDERLINE => Some('U'),
        _ => None,
    }
}

/// Result of scanning the digits that follow a COLOR byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColorCode {
    /// Foreground index, `None` for a bare `^C`
    pub fg: Option<u8>,
    /// Background index when the code carried one
    pub bg: Option<u8>,
    /// Characters consumed after the COLOR byte
    pub len: usize,
}

impl ColorCode {
    /// True for a code with no digits at all
    pub fn is_empty(&self) -> bool {
        self.fg.is_none()
    }
}

/// Scan a color code starting right after the COLOR byte.
///
/// Each stage accepts its character or stops without consuming it, so the
/// result is the longest valid prefix of `fg [fg] [, [bg [bg]]]`. A comma
/// with no background digits after it is still consumed.
pub fn parse_color_code(rest: &[char]) -> ColorCode {
    let digit = |i: usize| rest.get(i).and_then(|c| c.to_digit(10));

    let mut code = ColorCode::default();
    let mut i = 0;

    let Some(d1) = digit(i) else {
        return code;
    };
    let mut fg = d1;
    i += 1;
    if let Some(d2) = digit(i) {
        fg = fg * 10 + d2;
        i += 1;
    }
    code.fg = Some(fg as u8);

    if rest.get(i) == Some(&',') {
        i += 1;
        if let Some(b1) = digit(i) {
            let mut bg = b1;
            i += 1;
            if let Some(b2) = digit(i) {
                bg = bg * 10 + b2;
                i += 1;
            }
            code.bg = Some(bg as u8);
        }
    }

    code.len = i;
    code
}

/// Remove every decoration byte and color code, leaving plain text
pub fn strip_markup(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        i += 1;
        if c == COLOR {
            i += parse_color_code(&chars[i..]).len;
        } else if !is_markup(c) {
            out.push(c);
        }
    }

    out
}

/// Display width of `text` with all markup removed
pub fn visible_width(text: &str) -> usize {
    strip_markup(text).chars().map(char_width).sum()
}

//! Color map and color-pair resolver
//!
//! IRC color codes are logical indices 0-99. Indices 0-15 map onto the eight
//! base terminal colors plus a bold bit; 16-99 map onto xterm-256 palette
//! numbers and are only reachable on terminals with at least 256 colors.
//! A (foreground, background) pair of terminal colors is painted through a
//! registered pair slot, the way curses does it. Slot 0 means "no color".

use std::sync::Once;

use crossterm::style::Color;
use tracing::warn;

use crate::markup::ColorCode;

pub const BLACK: i16 = 0;
pub const RED: i16 = 1;
pub const GREEN: i16 = 2;
pub const YELLOW: i16 = 3;
pub const BLUE: i16 = 4;
pub const MAGENTA: i16 = 5;
pub const CYAN: i16 = 6;
pub const WHITE: i16 = 7;

/// Palette slots used for bold-black and plain-white when the palette can
/// be redefined
pub const GREY: i16 = 244;
pub const LIGHT_GREY: i16 = 252;

/// Terminal default color (foreground or background)
pub const DEFAULT: i16 = -1;

const BASE_COLORS: [i16; 8] = [BLACK, RED, GREEN, YELLOW, BLUE, MAGENTA, CYAN, WHITE];

/// One entry of the logical color map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapEntry {
    pub color: i16,
    pub bold: bool,
}

const fn e(color: i16, bold: bool) -> MapEntry {
    MapEntry { color, bold }
}

const fn x(color: i16) -> MapEntry {
    MapEntry { color, bold: false }
}

/// Logical color index (0-99) to terminal color
pub const COLOR_MAP: [MapEntry; 100] = [
    e(WHITE, true),
    e(BLACK, false),
    e(BLUE, false),
    e(GREEN, false),
    e(RED, true),
    e(RED, false),
    e(MAGENTA, false),
    e(YELLOW, false),
    e(YELLOW, true),
    e(GREEN, true),
    e(CYAN, false),
    e(CYAN, true),
    e(BLUE, true),
    e(MAGENTA, true),
    e(BLACK, true),
    e(WHITE, false),
    // 16-27
    x(52), x(94), x(100), x(58), x(22), x(29), x(23), x(24), x(17), x(54), x(53), x(89),
    // 28-39
    x(88), x(130), x(142), x(64), x(28), x(35), x(30), x(25), x(18), x(91), x(90), x(125),
    // 40-51
    x(124), x(166), x(184), x(106), x(34), x(49), x(37), x(33), x(19), x(129), x(127), x(161),
    // 52-63
    x(196), x(208), x(226), x(154), x(46), x(86), x(51), x(75), x(21), x(171), x(201), x(198),
    // 64-75
    x(203), x(215), x(227), x(191), x(83), x(122), x(87), x(111), x(63), x(177), x(207), x(205),
    // 76-87
    x(217), x(223), x(229), x(193), x(157), x(158), x(159), x(153), x(147), x(183), x(219), x(212),
    // 88-99
    x(16), x(233), x(235), x(237), x(239), x(241), x(244), x(247), x(250), x(254), x(231), x(DEFAULT),
];

/// Redefined palette entries, 0-1000 per channel
const EXTENDED_RGB: [(i16, [u16; 3]); 84] = [
    (52, [278, 0, 0]),
    (94, [278, 129, 0]),
    (100, [278, 278, 0]),
    (58, [196, 278, 0]),
    (22, [0, 278, 0]),
    (29, [0, 278, 173]),
    (23, [0, 278, 278]),
    (24, [0, 153, 278]),
    (17, [0, 0, 278]),
    (54, [180, 0, 278]),
    (53, [278, 0, 278]),
    (89, [278, 0, 165]),
    (88, [455, 0, 0]),
    (130, [455, 227, 0]),
    (142, [455, 455, 0]),
    (64, [318, 455, 0]),
    (28, [0, 455, 0]),
    (35, [0, 455, 286]),
    (30, [0, 455, 455]),
    (25, [0, 251, 455]),
    (18, [0, 0, 455]),
    (91, [294, 0, 455]),
    (90, [455, 0, 455]),
    (125, [455, 0, 271]),
    (124, [710, 0, 0]),
    (166, [710, 388, 0]),
    (184, [710, 710, 0]),
    (106, [490, 710, 0]),
    (34, [0, 710, 0]),
    (49, [0, 710, 443]),
    (37, [0, 710, 710]),
    (33, [0, 388, 710]),
    (19, [0, 0, 710]),
    (129, [459, 0, 710]),
    (127, [710, 0, 710]),
    (161, [710, 0, 420]),
    (196, [1000, 0, 0]),
    (208, [1000, 549, 0]),
    (226, [1000, 1000, 0]),
    (154, [698, 1000, 0]),
    (46, [0, 1000, 0]),
    (86, [0, 1000, 627]),
    (51, [0, 1000, 1000]),
    (75, [0, 549, 1000]),
    (21, [0, 0, 1000]),
    (171, [647, 0, 1000]),
    (201, [1000, 0, 1000]),
    (198, [1000, 0, 596]),
    (203, [1000, 349, 349]),
    (215, [1000, 706, 349]),
    (227, [1000, 1000, 443]),
    (191, [812, 1000, 376]),
    (83, [435, 1000, 435]),
    (122, [396, 1000, 788]),
    (87, [427, 1000, 1000]),
    (111, [349, 706, 1000]),
    (63, [349, 349, 1000]),
    (177, [769, 349, 1000]),
    (207, [1000, 400, 1000]),
    (205, [1000, 349, 737]),
    (217, [1000, 612, 612]),
    (223, [1000, 827, 612]),
    (229, [1000, 1000, 612]),
    (193, [886, 1000, 612]),
    (157, [612, 1000, 612]),
    (158, [612, 1000, 859]),
    (159, [612, 1000, 1000]),
    (153, [612, 827, 1000]),
    (147, [612, 612, 1000]),
    (183, [863, 612, 1000]),
    (219, [1000, 612, 1000]),
    (212, [1000, 580, 827]),
    (16, [0, 0, 0]),
    (233, [75, 75, 75]),
    (235, [157, 157, 157]),
    (237, [212, 212, 212]),
    (239, [302, 302, 302]),
    (241, [396, 396, 396]),
    (244, [506, 506, 506]),
    (247, [624, 624, 624]),
    (250, [737, 737, 737]),
    (254, [886, 886, 886]),
    (231, [1000, 1000, 1000]),
    // light grey for the remapped legacy white (grey shares 244)
    (LIGHT_GREY, [824, 824, 824]),
];

/// What the terminal can do with color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermCaps {
    /// Number of palette colors (8, 16, 256)
    pub colors: u16,
    /// Palette entries can be redefined (we emit RGB for them)
    pub can_change_color: bool,
    /// Highest pair slot the terminal supports
    pub max_pairs: u16,
}

impl Default for TermCaps {
    fn default() -> Self {
        Self {
            colors: 16,
            can_change_color: false,
            max_pairs: 256,
        }
    }
}

impl TermCaps {
    /// Guess capabilities from `TERM` / `COLORTERM`
    pub fn detect() -> Self {
        let term = std::env::var("TERM").unwrap_or_default();
        let colorterm = std::env::var("COLORTERM").unwrap_or_default();
        let truecolor = colorterm == "truecolor" || colorterm == "24bit";

        let colors = if truecolor || term.contains("256color") {
            256
        } else if term.is_empty() || term == "dumb" {
            8
        } else {
            16
        };

        Self {
            colors,
            can_change_color: truecolor,
            max_pairs: if colors >= 256 { 32767 } else { 256 },
        }
    }

    /// Number of logical indices usable before wrapping
    pub fn map_entries(&self) -> usize {
        if self.colors >= 256 {
            COLOR_MAP.len()
        } else {
            16
        }
    }

    /// Convert a terminal color number to a crossterm color
    pub fn to_crossterm(&self, color: i16) -> Color {
        if color < 0 {
            return Color::Reset;
        }
        if self.can_change_color {
            if let Some((_, [r, g, b])) = EXTENDED_RGB.iter().find(|(n, _)| *n == color) {
                return Color::Rgb {
                    r: scale(*r),
                    g: scale(*g),
                    b: scale(*b),
                };
            }
        }
        Color::AnsiValue(color.clamp(0, 255) as u8)
    }
}

fn scale(v: u16) -> u8 {
    ((u32::from(v) * 255 + 500) / 1000) as u8
}

/// Registered (foreground, background) pairs, slot 0 reserved
#[derive(Debug, Clone)]
pub struct PairRegistry {
    pairs: Vec<(i16, i16)>,
    max_pairs: usize,
}

static PAIRS_EXHAUSTED: Once = Once::new();

impl PairRegistry {
    pub fn new(max_pairs: u16) -> Self {
        Self {
            pairs: Vec::new(),
            max_pairs: max_pairs as usize,
        }
    }

    /// Register the classic startup set: black on black, every base color
    /// on the default background, every distinct base combination, then
    /// same-color pairs while slots remain.
    pub fn with_defaults(max_pairs: u16, use_default_colors: bool) -> Self {
        let mut reg = Self::new(max_pairs);
        reg.init_pair(BLACK, BLACK);

        if use_default_colors {
            for &c in &BASE_COLORS {
                reg.init_pair(c, DEFAULT);
            }
        }

        for &fg in &BASE_COLORS {
            for &bg in &BASE_COLORS {
                if fg != bg {
                    reg.init_pair(fg, bg);
                }
            }
        }

        for &c in &BASE_COLORS[1..] {
            if reg.init_pair(c, c).is_none() {
                break;
            }
        }

        reg
    }

    /// Number of registered pairs
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Register a pair, returning its slot, or `None` when the terminal
    /// has no slots left
    pub fn init_pair(&mut self, fg: i16, bg: i16) -> Option<i16> {
        if self.pairs.len() + 1 >= self.max_pairs {
            return None;
        }
        self.pairs.push((fg, bg));
        Some(self.pairs.len() as i16)
    }

    /// Linear scan for an exact match; -1 when there is none
    pub fn find(&self, fg: i16, bg: i16) -> i16 {
        self.pairs
            .iter()
            .position(|&p| p == (fg, bg))
            .map(|i| i as i16 + 1)
            .unwrap_or(-1)
    }

    /// Foreground and background of a slot
    pub fn content(&self, pair: i16) -> Option<(i16, i16)> {
        if pair < 1 {
            return None;
        }
        self.pairs.get(pair as usize - 1).copied()
    }

    /// Find a pair, registering it when missing. Falls back to slot 0
    /// (no color) once the terminal runs out of slots.
    pub fn resolve(&mut self, fg: i16, bg: i16) -> i16 {
        let found = self.find(fg, bg);
        if found != -1 {
            return found;
        }
        match self.init_pair(fg, bg) {
            Some(slot) => slot,
            None => {
                PAIRS_EXHAUSTED.call_once(|| {
                    warn!(fg, bg, "color pairs exhausted, painting without color");
                });
                0
            }
        }
    }
}

/// Outcome of resolving a color code: pair slot plus whether bold applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedColor {
    pub pair: i16,
    pub bold: bool,
}

fn map_color(color: i16, entry: MapEntry) -> Option<i16> {
    match color {
        BLACK if entry.bold => Some(GREY),
        WHITE if !entry.bold => Some(LIGHT_GREY),
        _ => None,
    }
}

/// Resolve logical indices to a pair. `bg` < 0 means terminal default.
///
/// Returns `None` when no pair could be found or registered; callers paint
/// without color in that case.
pub fn resolve_color(
    caps: &TermCaps,
    pairs: &mut PairRegistry,
    fg: u8,
    bg: i16,
) -> Option<ResolvedColor> {
    let n = caps.map_entries();
    let fg_entry = COLOR_MAP[fg as usize % n];
    let bg_entry = (bg >= 0).then(|| COLOR_MAP[bg as usize % n]);

    let mut fg_color = fg_entry.color;
    let mut bg_color = bg_entry.map(|e| e.color).unwrap_or(DEFAULT);
    let mut remapped = false;

    if caps.colors >= 256 && caps.can_change_color {
        if let Some(c) = map_color(fg_color, fg_entry) {
            fg_color = c;
            remapped = true;
        }
        if let Some(c) = bg_entry.and_then(|e| map_color(bg_color, e)) {
            bg_color = c;
            remapped = true;
        }
    }

    let bold = !remapped && fg_entry.bold;

    match pairs.resolve(fg_color, bg_color) {
        0 => None,
        pair => Some(ResolvedColor { pair, bold }),
    }
}

/// Everything the paint path needs to turn color codes into pairs
#[derive(Debug, Clone)]
pub struct Palette {
    pub caps: TermCaps,
    pub pairs: PairRegistry,
    enabled: bool,
    use_default_colors: bool,
    term_background: i16,
}

impl Palette {
    pub fn new(caps: TermCaps, use_default_colors: bool, term_background: i16) -> Self {
        Self {
            caps,
            pairs: PairRegistry::with_defaults(caps.max_pairs, use_default_colors),
            enabled: true,
            use_default_colors,
            term_background,
        }
    }

    /// A palette for terminals without color: every code resolves to nothing
    pub fn disabled() -> Self {
        Self {
            caps: TermCaps::default(),
            pairs: PairRegistry::new(0),
            enabled: false,
            use_default_colors: true,
            term_background: 1,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Background index for a color code that names none
    pub fn default_background(&self) -> i16 {
        if self.use_default_colors {
            DEFAULT
        } else {
            self.term_background
        }
    }

    /// Resolve a parsed color code. `None` means paint without color.
    pub fn set_color(&mut self, code: ColorCode) -> Option<ResolvedColor> {
        if !self.enabled {
            return None;
        }
        let fg = code.fg?;
        let bg = code.bg.map(i16::from).unwrap_or_else(|| self.default_background());
        resolve_color(&self.caps, &mut self.pairs, fg, bg)
    }

    /// Terminal colors of a pair slot, `None` for slot 0 or when disabled
    pub fn pair_colors(&self, pair: i16) -> Option<(Color, Color)> {
        if !self.enabled || pair == 0 {
            return None;
        }
        let (fg, bg) = self.pairs.content(pair)?;
        Some((self.caps.to_crossterm(fg), self.caps.to_crossterm(bg)))
    }
}

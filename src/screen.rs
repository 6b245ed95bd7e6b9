//! Screen composition
//!
//! ```text
//! row 0          titlebar
//! rows 1..=H     active window pane (+ nicklist at the right edge)
//! row rows-2     statusbar
//! row rows-1     input line
//! ```
//!
//! where `H = rows - 3`. The screen owns every surface and turns them into
//! one ANSI frame; writing the frame out is the caller's business.

use crate::colors::{self, Palette};
use crate::config::{Config, MAX_CHAT_WINDOWS, TEXTBUFFER_SIZE_ABSOLUTE};
use crate::markup::strip_markup;
use crate::paint;
use crate::surface::{Attrs, Surface};
use crate::terminal;
use crate::window::{view_height, WindowRegistry};

/// Below this the screen is cleared instead of drawn
pub const MIN_ROWS: u16 = 4;
pub const MIN_COLS: u16 = 10;

const MORE: &str = "-- MORE --";

/// Theme pieces the bars need, captured once
#[derive(Debug, Clone)]
struct BarTheme {
    spec: String,
    left: String,
    right: String,
    slogan: String,
}

pub struct Screen {
    pub registry: WindowRegistry,
    pub palette: Palette,
    /// Our user modes as last reported by the server
    pub user_modes: String,
    nickname: String,
    server_host: String,
    rows: u16,
    cols: u16,
    titlebar: Surface,
    statusbar: Surface,
    input: Surface,
    theme: BarTheme,
}

impl Screen {
    pub fn new(config: &Config, mut palette: Palette, server_host: &str, rows: u16, cols: u16) -> Self {
        let capacity = config.integer(&TEXTBUFFER_SIZE_ABSOLUTE) as usize;
        let max_windows = config.integer(&MAX_CHAT_WINDOWS) as usize;
        let mut registry = WindowRegistry::new(rows, cols, max_windows, capacity);
        registry.set_default_logging(config.log.enabled);
        registry.status_mut().logging = config.log.enabled;

        let mut titlebar = Surface::new(cols, 1);
        titlebar.set_background(bar_attrs(
            &mut palette,
            config.theme_color("titlebar_fg", colors::BLACK),
            config.theme_color("titlebar_bg", colors::WHITE),
        ));
        let mut statusbar = Surface::new(cols, 1);
        statusbar.set_background(bar_attrs(
            &mut palette,
            config.theme_color("statusbar_fg", colors::WHITE),
            config.theme_color("statusbar_bg", colors::BLACK),
        ));

        let mut screen = Self {
            registry,
            palette,
            user_modes: String::new(),
            nickname: config.nickname().unwrap_or("-").to_string(),
            server_host: server_host.to_string(),
            rows,
            cols,
            titlebar,
            statusbar,
            input: Surface::new(cols, 1),
            theme: BarTheme {
                spec: config.theme("statusbar_spec"),
                left: config.theme("statusbar_leftBracket"),
                right: config.theme("statusbar_rightBracket"),
                slogan: config.theme("slogan"),
            },
        };
        screen.draw_bars();
        screen
    }

    /// (rows, cols)
    pub fn geometry(&self) -> (u16, u16) {
        (self.rows, self.cols)
    }

    pub fn is_too_small(&self) -> bool {
        self.rows < MIN_ROWS || self.cols < MIN_COLS
    }

    pub fn titlebar(&self) -> &Surface {
        &self.titlebar
    }

    pub fn statusbar(&self) -> &Surface {
        &self.statusbar
    }

    pub fn input(&self) -> &Surface {
        &self.input
    }

    /// Copy the line editor's active panel onto the input row
    pub fn set_input(&mut self, panel: &Surface) {
        self.input = panel.clone();
    }

    /// Re-layout every window and bar for a new terminal size
    pub fn resize(&mut self, rows: u16, cols: u16) {
        self.rows = rows;
        self.cols = cols;
        self.registry.recreate_all(&mut self.palette, rows, cols);
        self.titlebar.resize(cols, 1);
        self.statusbar.resize(cols, 1);
        self.input.resize(cols, 1);
        self.draw_bars();
    }

    pub fn draw_bars(&mut self) {
        self.draw_titlebar();
        self.draw_statusbar();
    }

    pub fn draw_titlebar(&mut self) {
        let text = match &self.registry.active().title {
            Some(title) => format!(" {} ", strip_markup(title)),
            None => String::new(),
        };
        self.titlebar.erase();
        paint::puts(&mut self.titlebar, None, &text, 0, 0);
    }

    pub fn draw_statusbar(&mut self) {
        let text = self.statusbar_text();
        let text = if self.palette.is_enabled() {
            text
        } else {
            strip_markup(&text)
        };
        self.statusbar.erase();
        paint::puts(&mut self.statusbar, Some(&mut self.palette), &text, 0, 0);
    }

    /// Markup source of the statusbar for the active window
    pub fn statusbar_text(&self) -> String {
        let BarTheme {
            spec,
            left: lb,
            right: rb,
            slogan,
        } = &self.theme;
        let window = self.registry.active();
        let modes = self.user_modes.strip_prefix(':').unwrap_or(&self.user_modes);

        let mut s = format!(
            "{spec} {lb}{}({}){rb} {lb}{}({modes})@{}{rb} ",
            window.refnum,
            self.registry.len(),
            self.nickname,
            self.server_host,
        );

        let place = if window.is_status() {
            slogan.clone()
        } else if window.is_channel() {
            format!("{}({})", window.label, window.chanmodes)
        } else {
            window.label.clone()
        };
        s.push_str(&format!("{lb}{place}{rb} {lb}Log: {}{rb}", if window.logging { "Yes" } else { "No" }));

        if window.is_channel() && window.received_names {
            s.push_str(&format!(" {lb}Nicks: {}{rb}", window.nicklist.counts().total));
        }
        if window.scroll.mode {
            s.push(' ');
            s.push_str(MORE);
        }
        s
    }

    /// One full frame as ANSI text, cursor left on the input row
    pub fn render(&self) -> String {
        let mut out = terminal::hide_cursor();
        if self.is_too_small() {
            out.push_str(&terminal::clear_screen());
            return out;
        }

        out.push_str(&terminal::move_to(0, 0));
        out.push_str(&self.titlebar.row_ansi(0, &self.palette));

        let window = self.registry.active();
        let pane = window.pane();
        for y in 0..view_height(self.rows) as u16 {
            out.push_str(&terminal::move_to(y + 1, 0));
            out.push_str(&pane.row_ansi(y, &self.palette));
            if let Some(nicks) = window.nick_pane() {
                out.push_str(&terminal::move_to(y + 1, pane.width()));
                out.push_str(&nicks.row_ansi(y, &self.palette));
            }
        }

        out.push_str(&terminal::move_to(self.rows - 2, 0));
        out.push_str(&self.statusbar.row_ansi(0, &self.palette));
        out.push_str(&terminal::move_to(self.rows - 1, 0));
        out.push_str(&self.input.row_ansi(0, &self.palette));

        out.push_str(&terminal::move_to(self.rows - 1, self.input.cursor().1));
        out.push_str(&terminal::show_cursor());
        out
    }
}

fn bar_attrs(palette: &mut Palette, fg: i16, bg: i16) -> Attrs {
    let pair = if palette.is_enabled() {
        palette.pairs.resolve(fg, bg)
    } else {
        0
    };
    Attrs {
        pair,
        ..Attrs::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colors::TermCaps;

    fn plain() -> Screen {
        let config = Config::parse("[general]\nnickname = \"ferris\"\n").unwrap();
        Screen::new(&config, Palette::disabled(), "irc.example.org", 10, 100)
    }

    #[test]
    fn test_statusbar_for_status_window() {
        let screen = plain();
        let text = strip_markup(&screen.statusbar_text());
        assert!(text.starts_with("[-] [1(1)] [ferris()@irc.example.org] "));
        assert!(text.ends_with("[Log: No]"));
        assert_eq!(screen.statusbar().row_text(0), text.trim_end());
    }

    #[test]
    fn test_statusbar_for_channel() {
        let mut screen = plain();
        screen.registry.spawn("#rust", Some("Rust talk")).unwrap();
        {
            let w = screen.registry.active_mut();
            w.chanmodes = "+nt".into();
            w.nicklist.add_prefixed("@alice");
            w.nicklist.add_prefixed("bob");
            w.received_names = true;
            w.scroll.mode = true;
        }
        screen.user_modes = ":+i".into();
        screen.draw_bars();

        let text = strip_markup(&screen.statusbar_text());
        assert!(text.contains("[2(2)]"));
        assert!(text.contains("[ferris(+i)@irc.example.org]"));
        assert!(text.contains("[#rust(+nt)]"));
        assert!(text.contains("[Nicks: 2]"));
        assert!(text.ends_with("-- MORE --"));
        assert_eq!(screen.titlebar().row_text(0), " Rust talk");
    }

    #[test]
    fn test_bars_carry_their_colors() {
        let config = Config::default();
        let palette = Palette::new(TermCaps::default(), true, 1);
        let screen = Screen::new(&config, palette, "h", 10, 40);
        let pair = screen.titlebar().cell(0, 39).unwrap().attrs.pair;
        assert_ne!(pair, 0);
        assert_eq!(screen.palette.pairs.content(pair), Some((colors::BLACK, colors::WHITE)));
    }

    #[test]
    fn test_render_layout() {
        let mut screen = plain();
        {
            let (s, p) = (&mut screen.registry, &mut screen.palette);
            s.active_mut().append(p, "hello there", 0);
        }
        let frame = screen.render();
        assert!(frame.contains(&terminal::move_to(1, 0)));
        assert!(frame.contains("hello there"));
        assert!(frame.contains(&terminal::move_to(8, 0)));
        assert!(frame.ends_with(&terminal::show_cursor()));
    }

    #[test]
    fn test_tiny_terminal_is_cleared() {
        let config = Config::default();
        let screen = Screen::new(&config, Palette::disabled(), "h", 3, 60);
        assert!(screen.is_too_small());
        assert!(screen.render().ends_with(&terminal::clear_screen()));
    }

    #[test]
    fn test_resize_relayouts() {
        let mut screen = plain();
        screen.resize(20, 120);
        assert_eq!(screen.geometry(), (20, 120));
        assert_eq!(screen.statusbar().width(), 120);
        assert_eq!(screen.registry.geometry(), (20, 120));
    }
}

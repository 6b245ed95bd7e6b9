//! Line editor for the input row
//!
//! One [`Editor`] lives for one read. It keeps the typed text in a
//! [`tui_input::Input`] and mirrors it onto one of two single-row panels.
//! When the cursor runs into either edge of the row the editor swaps to
//! the other panel and redraws a slice of the buffer anchored at the
//! cursor, so a line longer than the terminal scrolls half a screen at a
//! time.
//!
//! - Cursor movement (arrows, Ctrl+B/F, Ctrl+A/E)
//! - Decoration bytes on F5..F10, shown as reverse-video letters
//! - Tab completion through the [`Host`]
//! - Up/Down, BEL and resize end the read with [`Outcome::Cancelled`]

pub mod completion;

use std::time::Duration;

use tracing::warn;
use tui_input::{Input, InputRequest};

use crate::keys::{Key, KeySource};
use crate::markup::{display_letter, is_markup, BLINK, BOLD, COLOR, NORMAL, REVERSE, UNDERLINE};
use crate::surface::{Attrs, Surface};
use crate::terminal::ResizeFlag;
use crate::width::{char_width, str_width};

pub use completion::{CompletionKind, Completer, Step};

/// Characters the buffer can hold, terminator slot included
pub const BUFFER_CAPACITY: usize = 2700;

/// How long one key poll waits before the loop re-checks the resize flag
pub const POLL_INTERVAL: Duration = Duration::from_millis(90);

/// Why a read ended without a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    HistoryPrev,
    HistoryNext,
    Resize,
    Bell,
    InputClosed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Submitted(String),
    Cancelled(CancelReason),
    /// Enter on an empty line
    Empty,
}

/// Scroll requests the editor forwards to the active window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollKey {
    PageUp,
    PageDown,
    NicklistUp,
    NicklistDown,
}

/// What the editor needs from the rest of the client. Every call is
/// short; nothing here is held across a key read.
pub trait Host {
    fn beep(&mut self);

    /// Focus the next or previous window; returns its prompt if the
    /// focus moved
    fn switch_window(&mut self, forward: bool) -> Option<String>;

    /// Returns false when the window cannot scroll that way
    fn scroll(&mut self, key: ScrollKey) -> bool;

    fn in_channel(&self) -> bool;

    fn candidates(&mut self, kind: CompletionKind, prefix: &str) -> Vec<String>;

    /// Show a failure message in the active window
    fn report(&mut self, msg: &str);

    /// Put the active input panel on screen
    fn show(&mut self, panel: &Surface);
}

/// Columns a buffer character takes on the input row
fn glyph_width(c: char) -> usize {
    if is_markup(c) {
        1
    } else {
        char_width(c)
    }
}

/// Draw one buffer character, decoration bytes as reverse letters
fn put_glyph(panel: &mut Surface, c: char, insert: bool) -> bool {
    let (shown, reverse) = match display_letter(c) {
        Some(letter) => (letter, true),
        None => (c, false),
    };
    panel.set_attrs(Attrs {
        reverse,
        ..Attrs::default()
    });
    let placed = if insert {
        panel.insert_char(shown)
    } else {
        panel.add_char(shown)
    };
    panel.set_attrs(Attrs::default());
    placed
}

pub struct Editor {
    input: Input,
    vispos: usize,
    prompt: String,
    prompt_width: u16,
    cols: u16,
    panels: [Surface; 2],
    active: usize,
    completer: Completer,
    disable_beeps: bool,
}

impl Editor {
    pub fn new(prompt: &str, cols: u16, disable_beeps: bool) -> Self {
        let mut editor = Self {
            input: Input::default(),
            vispos: 0,
            prompt: String::new(),
            prompt_width: 0,
            cols,
            panels: [Surface::new(cols, 1), Surface::new(cols, 1)],
            active: 0,
            completer: Completer::new(),
            disable_beeps,
        };
        editor.set_prompt(prompt);
        editor
    }

    pub fn value(&self) -> &str {
        self.input.value()
    }

    /// Cursor index into the buffer, in characters
    pub fn bufpos(&self) -> usize {
        self.input.cursor()
    }

    /// Characters in the buffer
    pub fn numins(&self) -> usize {
        self.input.value().chars().count()
    }

    /// Columns taken by everything left of the cursor
    pub fn vispos(&self) -> usize {
        self.vispos
    }

    /// Insert mode: the cursor is inside the text rather than at its end
    pub fn insert_mode(&self) -> bool {
        self.bufpos() != self.numins()
    }

    pub fn no_bufspc(&self) -> bool {
        self.numins() + 1 >= BUFFER_CAPACITY
    }

    pub fn panel(&self) -> &Surface {
        &self.panels[self.active]
    }

    /// Which of the two panels is on top
    pub fn active_panel(&self) -> usize {
        self.active
    }

    fn cursor_col(&self) -> u16 {
        self.panel().cursor().1
    }

    fn panel_mut(&mut self) -> &mut Surface {
        &mut self.panels[self.active]
    }

    fn chars(&self) -> Vec<char> {
        self.input.value().chars().collect()
    }

    fn bell<H: Host + ?Sized>(&self, host: &mut H) {
        if !self.disable_beeps {
            host.beep();
        }
    }

    /// Replace the prompt and redraw the visible part of the line
    pub fn set_prompt(&mut self, prompt: &str) {
        let limit = (self.cols / 2) as usize;
        let mut width = 0;
        self.prompt = prompt
            .chars()
            .take_while(|&c| {
                width += char_width(c);
                width <= limit
            })
            .collect();
        self.prompt_width = str_width(&self.prompt) as u16;
        self.draw_visible_slice(false);
    }

    fn write_prompt(&mut self) {
        let prompt = self.prompt.clone();
        let panel = self.panel_mut();
        panel.erase();
        panel.add_str(&prompt);
    }

    /// Draw the buffer from `bufpos` on without moving the cursor
    fn draw_tail(&mut self) {
        let tail: Vec<char> = self.chars().into_iter().skip(self.bufpos()).collect();
        let panel = self.panel_mut();
        let (y, x) = panel.cursor();
        for c in tail {
            if panel.cursor().1 >= panel.width() {
                break;
            }
            put_glyph(panel, c, false);
        }
        panel.move_to(y, x);
    }

    /// Rewrite the prompt and the slice of the buffer around the cursor
    fn draw_visible_slice(&mut self, forward: bool) {
        let chars = self.chars();
        let bufpos = self.bufpos();
        let half = (self.cols / 2) as usize;

        let mut start = if forward {
            let even = usize::from(self.cols % 2 == 0);
            (bufpos + even).saturating_sub(half)
        } else {
            let back = half.saturating_sub(self.prompt_width as usize).max(1);
            bufpos.saturating_sub(back)
        }
        .min(bufpos);

        // wide glyphs can make the slice longer than the row
        let room = (self.cols as usize).saturating_sub(1 + self.prompt_width as usize);
        while start < bufpos && chars[start..bufpos].iter().map(|&c| glyph_width(c)).sum::<usize>() > room {
            start += 1;
        }

        self.write_prompt();
        let panel = self.panel_mut();
        for &c in &chars[start..bufpos] {
            put_glyph(panel, c, false);
        }
        if bufpos != chars.len() {
            self.draw_tail();
        }
    }

    fn swap_panels(&mut self, forward: bool) {
        self.active ^= 1;
        self.draw_visible_slice(forward);
    }

    fn at_low_limit(&self) -> bool {
        self.cursor_col() <= self.prompt_width
    }

    fn at_high_limit(&self) -> bool {
        self.cursor_col() >= self.cols.saturating_sub(1)
    }

    fn move_cursor(&mut self, delta: isize) {
        let panel = self.panel_mut();
        let (y, x) = panel.cursor();
        let x = (x as isize + delta).max(0) as u16;
        panel.move_to(y, x);
    }

    /// Insert a character at the cursor
    pub fn insert<H: Host + ?Sized>(&mut self, host: &mut H, c: char) {
        if self.no_bufspc() {
            self.bell(host);
            return;
        }
        if self.at_high_limit() {
            self.swap_panels(true);
        }

        let width = glyph_width(c);
        let insert = self.insert_mode();
        self.input.handle(InputRequest::InsertChar(c));
        self.vispos += width;

        if insert {
            if put_glyph(self.panel_mut(), c, true) {
                self.move_cursor(width as isize);
            }
        } else {
            put_glyph(self.panel_mut(), c, false);
        }
        debug_assert!(self.bufpos() <= self.numins());
    }

    /// The character just left of the cursor
    fn prev_char(&self) -> Option<char> {
        self.bufpos()
            .checked_sub(1)
            .and_then(|i| self.input.value().chars().nth(i))
    }

    fn next_char(&self) -> Option<char> {
        self.input.value().chars().nth(self.bufpos())
    }

    pub fn left<H: Host + ?Sized>(&mut self, host: &mut H) {
        let Some(c) = self.prev_char() else {
            self.bell(host);
            return;
        };
        if self.at_low_limit() {
            self.swap_panels(false);
        }
        let width = glyph_width(c);
        self.input.handle(InputRequest::GoToPrevChar);
        self.vispos -= width;
        self.move_cursor(-(width as isize));
    }

    pub fn right<H: Host + ?Sized>(&mut self, host: &mut H) {
        let Some(c) = self.next_char().filter(|_| self.insert_mode()) else {
            self.bell(host);
            return;
        };
        if self.at_high_limit() {
            self.swap_panels(true);
        }
        let width = glyph_width(c);
        self.input.handle(InputRequest::GoToNextChar);
        self.vispos += width;
        self.move_cursor(width as isize);
    }

    pub fn backspace<H: Host + ?Sized>(&mut self, host: &mut H) {
        let Some(c) = self.prev_char() else {
            self.bell(host);
            return;
        };
        if self.at_low_limit() {
            self.swap_panels(false);
        }

        let width = glyph_width(c);
        let insert = self.insert_mode();
        self.input.handle(InputRequest::DeletePrevChar);
        self.vispos -= width;
        self.move_cursor(-(width as isize));

        let panel = self.panel_mut();
        panel.delete_cols(width as u16);
        if insert {
            panel.clear_to_eol();
            self.draw_tail();
        }
    }

    pub fn delete<H: Host + ?Sized>(&mut self, host: &mut H) {
        let Some(c) = self.next_char().filter(|_| self.insert_mode()) else {
            self.bell(host);
            return;
        };
        self.input.handle(InputRequest::DeleteNextChar);

        let panel = self.panel_mut();
        panel.delete_cols(glyph_width(c) as u16);
        panel.clear_to_eol();
        self.draw_tail();
    }

    pub fn home<H: Host + ?Sized>(&mut self, host: &mut H) {
        while self.bufpos() > 0 {
            self.left(host);
        }
    }

    pub fn end<H: Host + ?Sized>(&mut self, host: &mut H) {
        while self.insert_mode() {
            self.right(host);
        }
    }

    /// Empty the buffer and leave only the prompt
    fn clear_line(&mut self) {
        self.input.reset();
        self.vispos = 0;
        self.write_prompt();
    }

    fn tab_failed<H: Host + ?Sized>(&mut self, host: &mut H, msg: &str) {
        host.report(msg);
        self.bell(host);
    }

    pub fn tab<H: Host + ?Sized>(&mut self, host: &mut H) {
        if self.numins() == 0 || self.insert_mode() || self.value().chars().any(is_markup) {
            self.completer.reset();
            self.tab_failed(host, completion::NO_MAGIC);
            return;
        }

        let line = self.value().to_string();
        let in_channel = host.in_channel();
        let step = self
            .completer
            .tab(&line, in_channel, |kind, prefix| host.candidates(kind, prefix));

        match step {
            Step::Complete(text) => {
                self.clear_line();
                for c in text.chars() {
                    self.insert(host, c);
                }
            }
            Step::Fail(msg) => self.tab_failed(host, msg),
        }
    }

    fn submit(&mut self) -> Outcome {
        if self.numins() == 0 {
            return Outcome::Empty;
        }
        let line = self.value().to_string();
        self.input.reset();
        self.vispos = 0;
        self.panel_mut().erase();
        Outcome::Submitted(line)
    }

    /// Apply one key. Returns the outcome when the key ends the read.
    pub fn handle<H: Host + ?Sized>(&mut self, host: &mut H, key: Key) -> Option<Outcome> {
        if key != Key::Tab {
            self.completer.reset();
        }

        match key {
            Key::Ctrl('p') | Key::Ctrl('n') => {
                if let Some(prompt) = host.switch_window(key == Key::Ctrl('n')) {
                    self.set_prompt(&prompt);
                }
            }
            Key::Up => return Some(Outcome::Cancelled(CancelReason::HistoryPrev)),
            Key::Down => return Some(Outcome::Cancelled(CancelReason::HistoryNext)),
            Key::Bell => return Some(Outcome::Cancelled(CancelReason::Bell)),
            Key::Left | Key::Ctrl('b') => self.left(host),
            Key::Right | Key::Ctrl('f') => self.right(host),
            Key::Backspace => self.backspace(host),
            Key::Delete | Key::Ctrl('d') => self.delete(host),
            Key::Home | Key::Ctrl('a') => self.home(host),
            Key::End | Key::Ctrl('e') => self.end(host),
            Key::F(n @ 5..=10) => {
                let byte = [BLINK, BOLD, COLOR, NORMAL, REVERSE, UNDERLINE][(n - 5) as usize];
                self.insert(host, byte);
            }
            Key::PageUp => self.forward_scroll(host, ScrollKey::PageUp),
            Key::PageDown => self.forward_scroll(host, ScrollKey::PageDown),
            Key::AltUp => self.forward_scroll(host, ScrollKey::NicklistUp),
            Key::AltDown => self.forward_scroll(host, ScrollKey::NicklistDown),
            Key::Tab => self.tab(host),
            Key::Enter => {
                let outcome = self.submit();
                host.show(self.panel());
                return Some(outcome);
            }
            Key::Char(c) if !c.is_control() => self.insert(host, c),
            _ => {}
        }
        None
    }

    fn forward_scroll<H: Host + ?Sized>(&mut self, host: &mut H, key: ScrollKey) {
        if !host.scroll(key) {
            self.bell(host);
        }
    }

    /// Read keys until the line is submitted or the read is cancelled.
    ///
    /// The resize flag is checked before every poll; a raised flag ends
    /// the read so the caller can re-layout and start a new one.
    pub fn run<H, K>(&mut self, host: &mut H, keys: &mut K, resize: &ResizeFlag) -> Outcome
    where
        H: Host + ?Sized,
        K: KeySource + ?Sized,
    {
        host.show(self.panel());
        loop {
            if resize.take() {
                return Outcome::Cancelled(CancelReason::Resize);
            }

            let key = match keys.next_key(POLL_INTERVAL) {
                Ok(Some(key)) => key,
                Ok(None) => continue,
                Err(e) => {
                    warn!(error = %e, "key input failed, ending read");
                    return Outcome::Cancelled(CancelReason::InputClosed);
                }
            };

            if let Some(outcome) = self.handle(host, key) {
                return outcome;
            }
            host.show(self.panel());
        }
    }
}

/// Run one read on a fresh editor
pub fn readline<H, K>(
    host: &mut H,
    keys: &mut K,
    prompt: &str,
    cols: u16,
    disable_beeps: bool,
    resize: &ResizeFlag,
) -> Outcome
where
    H: Host + ?Sized,
    K: KeySource + ?Sized,
{
    Editor::new(prompt, cols, disable_beeps).run(host, keys, resize)
}

#[cfg(test)]
mod tests {
    use super::completion::filter_prefix;
    use super::*;
    use crate::keys::ScriptedKeys;

    #[derive(Default)]
    struct MockHost {
        beeps: usize,
        reports: Vec<String>,
        windows: Vec<String>,
        active: usize,
        scrolls: Vec<ScrollKey>,
        can_scroll: bool,
        nicks: Vec<&'static str>,
        shown: usize,
    }

    impl Host for MockHost {
        fn beep(&mut self) {
            self.beeps += 1;
        }

        fn switch_window(&mut self, forward: bool) -> Option<String> {
            let next = if forward {
                self.active + 1
            } else {
                self.active.checked_sub(1)?
            };
            let label = self.windows.get(next)?;
            self.active = next;
            Some(format!("{label}: "))
        }

        fn scroll(&mut self, key: ScrollKey) -> bool {
            self.scrolls.push(key);
            self.can_scroll
        }

        fn in_channel(&self) -> bool {
            !self.nicks.is_empty()
        }

        fn candidates(&mut self, kind: CompletionKind, prefix: &str) -> Vec<String> {
            match kind {
                CompletionKind::Command => completion::matching_commands(prefix),
                _ => filter_prefix(self.nicks.iter().copied(), prefix),
            }
        }

        fn report(&mut self, msg: &str) {
            self.reports.push(msg.to_string());
        }

        fn show(&mut self, _panel: &Surface) {
            self.shown += 1;
        }
    }

    fn run_bytes(host: &mut MockHost, cols: u16, bytes: &[u8]) -> Outcome {
        let mut keys = ScriptedKeys::from_bytes(bytes);
        readline(host, &mut keys, "> ", cols, false, &ResizeFlag::new())
    }

    fn type_str(editor: &mut Editor, host: &mut MockHost, s: &str) {
        for c in s.chars() {
            editor.insert(host, c);
        }
    }

    fn check_invariants(editor: &Editor) {
        let chars: Vec<char> = editor.value().chars().collect();
        assert!(editor.bufpos() <= editor.numins());
        assert!(editor.numins() < BUFFER_CAPACITY);
        let expected: usize = chars[..editor.bufpos()].iter().map(|&c| glyph_width(c)).sum();
        assert_eq!(editor.vispos(), expected);
        assert!(editor.panel().cursor().1 < editor.cols.max(1) + 1);
    }

    #[test]
    fn test_submit_line() {
        let mut host = MockHost::default();
        let outcome = run_bytes(&mut host, 40, b"hello\r");
        assert_eq!(outcome, Outcome::Submitted("hello".into()));
        assert!(host.shown > 0);
    }

    #[test]
    fn test_empty_enter() {
        let mut host = MockHost::default();
        assert_eq!(run_bytes(&mut host, 40, b"\r"), Outcome::Empty);
    }

    #[test]
    fn test_cancellations() {
        let mut host = MockHost::default();
        assert_eq!(
            run_bytes(&mut host, 40, b"ab\x1b[A"),
            Outcome::Cancelled(CancelReason::HistoryPrev)
        );
        assert_eq!(
            run_bytes(&mut host, 40, b"\x1b[B"),
            Outcome::Cancelled(CancelReason::HistoryNext)
        );
        assert_eq!(run_bytes(&mut host, 40, b"x\x07"), Outcome::Cancelled(CancelReason::Bell));
        assert_eq!(run_bytes(&mut host, 40, b"abc"), Outcome::Cancelled(CancelReason::InputClosed));
    }

    #[test]
    fn test_resize_ends_read() {
        let mut host = MockHost::default();
        let flag = ResizeFlag::new();
        flag.raise();
        let mut keys = ScriptedKeys::from_bytes(b"never read\r");
        let outcome = readline(&mut host, &mut keys, "> ", 40, false, &flag);
        assert_eq!(outcome, Outcome::Cancelled(CancelReason::Resize));
        assert!(!flag.take());
        assert_eq!(keys.remaining(), 11);
    }

    #[test]
    fn test_insert_in_middle() {
        let mut host = MockHost::default();
        let mut ed = Editor::new("> ", 40, false);
        type_str(&mut ed, &mut host, "helo");
        ed.handle(&mut host, Key::Left);
        assert!(ed.insert_mode());
        ed.insert(&mut host, 'l');
        assert_eq!(ed.value(), "hello");
        assert_eq!(ed.bufpos(), 4);
        assert_eq!(ed.panel().row_text(0), "> hello");
        assert_eq!(ed.panel().cursor(), (0, 6));
        check_invariants(&ed);
    }

    #[test]
    fn test_bells() {
        let mut host = MockHost::default();
        let mut ed = Editor::new("> ", 40, false);
        ed.handle(&mut host, Key::Backspace);
        ed.handle(&mut host, Key::Left);
        ed.handle(&mut host, Key::Right);
        ed.handle(&mut host, Key::Delete);
        assert_eq!(host.beeps, 4);

        let mut quiet = Editor::new("> ", 40, true);
        quiet.handle(&mut host, Key::Backspace);
        assert_eq!(host.beeps, 4);
    }

    #[test]
    fn test_delete_and_backspace_in_insert_mode() {
        let mut host = MockHost::default();
        let mut ed = Editor::new("> ", 40, false);
        type_str(&mut ed, &mut host, "abcd");
        ed.handle(&mut host, Key::Ctrl('b'));
        ed.handle(&mut host, Key::Ctrl('b'));
        ed.handle(&mut host, Key::Ctrl('d'));
        assert_eq!(ed.value(), "abd");
        assert_eq!(ed.panel().row_text(0), "> abd");
        ed.handle(&mut host, Key::Backspace);
        assert_eq!(ed.value(), "ad");
        assert_eq!(ed.panel().row_text(0), "> ad");
        assert_eq!(ed.bufpos(), 1);
        assert_eq!(ed.panel().cursor(), (0, 3));
        check_invariants(&ed);
    }

    #[test]
    fn test_vispos_tracks_wide_glyphs() {
        let mut host = MockHost::default();
        let mut ed = Editor::new("> ", 30, false);
        let script = [
            Key::Char('日'),
            Key::Char('a'),
            Key::Char('本'),
            Key::Left,
            Key::Char('é'),
            Key::Home,
            Key::Right,
            Key::Backspace,
            Key::End,
            Key::F(6),
            Key::Char('語'),
            Key::Left,
            Key::Left,
            Key::Delete,
        ];
        for key in script {
            ed.handle(&mut host, key);
            check_invariants(&ed);
        }
        assert_eq!(ed.value(), "aé本語");
    }

    #[test]
    fn test_long_line_swaps_panels() {
        let mut host = MockHost::default();
        let mut ed = Editor::new("> ", 20, false);
        type_str(&mut ed, &mut host, "abcdefghijklmnopqr");
        assert_eq!(ed.active_panel(), 1);
        assert_eq!(ed.panel().row_text(0), "> ijklmnopqr");
        assert_eq!(ed.panel().cursor(), (0, 12));
        check_invariants(&ed);

        ed.handle(&mut host, Key::Home);
        assert_eq!(ed.bufpos(), 0);
        assert_eq!(ed.active_panel(), 0);
        assert_eq!(ed.panel().row_text(0), "> abcdefghijklmnopqr");
        assert_eq!(ed.panel().cursor(), (0, 2));
        check_invariants(&ed);

        ed.handle(&mut host, Key::End);
        assert_eq!(ed.bufpos(), 18);
        assert!(!ed.insert_mode());
        check_invariants(&ed);
    }

    #[test]
    fn test_very_long_line_stays_consistent() {
        let mut host = MockHost::default();
        let mut ed = Editor::new("#rust: ", 24, false);
        for i in 0..200 {
            ed.insert(&mut host, char::from(b'a' + (i % 26) as u8));
            check_invariants(&ed);
        }
        for _ in 0..120 {
            ed.handle(&mut host, Key::Left);
            check_invariants(&ed);
        }
        for _ in 0..50 {
            ed.handle(&mut host, Key::Backspace);
            ed.handle(&mut host, Key::Right);
            check_invariants(&ed);
        }
        assert_eq!(host.beeps, 0);
        assert_eq!(ed.numins(), 150);
    }

    #[test]
    fn test_buffer_capacity() {
        let mut host = MockHost::default();
        let mut ed = Editor::new("> ", 80, false);
        for _ in 0..BUFFER_CAPACITY + 5 {
            ed.insert(&mut host, 'x');
        }
        assert_eq!(ed.numins(), BUFFER_CAPACITY - 1);
        assert_eq!(host.beeps, 6);
        assert!(ed.no_bufspc());
    }

    #[test]
    fn test_markup_keys() {
        let mut host = MockHost::default();
        let mut ed = Editor::new("> ", 40, false);
        ed.handle(&mut host, Key::F(6));
        ed.handle(&mut host, Key::Char('x'));
        assert_eq!(ed.value(), "\x02x");
        assert_eq!(ed.panel().row_text(0), "> Bx");
        let cell = ed.panel().cell(0, 2).unwrap();
        assert_eq!(cell.ch, 'B');
        assert!(cell.attrs.reverse);
        assert!(!ed.panel().cell(0, 3).unwrap().attrs.reverse);
    }

    #[test]
    fn test_window_switch_keeps_session() {
        let mut host = MockHost {
            windows: vec!["(status)".into(), "#rust".into()],
            ..MockHost::default()
        };
        let outcome = run_bytes(&mut host, 40, b"hi\x0e!\r");
        assert_eq!(outcome, Outcome::Submitted("hi!".into()));
        assert_eq!(host.active, 1);
    }

    #[test]
    fn test_window_switch_rewrites_prompt() {
        let mut host = MockHost {
            windows: vec!["(status)".into(), "#rust".into()],
            ..MockHost::default()
        };
        let mut ed = Editor::new("> ", 40, false);
        type_str(&mut ed, &mut host, "hi");
        ed.handle(&mut host, Key::Ctrl('n'));
        assert_eq!(ed.panel().row_text(0), "#rust: hi");
        ed.handle(&mut host, Key::Ctrl('n'));
        assert_eq!(host.active, 1);
    }

    #[test]
    fn test_page_keys_reach_host() {
        let mut host = MockHost::default();
        let mut ed = Editor::new("> ", 40, false);
        ed.handle(&mut host, Key::PageUp);
        assert_eq!(host.beeps, 1);
        host.can_scroll = true;
        ed.handle(&mut host, Key::PageDown);
        ed.handle(&mut host, Key::AltUp);
        assert_eq!(host.beeps, 1);
        assert_eq!(
            host.scrolls,
            vec![ScrollKey::PageUp, ScrollKey::PageDown, ScrollKey::NicklistUp]
        );
    }

    #[test]
    fn test_tab_completes_nicks() {
        let mut host = MockHost {
            nicks: vec!["alice", "albert"],
            ..MockHost::default()
        };
        let mut ed = Editor::new("#rust: ", 40, false);
        type_str(&mut ed, &mut host, "al");
        ed.handle(&mut host, Key::Tab);
        assert_eq!(ed.value(), "alice: ");
        ed.handle(&mut host, Key::Tab);
        assert_eq!(ed.value(), "albert: ");
        assert_eq!(ed.panel().row_text(0), "#rust: albert:");
        check_invariants(&ed);

        ed.handle(&mut host, Key::Tab);
        assert_eq!(host.reports, vec![completion::NO_MORE_MATCHES.to_string()]);
        assert_eq!(host.beeps, 1);
    }

    #[test]
    fn test_tab_refusals() {
        let mut host = MockHost::default();
        let mut ed = Editor::new("> ", 40, false);
        ed.handle(&mut host, Key::Tab);

        type_str(&mut ed, &mut host, "/he");
        ed.handle(&mut host, Key::Left);
        ed.handle(&mut host, Key::Tab);

        ed.handle(&mut host, Key::End);
        ed.handle(&mut host, Key::F(7));
        ed.handle(&mut host, Key::Tab);

        assert_eq!(host.reports, vec![completion::NO_MAGIC.to_string(); 3]);
        assert_eq!(ed.value(), "/he\x03");
    }

    #[test]
    fn test_tab_completes_commands() {
        let mut host = MockHost::default();
        let mut ed = Editor::new("> ", 40, false);
        type_str(&mut ed, &mut host, "/he");
        ed.handle(&mut host, Key::Tab);
        assert_eq!(ed.value(), "/help");
        ed.handle(&mut host, Key::Char(' '));
        assert_eq!(ed.value(), "/help ");
        assert!(host.reports.is_empty());
    }
}

//! Keyboard input: the [`Key`] type and key sources
//!
//! Live input comes from crossterm events through [`from_crossterm`]
//! (see `terminal::CrosstermKeys`). The byte decoder here
//! ([`EscapeParser`], [`decode`]) is not on that path: it only feeds
//! [`ScriptedKeys`], so tests can write keystrokes as the raw bytes a
//! terminal would send. It understands:
//! - Arrow keys (ESC [ A/B/C/D, ESC O A/B/C/D), with Alt (ESC [ 1;3 A)
//! - Home/End, Delete, PageUp/PageDown
//! - Function keys (ESC O P..S, ESC [ 15~ .. 24~)
//! - UTF-8 encoded characters
//!
//! The line editor reads [`Key`]s from a [`KeySource`].

use std::collections::VecDeque;
use std::time::Duration;

use anyhow::{bail, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Parsed terminal input event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Regular character input
    Char(char),
    Enter,
    Backspace,
    Tab,
    /// Escape key (bare ESC, not part of a sequence)
    Escape,
    /// BEL, used to interrupt the line editor
    Bell,
    Up,
    Down,
    Left,
    Right,
    AltUp,
    AltDown,
    Home,
    End,
    Delete,
    PageUp,
    PageDown,
    /// Function key F1..F12
    F(u8),
    /// Control + letter, lowercase
    Ctrl(char),
    /// Unknown or unhandled
    Unknown(u8),
}

/// Byte-level decoder behind [`ScriptedKeys::from_bytes`]
#[derive(Debug, Default)]
pub struct EscapeParser {
    state: ParseState,
    params: Vec<u8>,
    utf8: Vec<u8>,
    utf8_len: usize,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    #[default]
    Normal,
    /// Got ESC (0x1b)
    Escape,
    /// Got ESC [
    Csi,
    /// Got ESC O
    Ss3,
    /// Inside a multi-byte UTF-8 sequence
    Utf8,
}

impl EscapeParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a byte and return the parsed key, if one is complete
    pub fn feed(&mut self, byte: u8) -> Option<Key> {
        match self.state {
            ParseState::Normal => self.handle_normal(byte),
            ParseState::Escape => self.handle_escape(byte),
            ParseState::Csi => self.handle_csi(byte),
            ParseState::Ss3 => self.handle_ss3(byte),
            ParseState::Utf8 => self.handle_utf8(byte),
        }
    }

    /// Flush pending state when input pauses.
    /// Returns Escape if we were waiting for a sequence that never came.
    pub fn flush(&mut self) -> Option<Key> {
        let pending = self.state;
        self.reset();
        match pending {
            ParseState::Escape => Some(Key::Escape),
            _ => None,
        }
    }

    fn reset(&mut self) {
        self.state = ParseState::Normal;
        self.params.clear();
        self.utf8.clear();
        self.utf8_len = 0;
    }

    fn handle_normal(&mut self, byte: u8) -> Option<Key> {
        match byte {
            0x1b => {
                self.state = ParseState::Escape;
                None
            }
            0x07 => Some(Key::Bell),
            0x08 | 0x7f => Some(Key::Backspace),
            0x09 => Some(Key::Tab),
            0x0a | 0x0d => Some(Key::Enter),
            0x01..=0x1a => Some(Key::Ctrl((b'a' + byte - 1) as char)),
            0x20..=0x7e => Some(Key::Char(byte as char)),
            0xc2..=0xf4 => {
                self.state = ParseState::Utf8;
                self.utf8.push(byte);
                self.utf8_len = match byte {
                    0xc2..=0xdf => 2,
                    0xe0..=0xef => 3,
                    _ => 4,
                };
                None
            }
            _ => Some(Key::Unknown(byte)),
        }
    }

    fn handle_utf8(&mut self, byte: u8) -> Option<Key> {
        if byte & 0xc0 != 0x80 {
            self.reset();
            return self.handle_normal(byte);
        }
        self.utf8.push(byte);
        if self.utf8.len() < self.utf8_len {
            return None;
        }
        let key = std::str::from_utf8(&self.utf8)
            .ok()
            .and_then(|s| s.chars().next())
            .map(Key::Char)
            .unwrap_or(Key::Unknown(byte));
        self.reset();
        Some(key)
    }

    fn handle_escape(&mut self, byte: u8) -> Option<Key> {
        match byte {
            b'[' => {
                self.state = ParseState::Csi;
                self.params.clear();
                None
            }
            b'O' => {
                self.state = ParseState::Ss3;
                None
            }
            _ => {
                self.reset();
                Some(Key::Unknown(byte))
            }
        }
    }

    fn handle_ss3(&mut self, byte: u8) -> Option<Key> {
        self.reset();
        let key = match byte {
            b'A' => Key::Up,
            b'B' => Key::Down,
            b'C' => Key::Right,
            b'D' => Key::Left,
            b'H' => Key::Home,
            b'F' => Key::End,
            b'P'..=b'S' => Key::F(byte - b'P' + 1),
            _ => Key::Unknown(byte),
        };
        Some(key)
    }

    fn handle_csi(&mut self, byte: u8) -> Option<Key> {
        if matches!(byte, b'0'..=b'9' | b';') {
            self.params.push(byte);
            return None;
        }

        let alt = self.params.as_slice() == b"1;3";
        let key = match byte {
            b'A' if alt => Key::AltUp,
            b'B' if alt => Key::AltDown,
            b'A' => Key::Up,
            b'B' => Key::Down,
            b'C' => Key::Right,
            b'D' => Key::Left,
            b'H' => Key::Home,
            b'F' => Key::End,
            b'~' => match self.params.as_slice() {
                b"1" | b"7" => Key::Home,
                b"3" => Key::Delete,
                b"4" | b"8" => Key::End,
                b"5" => Key::PageUp,
                b"6" => Key::PageDown,
                b"15" => Key::F(5),
                b"17" => Key::F(6),
                b"18" => Key::F(7),
                b"19" => Key::F(8),
                b"20" => Key::F(9),
                b"21" => Key::F(10),
                b"23" => Key::F(11),
                b"24" => Key::F(12),
                _ => Key::Unknown(b'~'),
            },
            _ => Key::Unknown(byte),
        };
        self.reset();
        Some(key)
    }
}

/// Decode a complete byte string into keys
pub fn decode(bytes: &[u8]) -> Vec<Key> {
    let mut parser = EscapeParser::new();
    let mut keys: Vec<Key> = bytes.iter().filter_map(|&b| parser.feed(b)).collect();
    keys.extend(parser.flush());
    keys
}

/// Translate a crossterm key event
pub fn from_crossterm(ev: &KeyEvent) -> Option<Key> {
    if ev.kind == KeyEventKind::Release {
        return None;
    }
    let ctrl = ev.modifiers.contains(KeyModifiers::CONTROL);
    let alt = ev.modifiers.contains(KeyModifiers::ALT);

    let key = match ev.code {
        KeyCode::Char(c) if ctrl && c.is_ascii_alphabetic() => match c.to_ascii_lowercase() {
            'g' => Key::Bell,
            'h' => Key::Backspace,
            'i' => Key::Tab,
            'j' | 'm' => Key::Enter,
            c => Key::Ctrl(c),
        },
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Enter => Key::Enter,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Tab => Key::Tab,
        KeyCode::Esc => Key::Escape,
        KeyCode::Up if alt => Key::AltUp,
        KeyCode::Down if alt => Key::AltDown,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::Delete => Key::Delete,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,
        KeyCode::F(n) => Key::F(n),
        _ => return None,
    };
    Some(key)
}

/// Where the line editor gets its keys from
pub trait KeySource {
    /// Wait up to `timeout` for a key; `Ok(None)` when none arrived
    fn next_key(&mut self, timeout: Duration) -> Result<Option<Key>>;
}

/// Replays a fixed key sequence, then reports the input as closed
#[derive(Debug, Default)]
pub struct ScriptedKeys {
    keys: VecDeque<Key>,
}

impl ScriptedKeys {
    pub fn new(keys: impl IntoIterator<Item = Key>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::new(decode(bytes))
    }

    pub fn push(&mut self, key: Key) {
        self.keys.push_back(key);
    }

    pub fn remaining(&self) -> usize {
        self.keys.len()
    }
}

impl KeySource for ScriptedKeys {
    fn next_key(&mut self, _timeout: Duration) -> Result<Option<Key>> {
        match self.keys.pop_front() {
            Some(key) => Ok(Some(key)),
            None => bail!("key script exhausted"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_printable_chars() {
        let mut parser = EscapeParser::new();
        assert_eq!(parser.feed(b'a'), Some(Key::Char('a')));
        assert_eq!(parser.feed(b'Z'), Some(Key::Char('Z')));
        assert_eq!(parser.feed(b' '), Some(Key::Char(' ')));
    }

    #[test]
    fn test_control_chars() {
        let mut parser = EscapeParser::new();
        assert_eq!(parser.feed(0x0d), Some(Key::Enter));
        assert_eq!(parser.feed(0x7f), Some(Key::Backspace));
        assert_eq!(parser.feed(0x08), Some(Key::Backspace));
        assert_eq!(parser.feed(0x09), Some(Key::Tab));
        assert_eq!(parser.feed(0x07), Some(Key::Bell));
        assert_eq!(parser.feed(0x01), Some(Key::Ctrl('a')));
        assert_eq!(parser.feed(0x10), Some(Key::Ctrl('p')));
        assert_eq!(parser.feed(0x0e), Some(Key::Ctrl('n')));
    }

    #[test]
    fn test_arrow_keys() {
        assert_eq!(
            decode(b"\x1b[A\x1b[B\x1b[C\x1b[D"),
            vec![Key::Up, Key::Down, Key::Right, Key::Left]
        );
        assert_eq!(decode(b"\x1bOA\x1bOD"), vec![Key::Up, Key::Left]);
    }

    #[test]
    fn test_alt_arrows() {
        assert_eq!(decode(b"\x1b[1;3A\x1b[1;3B"), vec![Key::AltUp, Key::AltDown]);
    }

    #[test]
    fn test_function_keys() {
        assert_eq!(
            decode(b"\x1b[15~\x1b[17~\x1b[18~\x1b[19~\x1b[20~\x1b[21~"),
            (5..=10).map(Key::F).collect::<Vec<_>>()
        );
        assert_eq!(decode(b"\x1bOP"), vec![Key::F(1)]);
    }

    #[test]
    fn test_navigation() {
        assert_eq!(
            decode(b"\x1b[H\x1b[F\x1b[3~\x1b[5~\x1b[6~\x1b[1~\x1b[4~"),
            vec![
                Key::Home,
                Key::End,
                Key::Delete,
                Key::PageUp,
                Key::PageDown,
                Key::Home,
                Key::End
            ]
        );
    }

    #[test]
    fn test_utf8() {
        assert_eq!(
            decode("日é".as_bytes()),
            vec![Key::Char('日'), Key::Char('é')]
        );
        // a truncated sequence is dropped, the next byte still counts
        assert_eq!(decode(b"\xc3x"), vec![Key::Char('x')]);
    }

    #[test]
    fn test_bare_escape() {
        let mut parser = EscapeParser::new();
        assert_eq!(parser.feed(0x1b), None);
        assert_eq!(parser.flush(), Some(Key::Escape));
        assert_eq!(parser.flush(), None);
    }

    #[test]
    fn test_crossterm_mapping() {
        let ev = KeyEvent::new(KeyCode::Char('p'), KeyModifiers::CONTROL);
        assert_eq!(from_crossterm(&ev), Some(Key::Ctrl('p')));
        let ev = KeyEvent::new(KeyCode::Char('h'), KeyModifiers::CONTROL);
        assert_eq!(from_crossterm(&ev), Some(Key::Backspace));
        let ev = KeyEvent::new(KeyCode::Up, KeyModifiers::ALT);
        assert_eq!(from_crossterm(&ev), Some(Key::AltUp));
        let ev = KeyEvent::new(KeyCode::F(7), KeyModifiers::NONE);
        assert_eq!(from_crossterm(&ev), Some(Key::F(7)));
    }

    #[test]
    fn test_scripted_bytes_match_live_events() {
        let none = KeyModifiers::NONE;
        let cases: &[(&[u8], KeyEvent)] = &[
            (b"\r", KeyEvent::new(KeyCode::Enter, none)),
            (b"\t", KeyEvent::new(KeyCode::Tab, none)),
            (b"\x7f", KeyEvent::new(KeyCode::Backspace, none)),
            (b"\x07", KeyEvent::new(KeyCode::Char('g'), KeyModifiers::CONTROL)),
            (b"\x10", KeyEvent::new(KeyCode::Char('p'), KeyModifiers::CONTROL)),
            (b"\x1b[A", KeyEvent::new(KeyCode::Up, none)),
            (b"\x1b[1;3A", KeyEvent::new(KeyCode::Up, KeyModifiers::ALT)),
            (b"\x1b[3~", KeyEvent::new(KeyCode::Delete, none)),
            (b"\x1b[5~", KeyEvent::new(KeyCode::PageUp, none)),
            (b"\x1b[H", KeyEvent::new(KeyCode::Home, none)),
            ("日".as_bytes(), KeyEvent::new(KeyCode::Char('日'), none)),
        ];
        for (bytes, ev) in cases {
            let live: Vec<Key> = from_crossterm(ev).into_iter().collect();
            assert_eq!(decode(bytes), live, "bytes {bytes:?}");
        }
    }

    #[test]
    fn test_scripted_keys_exhaust() {
        let mut keys = ScriptedKeys::from_bytes(b"ab");
        let t = Duration::from_millis(1);
        assert_eq!(keys.next_key(t).unwrap(), Some(Key::Char('a')));
        assert_eq!(keys.next_key(t).unwrap(), Some(Key::Char('b')));
        assert!(keys.next_key(t).is_err());
    }
}

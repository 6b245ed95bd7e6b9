//! Terminal plumbing
//!
//! Control sequences as strings, the raw-mode guard, the crossterm key
//! source and the resize flag shared between the signal watcher and the
//! line editor.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::cursor;
use crossterm::event::{self, Event};
use crossterm::terminal::{self as ct, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::Command;
use tracing::debug;

use crate::keys::{self, Key, KeySource};
use crate::paint::output_lock;
use crate::session::FrameSink;

/// Fallback geometry when the size cannot be queried
pub const DEFAULT_SIZE: (u16, u16) = (24, 80);

/// Audible bell
pub const BEL: &str = "\x07";

/// Set when the terminal changed size; drained by the line editor
#[derive(Debug, Clone, Default)]
pub struct ResizeFlag(Arc<AtomicBool>);

impl ResizeFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Clear the flag, returning whether it was set
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::Relaxed)
    }
}

/// Render one crossterm command as its escape sequence
fn ansi(cmd: impl Command) -> String {
    let mut buf = String::new();
    let _ = cmd.write_ansi(&mut buf);
    buf
}

/// Move cursor to absolute position (0-indexed)
pub fn move_to(row: u16, col: u16) -> String {
    ansi(cursor::MoveTo(col, row))
}

pub fn clear_screen() -> String {
    ansi(Clear(ClearType::All))
}

pub fn hide_cursor() -> String {
    ansi(cursor::Hide)
}

pub fn show_cursor() -> String {
    ansi(cursor::Show)
}

/// Terminal size as (rows, cols)
pub fn size() -> (u16, u16) {
    match ct::size() {
        Ok((cols, rows)) => (rows, cols),
        Err(e) => {
            debug!(error = %e, "cannot query terminal size");
            DEFAULT_SIZE
        }
    }
}

/// Write a composed frame under the output lock
pub fn write_frame<W: Write>(out: &mut W, frame: &str) -> io::Result<()> {
    let _guard = output_lock();
    out.write_all(frame.as_bytes())?;
    out.flush()
}

pub fn beep<W: Write>(out: &mut W) {
    let _guard = output_lock();
    let _ = out.write_all(BEL.as_bytes());
    let _ = out.flush();
}

/// Frames to the real terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl FrameSink for StdoutSink {
    fn flush(&self, frame: &str) {
        if let Err(e) = write_frame(&mut io::stdout(), frame) {
            debug!(error = %e, "frame write failed");
        }
    }

    fn beep(&self) {
        beep(&mut io::stdout());
    }
}

/// Raw mode plus the alternate screen, restored on drop
pub struct RawTerminal {
    active: bool,
}

impl RawTerminal {
    pub fn enter() -> Result<Self> {
        ct::enable_raw_mode().context("failed to enable raw mode")?;
        let mut stdout = io::stdout();
        crossterm::execute!(stdout, EnterAlternateScreen, cursor::Hide)
            .context("failed to enter alternate screen")?;
        Ok(Self { active: true })
    }

    pub fn leave(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        let mut stdout = io::stdout();
        crossterm::execute!(stdout, cursor::Show, LeaveAlternateScreen)
            .context("failed to leave alternate screen")?;
        ct::disable_raw_mode().context("failed to disable raw mode")
    }
}

impl Drop for RawTerminal {
    fn drop(&mut self) {
        let _ = self.leave();
    }
}

/// Keys from the real terminal. Resize events raise the flag instead of
/// producing a key.
pub struct CrosstermKeys {
    resize: ResizeFlag,
}

impl CrosstermKeys {
    pub fn new(resize: ResizeFlag) -> Self {
        Self { resize }
    }
}

impl KeySource for CrosstermKeys {
    fn next_key(&mut self, timeout: Duration) -> Result<Option<Key>> {
        if !event::poll(timeout).context("failed to poll terminal")? {
            return Ok(None);
        }
        match event::read().context("failed to read terminal event")? {
            Event::Key(ev) => Ok(keys::from_crossterm(&ev)),
            Event::Resize(cols, rows) => {
                debug!(rows, cols, "terminal resized");
                self.resize.raise();
                Ok(None)
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ctrl_sequences() {
        assert_eq!(move_to(0, 0), "\x1b[1;1H");
        assert!(!clear_screen().is_empty());
        assert!(!hide_cursor().is_empty());
    }

    #[test]
    fn test_resize_flag_drains() {
        let flag = ResizeFlag::new();
        let watcher = flag.clone();
        assert!(!flag.take());
        watcher.raise();
        assert!(flag.take());
        assert!(!flag.take());
    }

    #[test]
    fn test_write_frame() {
        let mut out = Vec::new();
        write_frame(&mut out, "abc").unwrap();
        beep(&mut out);
        assert_eq!(out, b"abc\x07");
    }
}

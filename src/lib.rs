//! ircterm - rendering and input core for a terminal IRC client
//!
//! This library paints IRC-formatted text into word-wrapped windows,
//! keeps their scrollback, edits the input line and logs chat to disk.
//! The main binary in `main.rs` wires it to a real terminal.

pub mod assemble;
pub mod colors;
pub mod commands;
pub mod config;
pub mod error;
pub mod keys;
pub mod log;
pub mod markup;
pub mod nicklist;
pub mod notify;
pub mod paint;
pub mod paths;
pub mod readline;
pub mod screen;
pub mod scrollback;
pub mod session;
pub mod surface;
pub mod terminal;
pub mod width;
pub mod window;

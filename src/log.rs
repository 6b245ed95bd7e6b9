//! Per-window chat logs
//!
//! One file per (server, window):
//!
//! ```text
//! <logdir>/<host without '-' and '.'>-<type>.<console|label>.txt
//! ```
//!
//! where type is 1 for the status window, 2 for channels and 3 for queries.
//! The file name is lowercase. Each line is `YYYY-MM-DD <plain text>`; the
//! file is opened for append per line and never held open.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};

use crate::markup::strip_markup;
use crate::window::{is_irc_channel, STATUS_LABEL};

const FILE_SUFFIX: &str = ".txt";
const MAX_LABEL_LEN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogType {
    Status = 1,
    Channel = 2,
    Query = 3,
}

pub fn log_type(label: &str) -> LogType {
    if label.eq_ignore_ascii_case(STATUS_LABEL) {
        LogType::Status
    } else if is_irc_channel(label) {
        LogType::Channel
    } else {
        LogType::Query
    }
}

/// Make a window label safe for a file name. Returns `None` when nothing
/// alphanumeric survives.
pub fn sanitize_label(label: &str) -> Option<String> {
    let cleaned: String = label
        .chars()
        .take(MAX_LABEL_LEN)
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '#' | '&' | '+' | '-' | '.' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    cleaned
        .chars()
        .any(|c| c.is_ascii_alphanumeric())
        .then_some(cleaned)
}

/// Log file for `label` on `server_host`, or `None` when the label
/// cannot be turned into a file name
pub fn log_path(log_dir: &Path, server_host: &str, label: &str) -> Option<PathBuf> {
    let host: String = server_host.chars().filter(|c| !matches!(c, '-' | '.')).collect();
    let kind = log_type(label);

    let name = match kind {
        LogType::Status => "console".to_string(),
        LogType::Channel | LogType::Query => sanitize_label(label)?,
    };

    let file = format!("{host}-{}.{name}{FILE_SUFFIX}", kind as u8).to_lowercase();
    Some(log_dir.join(file))
}

/// Append one line dated `date`, markup stripped
pub fn append_dated(path: &Path, text: &str, date: NaiveDate) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log {}", path.display()))?;

    writeln!(file, "{} {}", date.format("%Y-%m-%d"), strip_markup(text))
        .with_context(|| format!("failed to write log {}", path.display()))?;
    Ok(())
}

/// Append one line dated today
pub fn log_msg(path: &Path, text: &str) -> Result<()> {
    append_dated(path, text, Local::now().date_naive())
}

//! Message assembly
//!
//! Every printed line is `timestamp specifier message`. The indent stored
//! with the line is the visible width of everything before the message, so
//! wrapped rows line up under the start of the text.

use std::fmt::Write as _;
use std::sync::Once;

use chrono::{DateTime, TimeZone};
use tracing::warn;

use crate::config::Config;
use crate::markup;

static BAD_TIME_FORMAT: Once = Once::new();

/// Which glyphs precede a message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Specifier {
    #[default]
    None,
    Spec1,
    Spec2,
    Spec3,
    Spec1Spec2,
    Spec1Failure,
    Spec1Success,
    Spec1Warn,
}

impl Specifier {
    /// Theme keys for the glyphs, in order
    fn theme_keys(self) -> &'static [&'static str] {
        match self {
            Specifier::None => &[],
            Specifier::Spec1 => &["specifier1"],
            Specifier::Spec2 => &["specifier2"],
            Specifier::Spec3 => &["specifier3"],
            Specifier::Spec1Spec2 => &["specifier1", "specifier2"],
            Specifier::Spec1Failure => &["specifier1", "gfx_failure"],
            Specifier::Spec1Success => &["specifier1", "gfx_success"],
            Specifier::Spec1Warn => &["specifier1", "gfx_warning"],
        }
    }
}

/// An assembled line ready for the scrollback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembled {
    pub text: String,
    pub indent: usize,
}

/// Build the stored form of a message.
///
/// `server_ts`, when present, replaces the locally formatted timestamp.
pub fn assemble<Tz>(
    config: &Config,
    msg: &str,
    spec: Specifier,
    include_ts: bool,
    server_ts: Option<&str>,
    now: &DateTime<Tz>,
) -> Assembled
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut prefix = String::new();

    if include_ts {
        match server_ts {
            Some(ts) => prefix.push_str(ts),
            None => prefix.push_str(&format_time(&config.theme("time_format"), now)),
        }
        prefix.push(' ');
    }

    for key in spec.theme_keys() {
        prefix.push_str(&config.theme(key));
        prefix.push(' ');
    }

    let indent = markup::visible_width(&prefix);
    prefix.push_str(msg);

    Assembled {
        text: prefix,
        indent,
    }
}

/// `strftime` with a fallback for malformed formats
pub fn format_time<Tz>(fmt: &str, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut out = String::new();
    if write!(out, "{}", now.format(fmt)).is_err() {
        BAD_TIME_FORMAT.call_once(|| warn!(format = fmt, "invalid time_format, using %H:%M"));
        out.clear();
        let _ = write!(out, "{}", now.format("%H:%M"));
    }
    out
}

/// Decorated clock for server-provided times: `B1 HH SEP MM SEP SS B2`
pub fn set_timestamp(config: &Config, hour: u32, minute: u32, second: u32) -> String {
    let b1 = config.theme("statusbar_leftBracket");
    let b2 = config.theme("statusbar_rightBracket");
    let sep = config.theme("notice_sep");
    format!("{b1}{hour:02}{sep}{minute:02}{sep}{second:02}{b2}")
}

//! Client configuration
//!
//! The file has three sections. `[general]` and `[theme]` are opaque key
//! tables read through typed accessors that know each key's default and
//! limits; `[log]` is a fixed struct.
//!
//! ```toml
//! [general]
//! textbuffer_size_absolute = 1000
//! nickname = "ferris"
//!
//! [theme]
//! term_background = 1
//! time_format = "[%H:%M]"
//!
//! [log]
//! enabled = true
//! ```

use std::path::{Path, PathBuf};
use std::sync::Once;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;

use crate::colors;

/// An integer key with its accepted range and fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegerSetting {
    pub key: &'static str,
    pub lo: i64,
    pub hi: i64,
    pub default: i64,
}

pub const TEXTBUFFER_SIZE_ABSOLUTE: IntegerSetting = IntegerSetting {
    key: "textbuffer_size_absolute",
    lo: 350,
    hi: 4700,
    default: 1000,
};

pub const MAX_CHAT_WINDOWS: IntegerSetting = IntegerSetting {
    key: "max_chat_windows",
    lo: 10,
    hi: 200,
    default: 60,
};

pub const TERM_BACKGROUND: IntegerSetting = IntegerSetting {
    key: "term_background",
    lo: 0,
    hi: 15,
    default: 1,
};

/// Built-in theme strings
const THEME_DEFAULTS: &[(&str, &str)] = &[
    ("gfx_failure", "[\x034*\x0f]"),
    ("gfx_success", "[\x039*\x0f]"),
    ("gfx_warning", "[\x038*\x0f]"),
    ("color4", "\x0305"),
    ("left_bracket", "\x0314[\x0f"),
    ("nick_s1", "\x0314:\x0f"),
    ("nick_s2", "\x0314:\x0f"),
    ("notice_sep", "\x0314:\x0f"),
    ("primary_color", "\x0312"),
    ("right_bracket", "\x0314]\x0f"),
    ("secondary_color", "\x0300"),
    ("slogan", "\x033,1The universal IRC client\x0f"),
    ("specifier1", "\x0314[\x030-\x0314]\x0f"),
    ("specifier2", "\x0314[\x030:\x0314]\x0f"),
    ("specifier3", "\x0314[\x030x\x0314]\x0f"),
    ("statusbar_bg", "black"),
    ("statusbar_fg", "white"),
    ("statusbar_leftBracket", "\x0312,1[\x0f"),
    ("statusbar_rightBracket", "\x0312,1]\x0f"),
    ("statusbar_spec", "[-]"),
    ("time_format", "\x0314[\x0f%H:%M\x0314]\x0f"),
    ("titlebar_bg", "white"),
    ("titlebar_fg", "black"),
];

/// Keys of `[general]` that the client reads
const GENERAL_KEYS: &[&str] = &[
    "disable_beeps",
    "max_chat_windows",
    "nickname",
    "nickname_aliases",
    "show_timestamps",
    "textbuffer_size_absolute",
];

/// Theme keys read through typed accessors rather than [`THEME_DEFAULTS`]
const THEME_FLAGS: &[&str] = &["term_background", "term_enable_colors", "term_use_default_colors"];

static MISSING_THEME_KEY: Once = Once::new();

/// Every known setting name, sorted
pub fn setting_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = GENERAL_KEYS
        .iter()
        .chain(THEME_FLAGS)
        .copied()
        .chain(THEME_DEFAULTS.iter().map(|(k, _)| *k))
        .collect();
    names.sort_unstable();
    names
}

/// `[log]` section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Overrides the XDG log directory
    pub dir: Option<PathBuf>,
    /// Whether new windows start with logging on
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    general: toml::Table,
    theme: toml::Table,
    pub log: LogConfig,
}

impl Config {
    /// Load config from a TOML file. A missing file yields defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!("config not found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        Self::parse(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Bounded integer from `[general]`
    pub fn integer(&self, setting: &IntegerSetting) -> i64 {
        bounded(&self.general, setting)
    }

    /// Bounded integer from `[theme]`
    pub fn theme_integer(&self, setting: &IntegerSetting) -> i64 {
        bounded(&self.theme, setting)
    }

    pub fn general_bool(&self, key: &str, default: bool) -> bool {
        lookup_bool(&self.general, key, default)
    }

    pub fn theme_bool(&self, key: &str, default: bool) -> bool {
        lookup_bool(&self.theme, key, default)
    }

    pub fn general_string(&self, key: &str) -> Option<&str> {
        self.general.get(key).and_then(|v| v.as_str())
    }

    /// Theme string: the user value, else the built-in default. Unknown
    /// keys yield an empty string.
    pub fn theme(&self, key: &str) -> String {
        if let Some(s) = self.theme.get(key).and_then(|v| v.as_str()) {
            return s.to_string();
        }
        match THEME_DEFAULTS.iter().find(|(k, _)| *k == key) {
            Some((_, v)) => v.to_string(),
            None => {
                MISSING_THEME_KEY.call_once(|| warn!(key, "unknown theme item"));
                String::new()
            }
        }
    }

    /// Theme color given by name ("black" .. "white")
    pub fn theme_color(&self, key: &str, fallback: i16) -> i16 {
        let name = self.theme(key);
        match color_by_name(&name) {
            Some(c) => c,
            None => {
                warn!(key, value = %name, "not a color name, falling back to the default");
                fallback
            }
        }
    }

    /// Our own nickname for highlight detection
    pub fn nickname(&self) -> Option<&str> {
        self.general_string("nickname").filter(|s| !s.is_empty())
    }

    /// Alternate nicks that also trigger highlights
    pub fn nickname_aliases(&self) -> Vec<String> {
        self.general_string("nickname_aliases")
            .map(|s| s.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Current value of a setting as the user would write it, `None` for
    /// unknown or unset keys without a built-in default
    pub fn lookup(&self, key: &str) -> Option<String> {
        let explicit = self.general.get(key).or_else(|| self.theme.get(key));
        if let Some(value) = explicit {
            return Some(match value.as_str() {
                Some(s) => s.to_string(),
                None => value.to_string(),
            });
        }
        if let Some((_, v)) = THEME_DEFAULTS.iter().find(|(k, _)| *k == key) {
            return Some(v.to_string());
        }
        [TEXTBUFFER_SIZE_ABSOLUTE, MAX_CHAT_WINDOWS, TERM_BACKGROUND]
            .iter()
            .find(|s| s.key == key)
            .map(|s| s.default.to_string())
    }

    pub fn set_general(&mut self, key: &str, value: toml::Value) {
        self.general.insert(key.to_string(), value);
    }

    pub fn set_theme(&mut self, key: &str, value: toml::Value) {
        self.theme.insert(key.to_string(), value);
    }
}

fn bounded(table: &toml::Table, setting: &IntegerSetting) -> i64 {
    let Some(value) = table.get(setting.key) else {
        return setting.default;
    };
    match value.as_integer() {
        Some(n) if (setting.lo..=setting.hi).contains(&n) => n,
        _ => {
            warn!(
                key = setting.key,
                value = %value,
                lo = setting.lo,
                hi = setting.hi,
                "setting out of range, falling back to the default"
            );
            setting.default
        }
    }
}

fn lookup_bool(table: &toml::Table, key: &str, default: bool) -> bool {
    match table.get(key) {
        None => default,
        Some(toml::Value::Boolean(b)) => *b,
        Some(toml::Value::String(s)) => match s.to_ascii_lowercase().as_str() {
            "yes" | "true" | "on" => true,
            "no" | "false" | "off" => false,
            _ => {
                warn!(key, value = %s, "not a boolean, falling back to the default");
                default
            }
        },
        Some(other) => {
            warn!(key, value = %other, "not a boolean, falling back to the default");
            default
        }
    }
}

fn color_by_name(name: &str) -> Option<i16> {
    let c = match name.to_ascii_lowercase().as_str() {
        "black" => colors::BLACK,
        "red" => colors::RED,
        "green" => colors::GREEN,
        "yellow" => colors::YELLOW,
        "blue" => colors::BLUE,
        "magenta" => colors::MAGENTA,
        "cyan" => colors::CYAN,
        "white" => colors::WHITE,
        _ => return None,
    };
    Some(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_empty() {
        let config = Config::default();
        assert_eq!(config.integer(&TEXTBUFFER_SIZE_ABSOLUTE), 1000);
        assert_eq!(config.integer(&MAX_CHAT_WINDOWS), 60);
        assert_eq!(config.theme_integer(&TERM_BACKGROUND), 1);
        assert!(config.theme_bool("term_use_default_colors", true));
        assert!(!config.general_bool("disable_beeps", false));
        assert!(config.nickname().is_none());
    }

    #[test]
    fn test_parse_sections() {
        let config = Config::parse(
            r#"
            [general]
            textbuffer_size_absolute = 2000
            disable_beeps = "yes"
            nickname = "ferris"
            nickname_aliases = "crab  rustacean"

            [theme]
            time_format = "%H:%M"
            term_enable_colors = false

            [log]
            enabled = true
            "#,
        )
        .unwrap();

        assert_eq!(config.integer(&TEXTBUFFER_SIZE_ABSOLUTE), 2000);
        assert!(config.general_bool("disable_beeps", false));
        assert_eq!(config.nickname(), Some("ferris"));
        assert_eq!(config.nickname_aliases(), vec!["crab", "rustacean"]);
        assert_eq!(config.theme("time_format"), "%H:%M");
        assert!(!config.theme_bool("term_enable_colors", true));
        assert!(config.log.enabled);
    }

    #[test]
    fn test_out_of_range_falls_back() {
        let config = Config::parse("[general]\ntextbuffer_size_absolute = 5\nmax_chat_windows = \"many\"\n").unwrap();
        assert_eq!(config.integer(&TEXTBUFFER_SIZE_ABSOLUTE), 1000);
        assert_eq!(config.integer(&MAX_CHAT_WINDOWS), 60);
    }

    #[test]
    fn test_limits_are_inclusive() {
        let config = Config::parse("[general]\ntextbuffer_size_absolute = 4700\nmax_chat_windows = 10\n").unwrap();
        assert_eq!(config.integer(&TEXTBUFFER_SIZE_ABSOLUTE), 4700);
        assert_eq!(config.integer(&MAX_CHAT_WINDOWS), 10);
    }

    #[test]
    fn test_theme_defaults_and_unknown() {
        let config = Config::default();
        assert_eq!(config.theme("specifier1"), "\x0314[\x030-\x0314]\x0f");
        assert_eq!(config.theme("no_such_item"), "");
    }

    #[test]
    fn test_theme_colors() {
        let mut config = Config::default();
        assert_eq!(config.theme_color("titlebar_fg", colors::WHITE), colors::BLACK);
        assert_eq!(config.theme_color("titlebar_bg", colors::BLACK), colors::WHITE);

        config.set_theme("statusbar_bg", toml::Value::String("Blue".into()));
        assert_eq!(config.theme_color("statusbar_bg", colors::BLACK), colors::BLUE);

        config.set_theme("statusbar_bg", toml::Value::String("mauve".into()));
        assert_eq!(config.theme_color("statusbar_bg", colors::BLACK), colors::BLACK);
    }

    #[test]
    fn test_setting_names_and_lookup() {
        let names = setting_names();
        assert!(names.contains(&"time_format"));
        assert!(names.contains(&"disable_beeps"));
        assert!(names.windows(2).all(|w| w[0] <= w[1]));

        let config = Config::parse("[general]\nmax_chat_windows = 20\nnickname = \"ferris\"\n").unwrap();
        assert_eq!(config.lookup("max_chat_windows").as_deref(), Some("20"));
        assert_eq!(config.lookup("nickname").as_deref(), Some("ferris"));
        assert_eq!(config.lookup("textbuffer_size_absolute").as_deref(), Some("1000"));
        assert!(config.lookup("slogan").is_some());
        assert_eq!(config.lookup("bogus"), None);
    }

    #[test]
    fn test_load_missing_file() {
        let config = Config::load("/nonexistent/ircterm.toml").unwrap();
        assert_eq!(config.integer(&MAX_CHAT_WINDOWS), 60);
    }
}

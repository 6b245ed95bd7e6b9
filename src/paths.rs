//! Where ircterm keeps its files
//!
//! ```text
//! $XDG_CONFIG_HOME/ircterm/config.toml     IRCTERM_CONFIG overrides
//! $XDG_DATA_HOME/ircterm/log/              IRCTERM_LOG_DIR overrides
//!     ircterm.log                          tracing output
//!     <host>-<type>.<label>.txt            chat logs
//! ```
//!
//! Without the XDG variables the usual `~/.config` and `~/.local/share`
//! are used; without `HOME` everything lands in the working directory.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::debug;

const APP: &str = "ircterm";

/// `$xdg_var/ircterm`, else `$HOME/home_rel/ircterm`, else `.`
fn xdg_dir(xdg_var: &str, home_rel: &str) -> PathBuf {
    if let Some(base) = std::env::var_os(xdg_var).filter(|v| !v.is_empty()) {
        return PathBuf::from(base).join(APP);
    }
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(home_rel).join(APP),
        None => PathBuf::from("."),
    }
}

/// An explicit path from `var`, else `default()`
fn overridden(var: &str, default: impl FnOnce() -> PathBuf) -> PathBuf {
    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(default)
}

pub fn data_dir() -> PathBuf {
    xdg_dir("XDG_DATA_HOME", ".local/share")
}

pub fn config_dir() -> PathBuf {
    xdg_dir("XDG_CONFIG_HOME", ".config")
}

pub fn config_path() -> PathBuf {
    overridden("IRCTERM_CONFIG", || config_dir().join("config.toml"))
}

/// Chat logs and the trace log
pub fn log_dir() -> PathBuf {
    overridden("IRCTERM_LOG_DIR", || data_dir().join("log"))
}

/// Where the binary sends its tracing output while the terminal is raw
pub fn trace_log_path() -> PathBuf {
    log_dir().join("ircterm.log")
}

/// Create the log directory when missing
pub fn ensure_dirs() -> Result<()> {
    let dir = log_dir();
    if dir.is_dir() {
        return Ok(());
    }
    debug!(dir = %dir.display(), "creating log directory");
    std::fs::create_dir_all(&dir).with_context(|| format!("failed to create {}", dir.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // env vars are process-wide
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "IRCTERM_CONFIG",
        "IRCTERM_LOG_DIR",
        "XDG_DATA_HOME",
        "XDG_CONFIG_HOME",
    ];

    fn with_env(vars: &[(&str, &str)], f: impl FnOnce()) {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|p| p.into_inner());
        let home = env::var_os("HOME");
        for v in VARS {
            env::remove_var(v);
        }
        for (k, v) in vars {
            env::set_var(k, v);
        }
        f();
        for (k, _) in vars {
            env::remove_var(k);
        }
        if let Some(home) = home {
            env::set_var("HOME", home);
        }
    }

    #[test]
    fn test_explicit_overrides_win() {
        with_env(
            &[
                ("IRCTERM_CONFIG", "/etc/irc.toml"),
                ("IRCTERM_LOG_DIR", "/var/log/irc"),
                ("XDG_DATA_HOME", "/xdg/data"),
            ],
            || {
                assert_eq!(config_path(), PathBuf::from("/etc/irc.toml"));
                assert_eq!(log_dir(), PathBuf::from("/var/log/irc"));
                assert_eq!(trace_log_path(), PathBuf::from("/var/log/irc/ircterm.log"));
            },
        );
    }

    #[test]
    fn test_xdg_bases() {
        with_env(&[("XDG_DATA_HOME", "/xdg/data"), ("XDG_CONFIG_HOME", "/xdg/config")], || {
            assert_eq!(log_dir(), PathBuf::from("/xdg/data/ircterm/log"));
            assert_eq!(config_path(), PathBuf::from("/xdg/config/ircterm/config.toml"));
        });
    }

    #[test]
    fn test_home_fallback() {
        with_env(&[("HOME", "/home/ferris")], || {
            assert_eq!(data_dir(), PathBuf::from("/home/ferris/.local/share/ircterm"));
            assert_eq!(config_dir(), PathBuf::from("/home/ferris/.config/ircterm"));
        });
    }

    #[test]
    fn test_empty_override_is_ignored() {
        with_env(&[("IRCTERM_LOG_DIR", ""), ("XDG_DATA_HOME", "/d")], || {
            assert_eq!(log_dir(), PathBuf::from("/d/ircterm/log"));
        });
    }

    #[test]
    fn test_ensure_dirs_creates_log_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested/logs");
        with_env(&[("IRCTERM_LOG_DIR", dir.to_str().unwrap())], || {
            ensure_dirs().unwrap();
            assert!(dir.is_dir());
            ensure_dirs().unwrap();
        });
    }
}

//! Desktop notification boundary
//!
//! The core never talks to a notification daemon. It hands plain text,
//! already capped at [`MAX_NOTIFICATION_CHARS`], to a [`Notifier`]; the
//! binary decides what that means.

use tracing::info;

use crate::markup::strip_markup;

pub const MAX_NOTIFICATION_CHARS: usize = 150;

pub trait Notifier: Send + Sync {
    fn send(&self, text: &str);
}

/// Drops every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn send(&self, _text: &str) {}
}

/// Records notifications in the trace log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn send(&self, text: &str) {
        info!(target: "ircterm::notify", "{text}");
    }
}

/// Strip markup and cap the length
pub fn prepare(text: &str) -> String {
    strip_markup(text)
        .chars()
        .take(MAX_NOTIFICATION_CHARS)
        .collect()
}

/// Deliver through `notifier` after [`prepare`]
pub fn notify(notifier: &dyn Notifier, text: &str) {
    notifier.send(&prepare(text));
}

/// True when `msg` addresses `nick`: `nick:`, `nick,`, `nick ` at the
/// start, or the whole message, compared case-insensitively
pub fn addresses(msg: &str, nick: &str) -> bool {
    if nick.is_empty() || msg.len() < nick.len() {
        return false;
    }
    let Some(head) = msg.get(..nick.len()) else {
        return false;
    };
    if !head.eq_ignore_ascii_case(nick) {
        return false;
    }
    match msg[nick.len()..].chars().next() {
        None => true,
        Some(c) => matches!(c, ':' | ',' | ' '),
    }
}

/// Highlight check against our nick and its aliases
pub fn should_highlight(msg: &str, nick: &str, aliases: &[String]) -> bool {
    addresses(msg, nick) || aliases.iter().any(|a| addresses(msg, a))
}

/// Payload for a private message
pub fn private_message(nick: &str, msg: &str) -> String {
    format!("[PM] <{nick}> {msg}")
}

/// Payload for a channel highlight
pub fn highlight(nick: &str, dest: &str, msg: &str) -> String {
    format!("{nick} @ {dest}: {msg}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl Notifier for Recorder {
        fn send(&self, text: &str) {
            self.0.lock().unwrap().push(text.to_string());
        }
    }

    #[test]
    fn test_prepare_truncates_and_strips() {
        let long = format!("\x02{}\x02", "a".repeat(400));
        let out = prepare(&long);
        assert_eq!(out.chars().count(), MAX_NOTIFICATION_CHARS);
        assert!(out.chars().all(|c| c == 'a'));
    }

    #[test]
    fn test_truncation_counts_chars_not_bytes() {
        let out = prepare(&"ä".repeat(200));
        assert_eq!(out.chars().count(), MAX_NOTIFICATION_CHARS);
    }

    #[test]
    fn test_notify_goes_through_trait() {
        let rec = Recorder::default();
        notify(&rec, &private_message("bob", "\x034hi\x0f there"));
        assert_eq!(rec.0.lock().unwrap().as_slice(), ["[PM] <bob> hi there"]);
        NullNotifier.send("ignored");
    }

    #[test]
    fn test_addresses() {
        assert!(addresses("ferris: hello", "ferris"));
        assert!(addresses("Ferris, hello", "ferris"));
        assert!(addresses("FERRIS hello", "ferris"));
        assert!(addresses("ferris", "FeRRis"));
        assert!(!addresses("ferrisbot: hi", "ferris"));
        assert!(!addresses("hi ferris", "ferris"));
        assert!(!addresses("ferris", ""));
        assert!(!addresses("fé", "fe"));
    }

    #[test]
    fn test_aliases() {
        let aliases = vec!["crab".to_string()];
        assert!(should_highlight("crab: ping", "ferris", &aliases));
        assert!(!should_highlight("lobster: ping", "ferris", &aliases));
    }

    #[test]
    fn test_highlight_payload() {
        assert_eq!(highlight("bob", "#rust", "ferris: hi"), "bob @ #rust: ferris: hi");
    }
}

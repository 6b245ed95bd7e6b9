//! The terminal session: shared state behind two locks
//!
//! `print_lock` makes message assembly, storage and logging atomic per
//! message; `screen` guards the windows, the bars and the palette. Locks
//! are always taken in the order print → screen → output, and nothing is
//! held while waiting for a key.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, Once};

use chrono::Local;
use tracing::{debug, warn};

use crate::assemble::{assemble, Specifier};
use crate::colors::Palette;
use crate::config::{self, Config};
use crate::error::WindowError;
use crate::log::{log_msg, log_path};
use crate::markup::{strip_markup, BOLD, NORMAL};
use crate::nicklist::Privilege;
use crate::notify::{self, Notifier, NullNotifier};
use crate::readline::completion::{filter_prefix, matching_commands};
use crate::readline::{CompletionKind, Host, ScrollKey};
use crate::screen::Screen;
use crate::surface::Surface;
use crate::window::{is_irc_channel, prompt_for, ScrollState, Window, STATUS_LABEL};

static LOG_WRITE_FAILED: Once = Once::new();

/// Where finished frames go
pub trait FrameSink: Send + Sync {
    fn flush(&self, frame: &str);
    fn beep(&self);
}

/// Discards frames; for tests and headless use
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl FrameSink for NullSink {
    fn flush(&self, _frame: &str) {}
    fn beep(&self) {}
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct Session {
    print_lock: Mutex<()>,
    screen: Mutex<Screen>,
    config: Config,
    log_dir: PathBuf,
    server_host: String,
    show_timestamps: bool,
    colors: bool,
    notifier: Box<dyn Notifier>,
    sink: Box<dyn FrameSink>,
}

impl Session {
    pub fn new(config: Config, palette: Palette, server_host: &str, rows: u16, cols: u16) -> Self {
        let colors = palette.is_enabled();
        let screen = Screen::new(&config, palette, server_host, rows, cols);
        let log_dir = config.log.dir.clone().unwrap_or_else(crate::paths::log_dir);
        Self {
            print_lock: Mutex::new(()),
            screen: Mutex::new(screen),
            show_timestamps: config.general_bool("show_timestamps", true),
            config,
            log_dir,
            server_host: server_host.to_string(),
            colors,
            notifier: Box::new(NullNotifier),
            sink: Box::new(NullSink),
        }
    }

    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = dir.into();
        self
    }

    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    pub fn with_sink(mut self, sink: impl FrameSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Run `f` with the screen locked. Do not print from inside `f`.
    pub fn with_screen<R>(&self, f: impl FnOnce(&mut Screen) -> R) -> R {
        f(&mut lock(&self.screen))
    }

    /// Compose the current frame and hand it to the sink
    pub fn refresh(&self) {
        let frame = lock(&self.screen).render();
        self.sink.flush(&frame);
    }

    pub fn beep(&self) {
        self.sink.beep();
    }

    /// Print into window `label`, with a timestamp when enabled
    pub fn print(&self, label: &str, msg: &str, spec: Specifier) -> Result<(), WindowError> {
        self.printtext(label, msg, spec, self.show_timestamps)
    }

    pub fn print_active(&self, msg: &str, spec: Specifier) {
        let label = self.with_screen(|s| s.registry.active().label.clone());
        if let Err(e) = self.print(&label, msg, spec) {
            debug!(error = %e, "active window vanished while printing");
        }
    }

    pub fn print_status(&self, msg: &str, spec: Specifier) {
        if let Err(e) = self.print(STATUS_LABEL, msg, spec) {
            debug!(error = %e, "status window missing");
        }
    }

    /// Assemble, store, paint and log one message, then refresh the frame
    pub fn printtext(
        &self,
        label: &str,
        msg: &str,
        spec: Specifier,
        include_ts: bool,
    ) -> Result<(), WindowError> {
        {
            let _print = lock(&self.print_lock);
            self.print_locked(label, msg, spec, include_ts)?;
        }
        self.refresh();
        Ok(())
    }

    fn print_locked(
        &self,
        label: &str,
        msg: &str,
        spec: Specifier,
        include_ts: bool,
    ) -> Result<(), WindowError> {
        let assembled = assemble(&self.config, msg, spec, include_ts, None, &Local::now());
        let text = if self.colors {
            assembled.text
        } else {
            strip_markup(&assembled.text)
        };

        let (label, logging) = {
            let mut guard = lock(&self.screen);
            let screen = &mut *guard;
            let window = screen
                .registry
                .get_mut(label)
                .ok_or_else(|| WindowError::NotFound(label.to_string()))?;
            window.append(&mut screen.palette, &text, assembled.indent);
            (window.label.clone(), window.logging)
        };

        if logging {
            match log_path(&self.log_dir, &self.server_host, &label) {
                Some(path) => {
                    if let Err(e) = log_msg(&path, &text) {
                        LOG_WRITE_FAILED.call_once(|| warn!(error = %e, "cannot write chat log"));
                    }
                }
                None => {
                    let notice = format!("Inappropriate filename for the log of window {BOLD}{label}{BOLD}");
                    self.print_locked(STATUS_LABEL, &notice, Specifier::Spec1Failure, include_ts)?;
                }
            }
        }
        Ok(())
    }

    /// Open a window (or reuse one) and make it active
    pub fn spawn(&self, label: &str, title: Option<&str>) -> Result<(), WindowError> {
        self.with_screen(|s| {
            s.registry.spawn(label, title)?;
            s.registry.change_by_label(label)?;
            s.draw_bars();
            Ok::<_, WindowError>(())
        })?;
        self.refresh();
        Ok(())
    }

    pub fn destroy(&self, label: &str) -> Result<(), WindowError> {
        self.with_screen(|s| {
            s.registry.destroy(label)?;
            s.draw_bars();
            Ok::<_, WindowError>(())
        })?;
        self.refresh();
        Ok(())
    }

    pub fn change_window(&self, refnum: usize) -> Result<(), WindowError> {
        self.with_screen(|s| {
            s.registry.change_by_refnum(refnum)?;
            s.draw_bars();
            Ok::<_, WindowError>(())
        })?;
        self.refresh();
        Ok(())
    }

    /// Move focus to the next/previous window. Returns the new prompt when
    /// the focus moved.
    pub fn select_window(&self, forward: bool) -> Option<String> {
        let prompt = self.with_screen(|s| {
            let moved = if forward {
                s.registry.select_next()
            } else {
                s.registry.select_prev()
            };
            moved.then(|| {
                s.draw_bars();
                prompt_for(&s.registry.active().label)
            })
        });
        if prompt.is_some() {
            self.refresh();
        }
        prompt
    }

    pub fn active_prompt(&self) -> String {
        self.with_screen(|s| prompt_for(&s.registry.active().label))
    }

    pub fn set_title(&self, label: &str, title: &str) -> bool {
        let changed = self.with_screen(|s| {
            let changed = s.registry.new_window_title(label, title);
            s.draw_titlebar();
            changed
        });
        self.refresh();
        changed
    }

    pub fn close_all_private_conversations(&self) -> usize {
        let closed = self.with_screen(|s| {
            let n = s.registry.close_all_private_conversations();
            s.draw_bars();
            n
        });
        self.refresh();
        closed
    }

    /// Flip logging for the active window and say so in it
    pub fn toggle_logging(&self) -> bool {
        let (on, refnum) = self.with_screen(|s| {
            let w = s.registry.active_mut();
            w.logging = !w.logging;
            let state = (w.logging, w.refnum);
            s.draw_statusbar();
            state
        });
        if on {
            self.print_active(&format!("Logging for window (refnum: {refnum}) now on"), Specifier::Spec1Success);
        } else {
            self.print_active(&format!("Logging for window (refnum: {refnum}) now off"), Specifier::Spec1Warn);
        }
        on
    }

    /// Blank the active window's scrollback and pane
    pub fn clear_active(&self) {
        self.with_screen(|s| {
            let (rows, cols) = s.geometry();
            let screen = &mut *s;
            let w = screen.registry.active_mut();
            w.scrollback.clear();
            w.scroll = ScrollState::default();
            w.recreate(&mut screen.palette, rows, cols);
            screen.draw_statusbar();
        });
        self.refresh();
    }

    /// Re-layout for a new terminal size
    pub fn resize(&self, rows: u16, cols: u16) {
        self.with_screen(|s| s.resize(rows, cols));
        self.refresh();
    }

    pub fn set_user_modes(&self, modes: &str) {
        self.with_screen(|s| {
            s.user_modes = modes.to_string();
            s.draw_statusbar();
        });
        self.refresh();
    }

    pub fn set_chanmodes(&self, channel: &str, modes: &str) -> Result<(), WindowError> {
        self.with_window(channel, |w| w.chanmodes = modes.to_string())
    }

    /// Replace a channel's nicklist from a NAMES reply (`@op +voice nick`)
    pub fn names(&self, channel: &str, entries: &[&str]) -> Result<(), WindowError> {
        self.with_window(channel, |w| {
            w.nicklist.clear();
            for entry in entries {
                w.nicklist.add_prefixed(entry);
            }
            w.received_names = true;
        })
    }

    pub fn join(&self, channel: &str, nick: &str) -> Result<(), WindowError> {
        self.with_window(channel, |w| {
            w.nicklist.add(nick, Privilege::Normal);
        })
    }

    pub fn part(&self, channel: &str, nick: &str) -> Result<(), WindowError> {
        self.with_window(channel, |w| {
            w.nicklist.remove(nick);
        })
    }

    pub fn set_privilege(&self, channel: &str, nick: &str, privilege: Privilege) -> Result<(), WindowError> {
        self.with_window(channel, |w| {
            w.nicklist.set_privilege(nick, privilege);
        })
    }

    /// A nick change, applied to every channel that has the nick
    pub fn rename(&self, old: &str, new: &str) {
        self.with_screen(|s| {
            let (rows, cols) = s.geometry();
            let screen = &mut *s;
            for w in screen.registry.channels_mut() {
                if w.nicklist.rename(old, new) {
                    w.update_nicklist(&mut screen.palette, rows, cols);
                }
            }
            screen.draw_statusbar();
        });
        self.refresh();
    }

    /// Apply `f` to a channel window, then redraw its nicklist (re-layout
    /// when the width changed)
    fn with_window<F>(&self, channel: &str, f: F) -> Result<(), WindowError>
    where
        F: FnOnce(&mut Window),
    {
        self.with_screen(|s| {
            let (rows, cols) = s.geometry();
            let screen = &mut *s;
            let w = screen
                .registry
                .get_mut(channel)
                .ok_or_else(|| WindowError::NotFound(channel.to_string()))?;
            f(w);
            w.update_nicklist(&mut screen.palette, rows, cols);
            screen.draw_statusbar();
            Ok::<_, WindowError>(())
        })?;
        self.refresh();
        Ok(())
    }

    /// An incoming PRIVMSG: route it to its window, then notify and
    /// broadcast activity as needed
    pub fn privmsg(&self, nick: &str, dest: &str, msg: &str) {
        let own_nick = self.config.nickname();
        let to_me = match own_nick {
            Some(me) => dest.eq_ignore_ascii_case(me),
            None => !is_irc_channel(dest),
        };
        let s1 = self.config.theme("nick_s1");
        let s2 = self.config.theme("nick_s2");

        let (label, title) = if to_me { (nick, nick) } else { (dest, "No title.") };
        // a new conversation must not take focus from the input line
        let spawned = self.with_screen(|s| {
            let focused = s.registry.active().label.clone();
            let result = s
                .registry
                .spawn(label, Some(title))
                .and_then(|()| s.registry.change_by_label(&focused).map(drop));
            s.draw_bars();
            result
        });
        if let Err(e) = spawned {
            warn!(error = %e, label, "cannot open window for message");
            return;
        }

        let (text, notification) = if to_me {
            let color = self.config.theme("secondary_color");
            (
                format!("{s1}{color}{nick}{NORMAL}{s2} {msg}"),
                Some(notify::private_message(nick, msg)),
            )
        } else {
            let symbol = self.with_screen(|s| {
                s.registry
                    .get(dest)
                    .and_then(|w| w.nicklist.get(nick))
                    .map(|m| m.privilege.symbol())
                    .unwrap_or(' ')
            });
            let highlight = own_nick
                .map(|me| notify::should_highlight(msg, me, &self.config.nickname_aliases()))
                .unwrap_or(false);
            let color = self.config.theme(if highlight { "color4" } else { "secondary_color" });
            (
                format!("{s1}{symbol}{color}{nick}{NORMAL}{s2} {msg}"),
                highlight.then(|| notify::highlight(nick, dest, msg)),
            )
        };

        if let Err(e) = self.print(label, &text, Specifier::None) {
            warn!(error = %e, label, "message dropped");
            return;
        }

        if let Some(payload) = notification {
            notify::notify(self.notifier.as_ref(), &payload);
            self.broadcast_activity(label);
        }
    }

    /// Tell the active window that `label` has something new
    pub fn broadcast_activity(&self, label: &str) {
        let source = self.with_screen(|s| {
            let active = s.registry.active().refnum;
            s.registry
                .get(label)
                .filter(|w| w.refnum != active)
                .map(|w| (w.label.clone(), w.refnum))
        });
        if let Some((label, refnum)) = source {
            self.print_active(
                &format!("activity at window {BOLD}{label}{BOLD} (refnum: {refnum})"),
                Specifier::Spec1Success,
            );
        }
    }

    /// The line editor's view of this session
    pub fn host(&self) -> SessionHost<'_> {
        SessionHost { session: self }
    }
}

/// Adapts a [`Session`] to the line editor. Each call takes the screen
/// lock only for its own duration.
pub struct SessionHost<'a> {
    session: &'a Session,
}

impl Host for SessionHost<'_> {
    fn beep(&mut self) {
        self.session.beep();
    }

    fn switch_window(&mut self, forward: bool) -> Option<String> {
        self.session.select_window(forward)
    }

    fn scroll(&mut self, key: ScrollKey) -> bool {
        let moved = self.session.with_screen(|s| {
            let (rows, _) = s.geometry();
            let screen = &mut *s;
            let w = screen.registry.active_mut();
            let moved = match key {
                ScrollKey::PageUp => w.page_up(&mut screen.palette, rows),
                ScrollKey::PageDown => w.page_down(&mut screen.palette, rows),
                ScrollKey::NicklistUp => w.nicklist_scroll_up(rows),
                ScrollKey::NicklistDown => w.nicklist_scroll_down(rows),
            };
            screen.draw_statusbar();
            moved
        });
        self.session.refresh();
        moved
    }

    fn in_channel(&self) -> bool {
        self.session.with_screen(|s| s.registry.active().is_channel())
    }

    fn candidates(&mut self, kind: CompletionKind, prefix: &str) -> Vec<String> {
        match kind {
            CompletionKind::Help | CompletionKind::Command => matching_commands(prefix),
            CompletionKind::Setting => filter_prefix(config::setting_names(), prefix),
            CompletionKind::Query | CompletionKind::Whois | CompletionKind::ChannelUser => {
                self.session.with_screen(|s| {
                    let nicks = s.registry.active().nicklist.nicks();
                    filter_prefix(nicks.iter().map(String::as_str), prefix)
                })
            }
        }
    }

    fn report(&mut self, msg: &str) {
        self.session.print_active(msg, Specifier::Spec1Warn);
    }

    fn show(&mut self, panel: &Surface) {
        self.session.with_screen(|s| s.set_input(panel));
        self.session.refresh();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Default)]
    struct Frames {
        count: Mutex<usize>,
        beeps: Mutex<usize>,
    }

    impl FrameSink for Arc<Frames> {
        fn flush(&self, _frame: &str) {
            *self.count.lock().unwrap() += 1;
        }

        fn beep(&self) {
            *self.beeps.lock().unwrap() += 1;
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl Notifier for Arc<Recorder> {
        fn send(&self, text: &str) {
            self.0.lock().unwrap().push(text.to_string());
        }
    }

    fn config() -> Config {
        Config::parse(
            r#"
            [general]
            nickname = "ferris"
            show_timestamps = false

            [theme]
            specifier1 = "[-]"
            gfx_success = "[+]"
            gfx_warning = "[!]"
            gfx_failure = "[x]"
            nick_s1 = "<"
            nick_s2 = ">"
            "#,
        )
        .unwrap()
    }

    fn session() -> Session {
        Session::new(config(), Palette::disabled(), "irc.example.org", 12, 60)
    }

    fn lines(session: &Session, label: &str) -> Vec<String> {
        session.with_screen(|s| {
            s.registry
                .get(label)
                .map(|w| w.scrollback.iter().map(|l| l.text.clone()).collect())
                .unwrap_or_default()
        })
    }

    #[test]
    fn test_print_stores_and_paints() {
        let frames = Arc::new(Frames::default());
        let s = session().with_sink(frames.clone());
        s.print(STATUS_LABEL, "hello", Specifier::None).unwrap();
        assert_eq!(lines(&s, STATUS_LABEL), vec!["hello"]);
        s.with_screen(|sc| assert_eq!(sc.registry.status().pane().row_text(0), "hello"));
        assert_eq!(*frames.count.lock().unwrap(), 1);
    }

    #[test]
    fn test_print_to_missing_window() {
        let s = session();
        assert_eq!(
            s.print("#nowhere", "x", Specifier::None),
            Err(WindowError::NotFound("#nowhere".into()))
        );
    }

    #[test]
    fn test_no_colors_strips_before_storing() {
        let s = session();
        s.print(STATUS_LABEL, "\x02bold\x02 \x034red", Specifier::Spec1).unwrap();
        assert_eq!(lines(&s, STATUS_LABEL), vec!["[-] bold red"]);
        let indent = s.with_screen(|sc| sc.registry.status().scrollback.get(0).unwrap().indent);
        assert_eq!(indent, 4);
    }

    #[test]
    fn test_logging_writes_plain_lines() {
        let dir = tempfile::tempdir().unwrap();
        let s = session().with_log_dir(dir.path());
        s.spawn("#Rust", None).unwrap();
        assert!(s.toggle_logging());
        s.print("#rust", "\x02hi\x02", Specifier::None).unwrap();

        let path = dir.path().join("ircexampleorg-2.#rust.txt");
        let content = std::fs::read_to_string(path).unwrap();
        let logged: Vec<&str> = content.lines().map(|l| &l[11..]).collect();
        assert_eq!(logged, vec!["[-] [+] Logging for window (refnum: 2) now on", "hi"]);
    }

    #[test]
    fn test_inappropriate_log_name_notice() {
        let dir = tempfile::tempdir().unwrap();
        let s = session().with_log_dir(dir.path());
        s.spawn("#!!", None).unwrap();
        s.with_screen(|sc| sc.registry.active_mut().logging = true);
        s.print("#!!", "lost", Specifier::None).unwrap();

        assert_eq!(lines(&s, "#!!"), vec!["lost"]);
        let status = lines(&s, STATUS_LABEL);
        assert_eq!(status.len(), 1);
        assert!(status[0].contains("Inappropriate filename"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_toggle_logging_messages() {
        let s = session();
        assert!(s.toggle_logging());
        assert!(!s.toggle_logging());
        let status = lines(&s, STATUS_LABEL);
        assert_eq!(status[0], "[-] [+] Logging for window (refnum: 1) now on");
        assert_eq!(status[1], "[-] [!] Logging for window (refnum: 1) now off");
    }

    #[test]
    fn test_private_message_opens_window_and_notifies() {
        let rec = Arc::new(Recorder::default());
        let s = session().with_notifier(rec.clone());
        s.privmsg("alice", "ferris", "hi there");

        assert_eq!(lines(&s, "alice"), vec!["<alice> hi there"]);
        assert_eq!(s.active_prompt(), "> ");
        assert_eq!(rec.0.lock().unwrap().as_slice(), ["[PM] <alice> hi there"]);
    }

    #[test]
    fn test_highlight_broadcasts_activity() {
        let rec = Arc::new(Recorder::default());
        let s = session().with_notifier(rec.clone());
        s.spawn("#rust", None).unwrap();
        s.names("#rust", &["@alice", "bob"]).unwrap();
        s.change_window(1).unwrap();

        s.privmsg("bob", "#rust", "just chatting");
        s.privmsg("alice", "#rust", "ferris: ping");

        let chan = lines(&s, "#rust");
        assert_eq!(chan[0], "< bob> just chatting");
        assert_eq!(chan[1], "<@alice> ferris: ping");
        assert_eq!(rec.0.lock().unwrap().as_slice(), ["alice @ #rust: ferris: ping"]);
        assert_eq!(
            lines(&s, STATUS_LABEL),
            vec!["[-] [+] activity at window #rust (refnum: 2)"]
        );
    }

    #[test]
    fn test_window_lifecycle() {
        let s = session();
        s.spawn("#a", Some("topic a")).unwrap();
        s.spawn("bob", None).unwrap();
        assert_eq!(s.active_prompt(), "bob> ");
        assert_eq!(s.select_window(false), Some("#a: ".to_string()));
        s.with_screen(|sc| assert_eq!(sc.titlebar().row_text(0), " topic a"));
        assert_eq!(s.close_all_private_conversations(), 1);
        assert_eq!(s.destroy("#a"), Ok(()));
        assert_eq!(s.active_prompt(), "> ");
        assert_eq!(s.destroy(STATUS_LABEL), Err(WindowError::InvalidLabel(STATUS_LABEL.into())));
    }

    #[test]
    fn test_nicklist_updates_relayout() {
        let s = session();
        s.spawn("#rust", None).unwrap();
        s.names("#rust", &["@op", "+v"]).unwrap();
        let before = s.with_screen(|sc| sc.registry.active().nicklist_width());
        s.join("#rust", "a_much_longer_nick").unwrap();
        s.rename("op", "operator");
        s.with_screen(|sc| {
            let w = sc.registry.active();
            assert!(w.nicklist_width() > before);
            assert_eq!(w.pane().width() + w.nicklist_width(), 60);
            assert!(w.nicklist.contains("operator"));
        });
        s.part("#rust", "v").unwrap();
        assert_eq!(s.join("#gone", "x"), Err(WindowError::NotFound("#gone".into())));
    }

    #[test]
    fn test_host_scroll_and_beep() {
        let frames = Arc::new(Frames::default());
        let s = session().with_sink(frames.clone());
        let mut host = s.host();
        assert!(!host.scroll(ScrollKey::PageUp));
        for i in 0..40 {
            s.print_status(&format!("line {i}"), Specifier::None);
        }
        assert!(host.scroll(ScrollKey::PageUp));
        s.with_screen(|sc| {
            assert!(sc.registry.status().scroll.mode);
            assert!(sc.statusbar_text().ends_with("-- MORE --"));
        });
        assert!(host.scroll(ScrollKey::PageDown));
        host.beep();
        assert_eq!(*frames.beeps.lock().unwrap(), 1);
    }

    #[test]
    fn test_host_candidates() {
        let s = session();
        s.spawn("#rust", None).unwrap();
        s.names("#rust", &["alice", "@albert", "bob"]).unwrap();
        let mut host = s.host();
        assert!(host.in_channel());
        assert_eq!(
            host.candidates(CompletionKind::ChannelUser, "AL"),
            vec!["albert".to_string(), "alice".to_string()]
        );
        assert_eq!(host.candidates(CompletionKind::Setting, "time"), vec!["time_format".to_string()]);
        host.report("no magic");
        assert_eq!(lines(&s, "#rust"), vec!["[-] [!] no magic"]);
    }
}

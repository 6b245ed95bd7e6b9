//! ircterm - terminal IRC client front end
//!
//! Puts the terminal in raw mode, runs the line editor on a blocking
//! thread and feeds the windows from a synthetic message source in place
//! of a network connection. Tracing goes to a file in the log directory
//! while the terminal is raw.

use std::fs::OpenOptions;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use ircterm::assemble::Specifier;
use ircterm::colors::{Palette, TermCaps};
use ircterm::commands::{self, Flow};
use ircterm::config::{Config, TERM_BACKGROUND};
use ircterm::notify::TracingNotifier;
use ircterm::paths;
use ircterm::readline::{self, CancelReason, Outcome};
use ircterm::session::Session;
use ircterm::terminal::{self, CrosstermKeys, RawTerminal, ResizeFlag, StdoutSink};

/// Host name shown in the statusbar and used for log file names
const DEMO_HOST: &str = "irc.example.org";
const DEMO_CHANNEL: &str = "#ircterm";

#[tokio::main]
async fn main() -> Result<()> {
    paths::ensure_dirs()?;
    let trace_path = paths::trace_log_path();
    let trace_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&trace_path)
        .with_context(|| format!("failed to open {}", trace_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ircterm=info".parse()?),
        )
        .with_writer(Mutex::new(trace_file))
        .with_ansi(false)
        .init();

    let config = Config::load(paths::config_path()).context("failed to load config")?;
    let palette = if config.theme_bool("term_enable_colors", true) {
        Palette::new(
            TermCaps::detect(),
            config.theme_bool("term_use_default_colors", true),
            config.theme_integer(&TERM_BACKGROUND) as i16,
        )
    } else {
        Palette::disabled()
    };

    let mut raw = RawTerminal::enter()?;
    let (rows, cols) = terminal::size();
    info!(rows, cols, "starting ircterm");

    let session = Arc::new(
        Session::new(config, palette, DEMO_HOST, rows, cols)
            .with_notifier(TracingNotifier)
            .with_sink(StdoutSink),
    );
    session.print_status(
        "Welcome to ircterm. Type /help for commands, /quit to leave.",
        Specifier::Spec1,
    );

    open_demo_channel(&session);

    let resize = ResizeFlag::new();
    watch_resize(resize.clone());
    tokio::spawn(feed(session.clone()));

    let input = {
        let session = session.clone();
        let resize = resize.clone();
        tokio::task::spawn_blocking(move || input_loop(&session, &resize))
    };
    let result = input.await.context("input thread panicked")?;

    raw.leave()?;
    info!("bye");
    result
}

/// Read lines until /quit or the terminal goes away
fn input_loop(session: &Session, resize: &ResizeFlag) -> Result<()> {
    let mut keys = CrosstermKeys::new(resize.clone());
    let disable_beeps = session.config().general_bool("disable_beeps", false);

    loop {
        let prompt = session.active_prompt();
        let cols = session.with_screen(|s| s.geometry().1);
        let mut host = session.host();

        match readline::readline(&mut host, &mut keys, &prompt, cols, disable_beeps, resize) {
            Outcome::Submitted(line) => {
                if commands::handle_input(session, &line) == Flow::Quit {
                    return Ok(());
                }
            }
            Outcome::Empty => {}
            Outcome::Cancelled(CancelReason::Resize) => {
                let (rows, cols) = terminal::size();
                info!(rows, cols, "resizing");
                session.resize(rows, cols);
            }
            Outcome::Cancelled(CancelReason::InputClosed) => {
                warn!("input closed");
                return Ok(());
            }
            Outcome::Cancelled(reason) => {
                tracing::debug!(?reason, "line cancelled");
            }
        }
    }
}

#[cfg(unix)]
fn watch_resize(flag: ResizeFlag) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let mut winch = match signal(SignalKind::window_change()) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "cannot watch SIGWINCH");
                return;
            }
        };
        while winch.recv().await.is_some() {
            flag.raise();
        }
    });
}

#[cfg(not(unix))]
fn watch_resize(_flag: ResizeFlag) {}

fn open_demo_channel(session: &Session) {
    if let Err(e) = session.spawn(DEMO_CHANNEL, Some("ircterm demo channel")) {
        warn!(error = %e, "cannot open demo channel");
        return;
    }
    if let Err(e) = session.names(DEMO_CHANNEL, &["@alice", "+bob", "carol", "dave"]) {
        warn!(error = %e, "cannot fill demo nicklist");
    }
    if let Err(e) = session.set_chanmodes(DEMO_CHANNEL, "+nt") {
        warn!(error = %e, "cannot set demo channel modes");
    }
}

/// Synthetic traffic standing in for a server connection
async fn feed(session: Arc<Session>) {
    const CHATTER: &[(&str, &str)] = &[
        ("alice", "has anyone tried the new borrow checker diagnostics?"),
        ("bob", "\x02yes\x02, they are \x0303much\x03 nicer"),
        ("carol", "I still get lost in lifetime errors on long lines that wrap across the terminal width"),
        ("alice", "本当に? wide glyphs should line up fine too"),
        ("dave", "\x0304,01red on black\x0f and back to normal"),
    ];

    let nickname = session.config().nickname().unwrap_or("me").to_string();
    let mut tick = tokio::time::interval(Duration::from_secs(4));
    for n in 0usize.. {
        tick.tick().await;
        let (nick, chatter) = CHATTER[n % CHATTER.len()];
        let (dest, msg) = match n % 11 {
            10 => (nickname.clone(), "psst, got a minute?".to_string()),
            6 => (DEMO_CHANNEL.to_string(), format!("{nickname}: ping")),
            _ => (DEMO_CHANNEL.to_string(), chatter.to_string()),
        };

        // privmsg takes blocking locks
        let session = session.clone();
        let result = tokio::task::spawn_blocking(move || session.privmsg(nick, &dest, &msg)).await;
        if let Err(e) = result {
            warn!(error = %e, "feed task failed");
            return;
        }
    }
}

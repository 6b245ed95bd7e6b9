//! Slash command dispatch for the demo client

use tracing::debug;

use crate::assemble::Specifier;
use crate::markup::{BOLD, NORMAL};
use crate::readline::completion::COMMANDS;
use crate::session::Session;
use crate::window::{is_irc_channel, STATUS_LABEL};

/// What the input loop should do after a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Handle one submitted line
pub fn handle_input(session: &Session, input: &str) -> Flow {
    let input = input.trim();
    if input.is_empty() {
        return Flow::Continue;
    }

    let Some(rest) = input.strip_prefix('/') else {
        cmd_say(session, input);
        return Flow::Continue;
    };

    let (cmd, args) = match rest.split_once(' ') {
        Some((cmd, args)) => (cmd, args.trim()),
        None => (rest, ""),
    };
    debug!(cmd, "command");

    if let Ok(refnum) = cmd.parse::<usize>() {
        report(session, session.change_window(refnum));
        return Flow::Continue;
    }

    match cmd.to_ascii_lowercase().as_str() {
        "quit" => return Flow::Quit,
        "clear" => session.clear_active(),
        "close" => cmd_close(session),
        "help" => cmd_help(session, args),
        "join" => cmd_join(session, args),
        "log" => {
            session.toggle_logging();
        }
        "names" => cmd_names(session),
        "query" => cmd_query(session, args),
        "set" => cmd_set(session, args),
        "topic" => cmd_topic(session, args),
        "whois" => cmd_whois(session, args),
        _ => session.print_active(&format!("Unknown command: /{cmd}"), Specifier::Spec1Failure),
    }
    Flow::Continue
}

fn report<T>(session: &Session, result: Result<T, crate::error::WindowError>) {
    if let Err(e) = result {
        session.print_active(&e.to_string(), Specifier::Spec1Failure);
    }
}

fn active_label(session: &Session) -> String {
    session.with_screen(|s| s.registry.active().label.clone())
}

/// Plain text goes to the active conversation as our own message
fn cmd_say(session: &Session, text: &str) {
    let label = active_label(session);
    if label == STATUS_LABEL {
        session.print_active("Not in a conversation", Specifier::Spec1Warn);
        return;
    }
    let config = session.config();
    let nick = config.nickname().unwrap_or("me");
    let line = format!(
        "{}{}{nick}{NORMAL}{} {text}",
        config.theme("nick_s1"),
        config.theme("primary_color"),
        config.theme("nick_s2"),
    );
    report(session, session.print(&label, &line, Specifier::None));
}

fn cmd_help(session: &Session, args: &str) {
    if !args.is_empty() {
        match COMMANDS.iter().find(|(name, _)| name.eq_ignore_ascii_case(args)) {
            Some((name, about)) => session.print_active(&format!("{BOLD}/{name}{BOLD}: {about}"), Specifier::Spec1),
            None => session.print_active(&format!("No help for {args}"), Specifier::Spec1Warn),
        }
        return;
    }
    session.print_active("Commands:", Specifier::Spec1);
    for (name, about) in COMMANDS {
        session.print_active(&format!("  /{name:<8} {about}"), Specifier::None);
    }
    session.print_active("  /<num>    Switch to window <num>", Specifier::None);
}

fn cmd_join(session: &Session, args: &str) {
    if !is_irc_channel(args) {
        session.print_active("Usage: /join <#channel>", Specifier::Spec1Warn);
        return;
    }
    report(session, session.spawn(args, Some("No title.")));
}

fn cmd_query(session: &Session, args: &str) {
    if args.is_empty() || is_irc_channel(args) || args.contains(' ') {
        session.print_active("Usage: /query <nick>", Specifier::Spec1Warn);
        return;
    }
    report(session, session.spawn(args, Some(args)));
}

fn cmd_close(session: &Session) {
    let label = active_label(session);
    report(session, session.destroy(&label));
}

fn cmd_names(session: &Session) {
    let names = session.with_screen(|s| {
        let w = s.registry.active();
        w.is_channel().then(|| {
            w.nicklist
                .sorted()
                .iter()
                .map(|m| format!("{}{}", m.privilege.symbol(), m.nick).trim_start().to_string())
                .collect::<Vec<_>>()
        })
    });
    match names {
        Some(names) if names.is_empty() => session.print_active("Nobody here", Specifier::Spec1),
        Some(names) => session.print_active(&names.join(" "), Specifier::Spec1),
        None => session.print_active("Not in a channel", Specifier::Spec1Warn),
    }
}

/// Read-only: show the value a setting currently has
fn cmd_set(session: &Session, args: &str) {
    if args.is_empty() {
        session.print_active("Usage: /set <setting>", Specifier::Spec1Warn);
        return;
    }
    match session.config().lookup(args) {
        Some(value) => session.print_active(&format!("{args} = {value:?}"), Specifier::Spec1),
        None => session.print_active(&format!("No such setting: {args}"), Specifier::Spec1Failure),
    }
}

fn cmd_topic(session: &Session, args: &str) {
    let label = active_label(session);
    if !session.set_title(&label, args) {
        session.print_active("Usage: /topic <text>", Specifier::Spec1Warn);
    }
}

fn cmd_whois(session: &Session, args: &str) {
    let found = session.with_screen(|s| {
        s.registry
            .iter()
            .filter(|w| w.is_channel())
            .filter_map(|w| w.nicklist.get(args).map(|m| format!("{}{}", m.privilege.symbol(), w.label)))
            .map(|c| c.trim_start().to_string())
            .collect::<Vec<_>>()
    });
    if found.is_empty() {
        session.print_active(&format!("{args}: no such nick"), Specifier::Spec1Warn);
    } else {
        session.print_active(&format!("{BOLD}{args}{BOLD} is on {}", found.join(" ")), Specifier::Spec1);
    }
}

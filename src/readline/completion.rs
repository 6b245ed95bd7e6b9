//! Tab completion for the input line
//!
//! The first Tab classifies the line and asks the host for candidates.
//! Further Tabs circulate through that list; any other key ends the
//! circulation.

pub const NO_MAGIC: &str = "no magic";
pub const NO_MORE_MATCHES: &str = "no more matches";
pub const NOT_IN_CHANNEL: &str = "not in irc channel";

/// Commands known to the client, with a one-line description
pub const COMMANDS: &[(&str, &str)] = &[
    ("clear", "Clear the active window"),
    ("close", "Close the active window"),
    ("help", "Show available commands"),
    ("join", "Open a channel window"),
    ("log", "Toggle logging for the active window"),
    ("names", "List the nicks in the active channel"),
    ("query", "Open a private conversation"),
    ("quit", "Leave the client"),
    ("set", "Change a setting"),
    ("topic", "Set the window title"),
    ("whois", "Show what is known about a nick"),
];

/// What the line asks to complete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionKind {
    /// `/help <cmd>`
    Help,
    /// `/query <nick>`
    Query,
    /// `/set <setting>`
    Setting,
    /// `/whois <nick>`
    Whois,
    /// `/<command>`
    Command,
    /// a bare nick in a channel
    ChannelUser,
}

impl CompletionKind {
    /// Text kept in front of the candidate
    pub fn trigger(self) -> &'static str {
        match self {
            CompletionKind::Help => "/help ",
            CompletionKind::Query => "/query ",
            CompletionKind::Setting => "/set ",
            CompletionKind::Whois => "/whois ",
            CompletionKind::Command => "/",
            CompletionKind::ChannelUser => "",
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            CompletionKind::ChannelUser => ": ",
            _ => "",
        }
    }

    fn wants_channel(self) -> bool {
        matches!(self, CompletionKind::Query | CompletionKind::Whois)
    }

    /// Classify `line`, or say why nothing can be completed
    pub fn classify(line: &str, in_channel: bool) -> Result<Self, &'static str> {
        let kind = [
            CompletionKind::Help,
            CompletionKind::Query,
            CompletionKind::Setting,
            CompletionKind::Whois,
        ]
        .into_iter()
        .find(|k| line.starts_with(k.trigger()));

        match kind {
            Some(k) if k.wants_channel() && !in_channel => Err(NOT_IN_CHANNEL),
            Some(k) => Ok(k),
            None if line.starts_with('/') => {
                if line.chars().count() > 1 {
                    Ok(CompletionKind::Command)
                } else {
                    Err(NO_MAGIC)
                }
            }
            None if in_channel => Ok(CompletionKind::ChannelUser),
            None => Err(NO_MAGIC),
        }
    }

    /// The whole line for `candidate`
    pub fn render(self, candidate: &str) -> String {
        format!("{}{candidate}{}", self.trigger(), self.suffix())
    }
}

/// Result of one Tab press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Replace the line with this text
    Complete(String),
    /// Report this and beep
    Fail(&'static str),
}

#[derive(Debug)]
struct Circulation {
    kind: CompletionKind,
    matches: Vec<String>,
    next: usize,
}

#[derive(Debug, Default)]
pub struct Completer {
    circulation: Option<Circulation>,
}

impl Completer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_circulating(&self) -> bool {
        self.circulation.is_some()
    }

    pub fn reset(&mut self) {
        self.circulation = None;
    }

    /// Handle a Tab on `line`. `candidates` is asked once, on the press
    /// that starts a circulation.
    pub fn tab<F>(&mut self, line: &str, in_channel: bool, mut candidates: F) -> Step
    where
        F: FnMut(CompletionKind, &str) -> Vec<String>,
    {
        if let Some(circ) = self.circulation.as_mut() {
            let Some(candidate) = circ.matches.get(circ.next) else {
                self.reset();
                return Step::Fail(NO_MORE_MATCHES);
            };
            circ.next += 1;
            return Step::Complete(circ.kind.render(candidate));
        }

        let kind = match CompletionKind::classify(line, in_channel) {
            Ok(kind) => kind,
            Err(msg) => return Step::Fail(msg),
        };
        let prefix = &line[kind.trigger().len()..];
        let matches = candidates(kind, prefix);
        let Some(first) = matches.first() else {
            return Step::Fail(NO_MAGIC);
        };

        let text = kind.render(first);
        self.circulation = Some(Circulation {
            kind,
            matches,
            next: 1,
        });
        Step::Complete(text)
    }
}

/// Items starting with `prefix`, compared case-insensitively, in their
/// original order
pub fn filter_prefix<'a, I>(items: I, prefix: &str) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let prefix = prefix.to_lowercase();
    items
        .into_iter()
        .filter(|item| item.to_lowercase().starts_with(&prefix))
        .map(str::to_string)
        .collect()
}

/// Command names matching `prefix`
pub fn matching_commands(prefix: &str) -> Vec<String> {
    filter_prefix(COMMANDS.iter().map(|(name, _)| *name), prefix)
}

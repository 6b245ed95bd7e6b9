//! Channel member list
//!
//! Members are kept unsorted; [`Nicklist::sorted`] orders them by privilege
//! (`~ & @ % +` then regular members) and then by nick, case-insensitively,
//! shorter nicks first on a shared prefix. The panel drawn at the right
//! edge of a channel window is `│` + privilege + nick per row.

use std::cmp::Ordering;

use crate::surface::Surface;
use crate::width::str_width;

/// Longest nick shown in full
pub const MAX_NICK_WIDTH: usize = 16;

/// Rows moved by one nicklist scroll
pub const SCROLL_AMOUNT: usize = 10;

const VLINE: char = '│';

/// Channel privilege, highest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Privilege {
    Owner,
    SuperOp,
    Op,
    HalfOp,
    Voice,
    Normal,
}

impl Privilege {
    pub fn symbol(self) -> char {
        match self {
            Privilege::Owner => '~',
            Privilege::SuperOp => '&',
            Privilege::Op => '@',
            Privilege::HalfOp => '%',
            Privilege::Voice => '+',
            Privilege::Normal => ' ',
        }
    }

    /// Parse a NAMES-style prefix
    pub fn from_symbol(c: char) -> Option<Self> {
        match c {
            '~' => Some(Privilege::Owner),
            '&' => Some(Privilege::SuperOp),
            '@' => Some(Privilege::Op),
            '%' => Some(Privilege::HalfOp),
            '+' => Some(Privilege::Voice),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub nick: String,
    pub privilege: Privilege,
}

/// Members per privilege
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NickCounts {
    pub owners: usize,
    pub superops: usize,
    pub ops: usize,
    pub halfops: usize,
    pub voices: usize,
    pub normal: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Nicklist {
    members: Vec<Member>,
    scroll_pos: usize,
}

impl Nicklist {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, nick: &str) -> Option<usize> {
        self.members
            .iter()
            .position(|m| m.nick.eq_ignore_ascii_case(nick))
    }

    pub fn contains(&self, nick: &str) -> bool {
        self.position(nick).is_some()
    }

    pub fn get(&self, nick: &str) -> Option<&Member> {
        self.position(nick).map(|i| &self.members[i])
    }

    /// Add a member. Returns false when the nick is already present.
    pub fn add(&mut self, nick: &str, privilege: Privilege) -> bool {
        if nick.is_empty() || self.contains(nick) {
            return false;
        }
        self.members.push(Member {
            nick: nick.to_string(),
            privilege,
        });
        true
    }

    /// Add a member from a NAMES entry such as `@alice` or `bob`
    pub fn add_prefixed(&mut self, entry: &str) -> bool {
        let mut chars = entry.chars();
        match chars.next().and_then(Privilege::from_symbol) {
            Some(p) => self.add(chars.as_str(), p),
            None => self.add(entry, Privilege::Normal),
        }
    }

    pub fn remove(&mut self, nick: &str) -> bool {
        match self.position(nick) {
            Some(i) => {
                self.members.swap_remove(i);
                true
            }
            None => false,
        }
    }

    /// Change a member's nick, keeping its privilege
    pub fn rename(&mut self, old: &str, new: &str) -> bool {
        if new.is_empty() {
            return false;
        }
        if let Some(j) = self.position(new) {
            if !self.members[j].nick.eq_ignore_ascii_case(old) {
                return false;
            }
        }
        match self.position(old) {
            Some(i) => {
                self.members[i].nick = new.to_string();
                true
            }
            None => false,
        }
    }

    pub fn set_privilege(&mut self, nick: &str, privilege: Privilege) -> bool {
        match self.position(nick) {
            Some(i) => {
                self.members[i].privilege = privilege;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.members.clear();
        self.scroll_pos = 0;
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn scroll_pos(&self) -> usize {
        self.scroll_pos
    }

    pub fn counts(&self) -> NickCounts {
        let mut c = NickCounts::default();
        for m in &self.members {
            match m.privilege {
                Privilege::Owner => c.owners += 1,
                Privilege::SuperOp => c.superops += 1,
                Privilege::Op => c.ops += 1,
                Privilege::HalfOp => c.halfops += 1,
                Privilege::Voice => c.voices += 1,
                Privilege::Normal => c.normal += 1,
            }
        }
        c.total = self.members.len();
        c
    }

    /// Members in display order
    pub fn sorted(&self) -> Vec<&Member> {
        let mut v: Vec<&Member> = self.members.iter().collect();
        v.sort_by(|a, b| compare(a, b));
        v
    }

    /// Nicks (case-preserved) in display order
    pub fn nicks(&self) -> Vec<String> {
        self.sorted().into_iter().map(|m| m.nick.clone()).collect()
    }

    /// Panel width: longest nick (capped) plus the line and privilege columns
    pub fn width(&self) -> u16 {
        let longest = self
            .members
            .iter()
            .map(|m| str_width(&m.nick))
            .max()
            .unwrap_or(0);
        (longest.min(MAX_NICK_WIDTH) + 2) as u16
    }

    pub fn scroll_up(&mut self) {
        self.scroll_pos = self.scroll_pos.saturating_sub(SCROLL_AMOUNT);
    }

    pub fn scroll_down(&mut self) {
        self.scroll_pos += SCROLL_AMOUNT;
    }

    /// Draw `height` rows onto `surface`.
    ///
    /// A list that fits resets the scroll position and pads the remaining
    /// rows with the vertical line; a longer list clamps the scroll
    /// position so the last page is full.
    pub fn draw(&mut self, surface: &mut Surface, height: usize) {
        surface.erase();
        let total = self.members.len();
        if total <= height {
            self.scroll_pos = 0;
        } else {
            self.scroll_pos = self.scroll_pos.min(total - height);
        }

        let list = self.sorted();
        let rows = list.iter().skip(self.scroll_pos).take(height);
        let mut count = 0;
        for m in rows {
            print_row(surface, count, Some(m));
            count += 1;
        }
        while count < height {
            print_row(surface, count, None);
            count += 1;
        }
    }
}

fn print_row(surface: &mut Surface, row: usize, member: Option<&Member>) {
    let Ok(y) = u16::try_from(row) else {
        return;
    };
    if y >= surface.height() {
        return;
    }
    surface.move_to(y, 0);
    surface.add_char(VLINE);
    if let Some(m) = member {
        surface.add_char(m.privilege.symbol());
        surface.add_str(&m.nick);
    }
}

fn compare(a: &Member, b: &Member) -> Ordering {
    a.privilege.cmp(&b.privilege).then_with(|| {
        let la = a.nick.chars().map(|c| c.to_ascii_lowercase());
        let lb = b.nick.chars().map(|c| c.to_ascii_lowercase());
        la.cmp(lb)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Nicklist {
        let mut nl = Nicklist::new();
        for entry in ["bob", "+Carol", "@alice", "~root", "%half", "&super", "Bobby", "@Aaron"] {
            assert!(nl.add_prefixed(entry));
        }
        nl
    }

    #[test]
    fn test_sort_order() {
        let nl = sample();
        assert_eq!(
            nl.nicks(),
            vec!["root", "super", "Aaron", "alice", "half", "Carol", "bob", "Bobby"]
        );
    }

    #[test]
    fn test_shorter_first_on_shared_prefix() {
        let mut nl = Nicklist::new();
        nl.add("anna", Privilege::Normal);
        nl.add("ann", Privilege::Normal);
        assert_eq!(nl.nicks(), vec!["ann", "anna"]);
    }

    #[test]
    fn test_counts() {
        let c = sample().counts();
        assert_eq!(c.owners, 1);
        assert_eq!(c.superops, 1);
        assert_eq!(c.ops, 2);
        assert_eq!(c.halfops, 1);
        assert_eq!(c.voices, 1);
        assert_eq!(c.normal, 2);
        assert_eq!(c.total, 8);
    }

    #[test]
    fn test_width_capped() {
        let mut nl = Nicklist::new();
        nl.add("abc", Privilege::Normal);
        assert_eq!(nl.width(), 5);
        nl.add(&"x".repeat(30), Privilege::Normal);
        assert_eq!(nl.width(), (MAX_NICK_WIDTH + 2) as u16);
    }

    #[test]
    fn test_case_insensitive_membership() {
        let mut nl = sample();
        assert!(!nl.add("ALICE", Privilege::Normal));
        assert!(nl.set_privilege("BOB", Privilege::Voice));
        assert_eq!(nl.get("bob").unwrap().privilege, Privilege::Voice);
        assert!(nl.rename("bob", "robert"));
        assert!(nl.contains("Robert"));
        assert!(!nl.rename("robert", "alice"));
        assert!(nl.remove("ROBERT"));
        assert_eq!(nl.len(), 7);
    }

    #[test]
    fn test_draw_fitting_list_pads_rows() {
        let mut nl = Nicklist::new();
        nl.add("alice", Privilege::Op);
        nl.add("bob", Privilege::Normal);
        nl.scroll_down();

        let mut s = Surface::new(nl.width(), 4);
        nl.draw(&mut s, 4);
        assert_eq!(nl.scroll_pos(), 0);
        assert_eq!(s.lines(), vec!["│@alice", "│ bob", "│", "│"]);
    }

    #[test]
    fn test_draw_clamps_scroll() {
        let mut nl = Nicklist::new();
        for i in 0..25 {
            nl.add(&format!("n{i:02}"), Privilege::Normal);
        }
        let mut s = Surface::new(nl.width(), 10);

        nl.scroll_down();
        nl.scroll_down();
        nl.draw(&mut s, 10);
        // 25 members, 10 rows: last full page starts at 15
        assert_eq!(nl.scroll_pos(), 15);
        assert_eq!(s.row_text(0), "│ n15");
        assert_eq!(s.row_text(9), "│ n24");

        nl.scroll_up();
        nl.scroll_up();
        nl.draw(&mut s, 10);
        assert_eq!(nl.scroll_pos(), 0);
    }

    #[test]
    fn test_draw_short_overflow_shows_last_page() {
        let mut nl = Nicklist::new();
        for nick in ["amy", "ben", "cat", "dan", "eve", "fay"] {
            nl.add(nick, Privilege::Normal);
        }
        let mut s = Surface::new(nl.width(), 4);

        nl.scroll_down();
        nl.draw(&mut s, 4);
        assert_eq!(nl.scroll_pos(), 2);
        assert_eq!(s.lines(), vec!["│ cat", "│ dan", "│ eve", "│ fay"]);
    }
}

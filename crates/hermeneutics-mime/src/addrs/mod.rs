//! Mail addresses and address lists.
//!
//! ```
//! use hermeneutics_mime::addrs::{Addr, AddrList};
//!
//! let a = Addr::create("dummy@example.com", Some("Müller, Fritz"));
//! assert_eq!(a.to_string(), "Müller, Fritz <dummy@example.com>");
//! assert_eq!(a.quote(), "\"Müller, Fritz\" <dummy@example.com>");
//! assert_eq!(a.encode(), "=?UTF-8?Q?M=C3=BCller=2C_Fritz?= <dummy@example.com>");
//!
//! let list = AddrList::parse("Jörg Q. Müller <jmuell@example.com>, \"Meier, Hans\"\n  <hmei@example.com>, Möller\\, Fritz <fmoel@example.com>");
//! assert_eq!(list.len(), 3);
//! assert_eq!(list.quote(), "Jörg Q. Müller <jmuell@example.com>, \"Meier, Hans\" <hmei@example.com>, \"Möller, Fritz\" <fmoel@example.com>");
//! ```
//!
//! Parsing runs the token stream through a fixed pipeline: whitespace
//! folding into text runs, comment removal, group splitting and finally
//! splitting each group into single addresses.

mod token;

use crate::error::{Error, Result};
use crate::escape::HeaderWord;
use regex::Regex;
use std::collections::VecDeque;
use std::fmt;
use token::{Special, Token, lex, lex_decode, quote_string};

/// A display name and whether it has to be quoted on output.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
struct RealName {
    text: String,
    quoted: bool,
}

/// A single mail address with an optional display name.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Addr {
    mail: String,
    real: Option<RealName>,
}

/// Addresses sharing an optional group name (`name: a, b;`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    /// The group name; `None` for ungrouped addresses.
    pub name: Option<String>,
    /// Addresses of the group.
    pub addrs: Vec<Addr>,
}

impl Addr {
    /// Creates an address from a mailbox and an optional display name.
    #[must_use]
    pub fn create(mail: &str, real: Option<&str>) -> Self {
        let mail = lex(mail).iter().map(Token::quote).collect();
        let real = real.map(|r| real_name(lex(r)));
        Self { mail, real }
    }

    /// Parses the first address of a header field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] if the text holds no address.
    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_groups(text)
            .into_iter()
            .flat_map(|g| g.addrs)
            .next()
            .ok_or_else(|| Error::InvalidAddress(text.trim().to_string()))
    }

    /// Parses a header field into groups, decoding encoded words.
    #[must_use]
    pub fn parse_groups(text: &str) -> Vec<Group> {
        compile(lex_decode(text))
    }

    /// Parses text entered by a user into groups.
    ///
    /// Encoded words are taken literally.
    #[must_use]
    pub fn parse_entered(text: &str) -> Vec<Group> {
        compile(lex(text))
    }

    /// The mailbox as written (`local@domain`), quoted where needed.
    #[must_use]
    pub fn mail(&self) -> &str {
        &self.mail
    }

    /// The lower-cased mailbox used for comparisons.
    #[must_use]
    pub fn plain(&self) -> String {
        self.mail.to_lowercase()
    }

    /// The display name.
    #[must_use]
    pub fn real(&self) -> Option<&str> {
        self.real.as_ref().map(|r| r.text.as_str())
    }

    /// The address with the display name quoted where needed.
    #[must_use]
    pub fn quote(&self) -> String {
        self.render(|r| {
            if r.quoted {
                quote_string(&r.text)
            } else {
                r.text.clone()
            }
        })
    }

    /// The address for a header field: display names that are quoted or
    /// contain non-ASCII characters become encoded words.
    #[must_use]
    pub fn encode(&self) -> String {
        self.render(|r| {
            let converter = HeaderWord::new();
            if r.quoted || converter.needs(&r.text) {
                converter.encode_whole(&r.text)
            } else {
                r.text.clone()
            }
        })
    }

    fn render(&self, real: impl Fn(&RealName) -> String) -> String {
        match &self.real {
            Some(r) => format!("{} <{}>", real(r), self.mail),
            None => format!("<{}>", self.mail),
        }
    }
}

impl PartialEq for Addr {
    fn eq(&self, other: &Self) -> bool {
        self.plain() == other.plain()
    }
}

impl Eq for Addr {}

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(|r| r.text.clone()))
    }
}

fn real_name(tokens: Vec<Token>) -> RealName {
    let text = Token::Text(tokens);
    RealName {
        text: text.text(),
        quoted: text.needs_quote(),
    }
}

fn compile(tokens: Vec<Token>) -> Vec<Group> {
    let tokens = uncomment(unspace(tokens));
    split_groups(tokens)
        .into_iter()
        .map(|(name, tokens)| Group {
            name,
            addrs: split_list(tokens),
        })
        .collect()
}

/// Folds chars separated by single spaces into text runs and drops
/// the remaining spaces.
fn unspace(tokens: Vec<Token>) -> Vec<Token> {
    let mut result = Vec::new();
    let mut queue: VecDeque<Token> = tokens.into();

    while let Some(token) = queue.pop_front() {
        match token {
            Token::Space => {}
            Token::Char { .. } => {
                let mut run = vec![token];
                loop {
                    match (queue.front(), queue.get(1)) {
                        (Some(Token::Char { .. }), _) => run.extend(queue.pop_front()),
                        (Some(Token::Space), Some(Token::Char { .. })) => {
                            run.extend(queue.pop_front());
                            run.extend(queue.pop_front());
                        }
                        _ => break,
                    }
                }
                result.push(Token::Text(run));
            }
            other => result.push(other),
        }
    }
    result
}

/// Removes parenthesized comments, honoring nesting.
fn uncomment(tokens: Vec<Token>) -> Vec<Token> {
    let mut depth = 0usize;
    let mut result = Vec::new();
    for token in tokens {
        if token.is(Special::LParen) {
            depth += 1;
        } else if token.is(Special::RParen) && depth > 0 {
            depth -= 1;
        } else if depth == 0 {
            result.push(token);
        }
    }
    result
}

fn split_groups(tokens: Vec<Token>) -> Vec<(Option<String>, Vec<Token>)> {
    let mut groups = Vec::new();
    let mut queue: VecDeque<Token> = tokens.into();

    while !queue.is_empty() {
        let mut name = None;
        if queue.front().is_some_and(Token::is_text)
            && queue.get(1).is_some_and(|t| t.is(Special::Colon))
        {
            name = queue.pop_front().map(|t| t.text());
            queue.pop_front();
        }
        let mut members = Vec::new();
        while let Some(token) = queue.pop_front() {
            if token.is(Special::Semicolon) {
                break;
            }
            members.push(token);
        }
        groups.push((name, members));
    }
    groups
}

#[allow(clippy::unwrap_used)]
static NEEDS_QUOTE: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new("[^a-z0-9_]").unwrap());

/// Splits a group's tokens into addresses.
///
/// `<` takes priority over `,`: `Meier, Hans <h@x>` is one address when
/// `Meier` could not be a bare local part.
fn split_list(tokens: Vec<Token>) -> Vec<Addr> {
    let mut addrs = Vec::new();
    let mut queue: VecDeque<Token> = tokens.into();

    while !queue.is_empty() {
        merge_comma_name(&mut queue);

        let (real, mail) = match find_one_of(&queue, Special::LAng, Special::Comma) {
            Some((pos, Special::LAng)) => {
                let real: Vec<Token> = queue.drain(..pos).collect();
                queue.pop_front();
                let end = find_one_of(&queue, Special::RAng, Special::Comma)
                    .map_or(queue.len(), |(p, _)| p);
                let mail: Vec<Token> = queue.drain(..end).collect();
                queue.pop_front();
                if queue.front().is_some_and(|t| t.is(Special::Comma)) {
                    queue.pop_front();
                }
                ((!real.is_empty()).then_some(real), mail)
            }
            Some((pos, _)) => {
                let mail: Vec<Token> = queue.drain(..pos).collect();
                queue.pop_front();
                (None, mail)
            }
            None => (None, queue.drain(..).collect()),
        };

        if mail.is_empty() {
            continue;
        }
        addrs.push(Addr {
            mail: mail.iter().map(Token::quote).collect(),
            real: real.map(real_name),
        });
    }
    addrs
}

/// Joins `Text , Text <` into one display name.
fn merge_comma_name(queue: &mut VecDeque<Token>) {
    let shape = queue.len() >= 4
        && queue[0].is_text()
        && queue[1].is(Special::Comma)
        && queue[2].is_text()
        && queue[3].is(Special::LAng);
    if shape && NEEDS_QUOTE.is_match(&queue[0].text()) {
        let merged: Vec<Token> = queue.drain(..3).collect();
        let mut run = Vec::with_capacity(4);
        let mut parts = merged.into_iter();
        run.extend(parts.next());
        run.extend(parts.next());
        run.push(Token::Space);
        run.extend(parts.next());
        queue.push_front(Token::Text(run));
    }
}

fn find_one_of(queue: &VecDeque<Token>, first: Special, second: Special) -> Option<(usize, Special)> {
    queue.iter().enumerate().find_map(|(i, t)| {
        if t.is(first) {
            Some((i, first))
        } else if t.is(second) {
            Some((i, second))
        } else {
            None
        }
    })
}

/// An ordered list of addresses, as found in `To:` or `Cc:` fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddrList {
    list: Vec<Addr>,
}

impl AddrList {
    /// Creates an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self { list: Vec::new() }
    }

    /// Parses a header field value.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut list = Self::new();
        list.add_encoded(text);
        list
    }

    /// Appends an address.
    pub fn push(&mut self, addr: Addr) {
        self.list.push(addr);
    }

    /// Appends an address built from a mailbox and display name.
    pub fn add(&mut self, mail: &str, real: Option<&str>) -> &mut Self {
        self.list.push(Addr::create(mail, real));
        self
    }

    /// Appends the addresses of user-entered text.
    pub fn add_quoted(&mut self, text: &str) -> &mut Self {
        self.list
            .extend(Addr::parse_entered(text).into_iter().flat_map(|g| g.addrs));
        self
    }

    /// Appends the addresses of a header field value.
    pub fn add_encoded(&mut self, text: &str) -> &mut Self {
        self.list
            .extend(Addr::parse_groups(text).into_iter().flat_map(|g| g.addrs));
        self
    }

    /// Whether a mailbox is in the list (case-insensitive).
    #[must_use]
    pub fn has(&self, mail: &str) -> bool {
        let mail = mail.to_lowercase();
        self.list.iter().any(|a| a.plain() == mail)
    }

    /// Matches the plain mailboxes against a pattern; returns the capture
    /// groups of the first match.
    #[must_use]
    pub fn find_match(&self, pattern: &Regex) -> Option<Vec<Option<String>>> {
        self.list.iter().find_map(|a| {
            let plain = a.plain();
            pattern.captures(&plain).map(|caps| {
                caps.iter()
                    .skip(1)
                    .map(|m| m.map(|m| m.as_str().to_string()))
                    .collect()
            })
        })
    }

    /// Local parts of the addresses whose domain is one of `domains`.
    #[must_use]
    pub fn under_domain(&self, domains: &[&str]) -> Vec<String> {
        self.list
            .iter()
            .filter_map(|a| {
                let plain = a.plain();
                let (local, domain) = plain.rsplit_once('@')?;
                domains
                    .iter()
                    .any(|d| d.eq_ignore_ascii_case(domain))
                    .then(|| local.to_string())
            })
            .collect()
    }

    /// Iterates over the addresses.
    pub fn iter(&self) -> std::slice::Iter<'_, Addr> {
        self.list.iter()
    }

    /// Number of addresses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// The addresses with display names quoted where needed.
    #[must_use]
    pub fn quote(&self) -> String {
        self.list.iter().map(Addr::quote).collect::<Vec<_>>().join(", ")
    }

    /// Header wire words; each but the last ends with `,`.
    #[must_use]
    pub fn encode(&self) -> Vec<String> {
        let count = self.list.len();
        self.list
            .iter()
            .enumerate()
            .map(|(i, a)| {
                let word = a.encode();
                if i + 1 < count { format!("{word},") } else { word }
            })
            .collect()
    }
}

impl fmt::Display for AddrList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let texts: Vec<String> = self.list.iter().map(ToString::to_string).collect();
        f.write_str(&texts.join(", "))
    }
}

impl FromIterator<Addr> for AddrList {
    fn from_iter<I: IntoIterator<Item = Addr>>(iter: I) -> Self {
        Self {
            list: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for AddrList {
    type Item = Addr;
    type IntoIter = std::vec::IntoIter<Addr>;

    fn into_iter(self) -> Self::IntoIter {
        self.list.into_iter()
    }
}

impl<'a> IntoIterator for &'a AddrList {
    type Item = &'a Addr;
    type IntoIter = std::slice::Iter<'a, Addr>;

    fn into_iter(self) -> Self::IntoIter {
        self.list.iter()
    }
}

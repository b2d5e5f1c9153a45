//! Prefix resolution.

use crate::message::Message;
use async_trait::async_trait;

/// What a prefix hook returns for a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[derive(serde::Deserialize, serde::Serialize)]
#[serde(untagged)]
pub enum Prefix {
    /// No literal prefix; only the regex prefix can match.
    #[default]
    None,
    Single(String),
    /// Candidates, tried in order.
    Many(Vec<String>),
}

impl Prefix {
    /// Candidates in the order they are tried.
    pub fn candidates(&self) -> &[String] {
        match self {
            Self::None => &[],
            Self::Single(prefix) => std::slice::from_ref(prefix),
            Self::Many(prefixes) => prefixes,
        }
    }

    pub fn is_none(&self) -> bool {
        self.candidates().is_empty()
    }
}

impl From<&str> for Prefix {
    fn from(prefix: &str) -> Self {
        Self::Single(prefix.to_string())
    }
}

impl From<String> for Prefix {
    fn from(prefix: String) -> Self {
        Self::Single(prefix)
    }
}

impl From<Vec<String>> for Prefix {
    fn from(prefixes: Vec<String>) -> Self {
        Self::Many(prefixes)
    }
}

impl<const N: usize> From<[&str; N]> for Prefix {
    fn from(prefixes: [&str; N]) -> Self {
        Self::Many(prefixes.iter().map(|p| p.to_string()).collect())
    }
}

/// Dynamic prefix lookup, e.g. per-chat prefixes kept in a database.
#[async_trait]
pub trait PrefixHook: Send + Sync {
    async fn fetch_prefix(&self, message: &Message) -> Prefix;
}

/// Hook that always answers with the same prefix.
#[derive(Debug, Clone, Default)]
pub struct StaticPrefix(pub Prefix);

#[async_trait]
impl PrefixHook for StaticPrefix {
    async fn fetch_prefix(&self, _message: &Message) -> Prefix {
        self.0.clone()
    }
}

/// Find the first candidate `body` starts with.
///
/// Returns the candidate, the slice of `body` it matched, and the text after
/// it. Empty candidates never match.
pub fn match_prefix<'a, 'c>(
    body: &'a str,
    candidates: &'c [String],
    case_insensitive: bool,
) -> Option<(&'c str, &'a str, &'a str)> {
    candidates
        .iter()
        .filter(|c| !c.is_empty())
        .find_map(|candidate| {
            strip_prefix(body, candidate, case_insensitive)
                .map(|(matched, rest)| (candidate.as_str(), matched, rest))
        })
}

/// `str::strip_prefix` with optional Unicode case folding.
///
/// On success returns `(matched, rest)` where `matched` is the slice of
/// `body` that matched. The body is folded one char at a time, so `matched`
/// always ends on a char boundary even when folding changes byte lengths.
pub fn strip_prefix<'a>(body: &'a str, prefix: &str, case_insensitive: bool) -> Option<(&'a str, &'a str)> {
    if !case_insensitive {
        return body
            .strip_prefix(prefix)
            .map(|rest| (&body[..prefix.len()], rest));
    }

    let target: String = prefix.chars().flat_map(char::to_lowercase).collect();
    let mut folded = String::with_capacity(target.len());
    let mut consumed = 0;
    for (index, ch) in body.char_indices() {
        if folded.len() >= target.len() {
            break;
        }
        folded.extend(ch.to_lowercase());
        consumed = index + ch.len_utf8();
    }
    (folded == target).then(|| (&body[..consumed], &body[consumed..]))
}

/// Split a command name off `text`.
///
/// Leading whitespace is skipped. Returns `(name, parameters)`; `parameters`
/// has its leading whitespace removed.
pub fn split_command(text: &str) -> Option<(&str, &str)> {
    let text = text.trim_start();
    if text.is_empty() {
        return None;
    }
    match text.find(char::is_whitespace) {
        Some(end) => Some((&text[..end], text[end..].trim_start())),
        None => Some((text, "")),
    }
}

//! Quote-aware tokenizer.
//!
//! The lexer splits raw parameter text on unquoted whitespace. A token that
//! starts with a configured quote-open delimiter runs until the matching close
//! delimiter and keeps its interior whitespace verbatim.

use smallvec::SmallVec;

/// Quote pairs enabled when a command does not configure its own.
///
/// ASCII double quotes, the "smart" quotes inserted by iOS keyboards, and CJK
/// corner brackets.
pub const DEFAULT_QUOTES: [(&str, &str); 3] = [("\"", "\""), ("“", "”"), ("「", "」")];

/// An open/close delimiter pair.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "(String, String)", into = "(String, String)"))]
pub struct QuotePair {
    /// Delimiter that opens a quoted token.
    pub open: String,
    /// Delimiter that closes it.
    pub close: String,
}

impl QuotePair {
    /// Create a new pair.
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }

    /// Whether both delimiters are non-empty.
    pub fn is_usable(&self) -> bool {
        !self.open.is_empty() && !self.close.is_empty()
    }
}

impl From<(String, String)> for QuotePair {
    fn from((open, close): (String, String)) -> Self {
        Self { open, close }
    }
}

impl From<(&str, &str)> for QuotePair {
    fn from((open, close): (&str, &str)) -> Self {
        Self::new(open, close)
    }
}

impl From<QuotePair> for (String, String) {
    fn from(pair: QuotePair) -> Self {
        (pair.open, pair.close)
    }
}

/// A single lexed token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Token text with quote delimiters removed.
    pub value: String,
    /// Token text exactly as it appeared in the input, delimiters included.
    pub raw: String,
    /// Whether the token was opened by a quote delimiter.
    pub quoted: bool,
}

impl Token {
    fn word(text: &str) -> Self {
        Self {
            value: text.to_string(),
            raw: text.to_string(),
            quoted: false,
        }
    }

    fn quoted(value: &str, raw: &str) -> Self {
        Self {
            value: value.to_string(),
            raw: raw.to_string(),
            quoted: true,
        }
    }
}

/// Tokenizer configured with a set of quote pairs.
#[derive(Debug, Clone)]
pub struct Lexer {
    quotes: SmallVec<[QuotePair; 3]>,
}

impl Default for Lexer {
    fn default() -> Self {
        Self::new()
    }
}

impl Lexer {
    /// Lexer using [`DEFAULT_QUOTES`].
    pub fn new() -> Self {
        Self::with_quotes(DEFAULT_QUOTES.iter().map(|&pair| QuotePair::from(pair)))
    }

    /// Lexer using exactly the given quote pairs.
    ///
    /// Pairs with an empty delimiter are ignored. Pass an empty iterator to
    /// disable quoting entirely.
    pub fn with_quotes<I, Q>(quotes: I) -> Self
    where
        I: IntoIterator<Item = Q>,
        Q: Into<QuotePair>,
    {
        Self {
            quotes: quotes
                .into_iter()
                .map(Into::into)
                .filter(QuotePair::is_usable)
                .collect(),
        }
    }

    /// The active quote pairs, in priority order.
    pub fn quotes(&self) -> &[QuotePair] {
        &self.quotes
    }

    /// Split `input` into tokens.
    ///
    /// Never fails: an unterminated quote consumes the rest of the input.
    ///
    /// ```
    /// use jinsoul_args::Lexer;
    ///
    /// let tokens = Lexer::new().lex(r#"a "b c" 「d e」"#);
    /// let values: Vec<_> = tokens.iter().map(|t| t.value.as_str()).collect();
    /// assert_eq!(values, ["a", "b c", "d e"]);
    /// ```
    pub fn lex(&self, input: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut rest = input;

        loop {
            rest = rest.trim_start();
            if rest.is_empty() {
                break;
            }

            if let Some(pair) = self.quotes.iter().find(|q| rest.starts_with(q.open.as_str())) {
                let body = &rest[pair.open.len()..];
                match body.find(pair.close.as_str()) {
                    Some(end) => {
                        let consumed = pair.open.len() + end + pair.close.len();
                        tokens.push(Token::quoted(&body[..end], &rest[..consumed]));
                        rest = &rest[consumed..];
                    }
                    None => {
                        tokens.push(Token::quoted(body, rest));
                        rest = "";
                    }
                }
                continue;
            }

            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            tokens.push(Token::word(&rest[..end]));
            rest = &rest[end..];
        }

        tokens
    }
}

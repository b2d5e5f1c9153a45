//! Classified parser output.

use crate::lexer::{Lexer, Token};
use crate::strategy::{FlagMatch, FlagStrategy};
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};

/// Result of parsing a parameter string.
///
/// Immutable once produced; readers keep their own cursor over
/// [`ParsedArguments::tokens`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedArguments {
    tokens: Vec<Token>,
    positional: Vec<String>,
    flags: HashSet<String>,
    options: HashMap<String, SmallVec<[String; 1]>>,
}

impl ParsedArguments {
    /// Positional tokens in input order, quotes removed.
    pub fn positional(&self) -> &[String] {
        &self.positional
    }

    /// Positional tokens with lexer metadata.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Whether the flag was present.
    pub fn flag(&self, name: &str) -> bool {
        self.flags.contains(name)
    }

    /// All flags that were present.
    pub fn flags(&self) -> impl Iterator<Item = &str> {
        self.flags.iter().map(String::as_str)
    }

    /// Value of an option. When it was given several times the last one wins.
    pub fn option(&self, name: &str) -> Option<&str> {
        self.options.get(name).and_then(|v| v.last()).map(String::as_str)
    }

    /// Every value given for an option, in input order.
    pub fn option_values(&self, name: &str) -> &[String] {
        self.options.get(name).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Names of all options that were present.
    pub fn option_names(&self) -> impl Iterator<Item = &str> {
        self.options.keys().map(String::as_str)
    }

    /// Whether nothing at all was parsed.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty() && self.flags.is_empty() && self.options.is_empty()
    }
}

/// Classify lexed tokens with `strategy`.
///
/// Quoted tokens are always positional, so `"--not-a-flag"` can be passed
/// literally.
pub fn classify(tokens: Vec<Token>, strategy: &FlagStrategy) -> ParsedArguments {
    let mut parsed = ParsedArguments::default();

    for token in tokens {
        let shape = if token.quoted {
            FlagMatch::Positional
        } else {
            strategy.classify(&token.value)
        };

        match shape {
            FlagMatch::Flag(name) => {
                parsed.flags.insert(name.to_string());
            }
            FlagMatch::Option(name, value) => {
                parsed
                    .options
                    .entry(name.to_string())
                    .or_default()
                    .push(value.to_string());
            }
            FlagMatch::Positional => {
                parsed.positional.push(token.value.clone());
                parsed.tokens.push(token);
            }
        }
    }

    parsed
}

/// Lex and classify `raw` in one step.
pub fn parse(raw: &str, lexer: &Lexer, strategy: &FlagStrategy) -> ParsedArguments {
    classify(lexer.lex(raw), strategy)
}

/// A lexer and strategy bundled together, as owned by a command.
#[derive(Debug, Clone, Default)]
pub struct ArgumentParser {
    lexer: Lexer,
    strategy: FlagStrategy,
}

impl ArgumentParser {
    /// Bundle a lexer with a strategy.
    pub fn new(lexer: Lexer, strategy: FlagStrategy) -> Self {
        Self { lexer, strategy }
    }

    /// The lexer in use.
    pub fn lexer(&self) -> &Lexer {
        &self.lexer
    }

    /// The flag strategy in use.
    pub fn strategy(&self) -> &FlagStrategy {
        &self.strategy
    }

    /// Parse a raw parameter string.
    pub fn parse(&self, raw: &str) -> ParsedArguments {
        parse(raw, &self.lexer, &self.strategy)
    }
}

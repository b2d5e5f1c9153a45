//! # jinsoul-args
//!
//! Argument lexing and parsing for chat bot commands.
//!
//! The crate turns the raw parameter text that follows a command name into
//! [`ParsedArguments`]: positional tokens in their original order, a set of
//! boolean flags, and a map of key/value options.
//!
//! ## Features
//!
//! - Quote-aware tokenizing with any number of simultaneously configured
//!   open/close pairs (ASCII double quotes, iOS "smart" quotes and CJK corner
//!   brackets by default)
//! - Permissive input handling: an unterminated quote runs to the end of the
//!   input instead of failing
//! - Unordered flag strategy: flags and options may be interleaved with
//!   positional tokens and are classified by shape alone
//! - Optional `serde` support for configuration-facing types
//!
//! ## Quick Start
//!
//! ```rust
//! use jinsoul_args::{ArgumentParser, FlagStrategy, Lexer};
//!
//! let parser = ArgumentParser::new(Lexer::new(), FlagStrategy::default());
//! let parsed = parser.parse(r#"say "hello world" --loud --times=3"#);
//!
//! assert_eq!(parsed.positional(), ["say", "hello world"]);
//! assert!(parsed.flag("loud"));
//! assert_eq!(parsed.option("times"), Some("3"));
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod lexer;
pub mod parsed;
pub mod strategy;

pub use lexer::{Lexer, QuotePair, Token, DEFAULT_QUOTES};
pub use parsed::{parse, ArgumentParser, ParsedArguments};
pub use strategy::{Allow, FlagMatch, FlagStrategy};

//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("client.regex_prefix is not a valid pattern: {0}")]
    InvalidRegexPrefix(String),
    #[error("client.default_prefix contains an empty prefix")]
    EmptyPrefix,
    #[error("commands.{0}.quotes contains an empty delimiter")]
    EmptyQuoteDelimiter(String),
    #[error("commands.{0}.flag_prefixes contains an empty prefix")]
    EmptyFlagPrefix(String),
    #[error("commands.{0}.option_separators contains an empty separator")]
    EmptyOptionSeparator(String),
    #[error("commands.{0}.run_in must not be empty")]
    EmptyRunIn(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Some(pattern) = &config.client.regex_prefix
        && let Err(e) = regex::Regex::new(pattern)
    {
        errors.push(ValidationError::InvalidRegexPrefix(e.to_string()));
    }
    if config.client.default_prefix.candidates().iter().any(String::is_empty) {
        errors.push(ValidationError::EmptyPrefix);
    }

    let mut names: Vec<&String> = config.commands.keys().collect();
    names.sort();
    for name in names {
        let overrides = &config.commands[name];
        if let Some(quotes) = &overrides.quotes
            && quotes.iter().any(|q| q.open.is_empty() || q.close.is_empty())
        {
            errors.push(ValidationError::EmptyQuoteDelimiter(name.clone()));
        }
        if let Some(prefixes) = &overrides.flag_prefixes
            && prefixes.iter().any(String::is_empty)
        {
            errors.push(ValidationError::EmptyFlagPrefix(name.clone()));
        }
        if let Some(separators) = &overrides.option_separators
            && separators.iter().any(String::is_empty)
        {
            errors.push(ValidationError::EmptyOptionSeparator(name.clone()));
        }
        if overrides.run_in.as_ref().is_some_and(Vec::is_empty) {
            errors.push(ValidationError::EmptyRunIn(name.clone()));
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

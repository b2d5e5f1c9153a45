//! Core configuration types and loading.

use crate::commands::CommandOptions;
use crate::dispatch::{PipelineOptions, Prefix};
use crate::message::ChatKind;
use jinsoul_args::QuotePair;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid client.regex_prefix: {0}")]
    Regex(#[from] regex::Error),
}

/// Bot configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Prefix and matching behavior.
    #[serde(default)]
    pub client: ClientConfig,
    /// Per-command overrides keyed by command name.
    #[serde(default)]
    pub commands: HashMap<String, CommandOverrides>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Overrides for `name`, matched case-insensitively.
    pub fn overrides_for(&self, name: &str) -> Option<&CommandOverrides> {
        self.commands
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, overrides)| overrides)
    }
}

/// `[client]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientConfig {
    /// A string or a list of strings; used when no prefix hook is installed.
    #[serde(default)]
    pub default_prefix: Prefix,
    /// Pattern checked before the literal prefixes.
    pub regex_prefix: Option<String>,
    #[serde(default)]
    pub case_insensitive_commands: bool,
    #[serde(default)]
    pub case_insensitive_prefixes: bool,
    /// Show a typing indicator while commands run. Commands may opt out.
    #[serde(default)]
    pub typing: bool,
}

impl ClientConfig {
    /// Compile into pipeline options.
    pub fn pipeline_options(&self) -> Result<PipelineOptions, ConfigError> {
        let regex_prefix = self.regex_prefix.as_deref().map(Regex::new).transpose()?;
        Ok(PipelineOptions {
            regex_prefix,
            case_insensitive_commands: self.case_insensitive_commands,
            case_insensitive_prefixes: self.case_insensitive_prefixes,
        })
    }
}

/// `[commands.<name>]` section. Unset fields keep the command's own value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommandOverrides {
    pub typing: Option<bool>,
    pub enabled: Option<bool>,
    pub quotes: Option<Vec<QuotePair>>,
    pub run_in: Option<Vec<ChatKind>>,
    pub flag_prefixes: Option<Vec<String>>,
    pub option_separators: Option<Vec<String>>,
}

impl CommandOverrides {
    /// Apply onto command options.
    pub fn apply(&self, mut options: CommandOptions) -> CommandOptions {
        if let Some(typing) = self.typing {
            options.typing = typing;
        }
        if let Some(enabled) = self.enabled {
            options.enabled = enabled;
        }
        if let Some(quotes) = &self.quotes {
            options.quotes = Some(quotes.clone());
        }
        if let Some(run_in) = &self.run_in {
            options.run_in = Some(run_in.clone());
        }
        if let Some(prefixes) = &self.flag_prefixes {
            options.flags = options.flags.with_prefixes(prefixes.iter().cloned());
        }
        if let Some(separators) = &self.option_separators {
            options.flags = options.flags.with_separators(separators.iter().cloned());
        }
        options
    }
}

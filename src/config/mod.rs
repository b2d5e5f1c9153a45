//! Configuration loading and management.
//!
//! - [`types`]: config structs and loading (Config, ClientConfig, CommandOverrides)
//! - [`defaults`]: default values
//! - [`validation`]: startup validation, collecting every error

mod defaults;
mod types;
mod validation;

pub use defaults::DEFAULT_CONFIG_PATH;
pub use types::{ClientConfig, CommandOverrides, Config, ConfigError};
pub use validation::{ValidationError, validate};

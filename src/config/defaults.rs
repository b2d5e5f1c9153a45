//! Configuration defaults.

/// Config file read by the binary when no path is given.
pub const DEFAULT_CONFIG_PATH: &str = "jinsoul.toml";

//! Unordered flag strategy.
//!
//! Classifies tokens by shape only: where a token sits in the input never
//! affects whether it becomes a flag, an option, or a positional argument.

/// Which names a strategy accepts as flags or options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "AllowRepr", into = "AllowRepr"))]
pub enum Allow {
    /// Every name is accepted.
    #[default]
    All,
    /// Only the listed names are accepted.
    Only(Vec<String>),
    /// Nothing is accepted; matching tokens stay positional.
    Nothing,
}

impl Allow {
    /// Whether `name` is accepted.
    pub fn permits(&self, name: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(names) => names.iter().any(|n| n == name),
            Self::Nothing => false,
        }
    }
}

/// Configuration shape of [`Allow`]: `true`, `false`, or a list of names.
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
enum AllowRepr {
    Switch(bool),
    Names(Vec<String>),
}

#[cfg(feature = "serde")]
impl From<AllowRepr> for Allow {
    fn from(repr: AllowRepr) -> Self {
        match repr {
            AllowRepr::Switch(true) => Self::All,
            AllowRepr::Switch(false) => Self::Nothing,
            AllowRepr::Names(names) => Self::Only(names),
        }
    }
}

#[cfg(feature = "serde")]
impl From<Allow> for AllowRepr {
    fn from(allow: Allow) -> Self {
        match allow {
            Allow::All => Self::Switch(true),
            Allow::Nothing => Self::Switch(false),
            Allow::Only(names) => Self::Names(names),
        }
    }
}

/// Result of classifying one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagMatch<'a> {
    /// A boolean switch, e.g. `--loud`.
    Flag(&'a str),
    /// A key/value pair, e.g. `--times=3`.
    Option(&'a str, &'a str),
    /// Anything else.
    Positional,
}

/// Prefixes, separators and allow-lists used to recognise flags and options.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FlagStrategy {
    /// Markers that start a flag or option. Longer markers are tried first.
    pub prefixes: Vec<String>,
    /// Separators splitting an option name from its value.
    pub separators: Vec<String>,
    /// Accepted flag names.
    pub flags: Allow,
    /// Accepted option names.
    pub options: Allow,
}

impl Default for FlagStrategy {
    /// `--` and `—` (the dash iOS substitutes for `--`) as prefixes, `=` as separator,
    /// every flag and option name accepted.
    fn default() -> Self {
        Self {
            prefixes: vec!["--".to_string(), "—".to_string()],
            separators: vec!["=".to_string()],
            flags: Allow::All,
            options: Allow::All,
        }
    }
}

impl FlagStrategy {
    /// Replace the prefixes.
    pub fn with_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the separators.
    pub fn with_separators<I, S>(mut self, separators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.separators = separators.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict accepted flag names.
    pub fn with_flags(mut self, flags: Allow) -> Self {
        self.flags = flags;
        self
    }

    /// Restrict accepted option names.
    pub fn with_options(mut self, options: Allow) -> Self {
        self.options = options;
        self
    }

    /// Classify a token value.
    ///
    /// ```
    /// use jinsoul_args::{FlagMatch, FlagStrategy};
    ///
    /// let strategy = FlagStrategy::default();
    /// assert_eq!(strategy.classify("--loud"), FlagMatch::Flag("loud"));
    /// assert_eq!(strategy.classify("--n=3"), FlagMatch::Option("n", "3"));
    /// assert_eq!(strategy.classify("-5"), FlagMatch::Positional);
    /// ```
    pub fn classify<'a>(&self, value: &'a str) -> FlagMatch<'a> {
        let Some(body) = self.strip_prefix(value) else {
            return FlagMatch::Positional;
        };

        if let Some((name, rest)) = self.split_option(body) {
            return if !name.is_empty() && self.options.permits(name) {
                FlagMatch::Option(name, rest)
            } else {
                FlagMatch::Positional
            };
        }

        if self.flags.permits(body) {
            FlagMatch::Flag(body)
        } else {
            FlagMatch::Positional
        }
    }

    fn strip_prefix<'a>(&self, value: &'a str) -> Option<&'a str> {
        self.prefixes
            .iter()
            .filter(|p| !p.is_empty())
            .filter_map(|p| value.strip_prefix(p.as_str()).map(|body| (p.len(), body)))
            .max_by_key(|(len, _)| *len)
            .map(|(_, body)| body)
            .filter(|body| !body.is_empty())
    }

    fn split_option<'a>(&self, body: &'a str) -> Option<(&'a str, &'a str)> {
        self.separators
            .iter()
            .filter(|s| !s.is_empty())
            .filter_map(|s| body.find(s.as_str()).map(|at| (at, s.len())))
            .min_by_key(|(at, _)| *at)
            .map(|(at, len)| (&body[..at], &body[at + len..]))
    }
}

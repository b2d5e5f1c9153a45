//! Commands and the command registry.
//!
//! A [`Command`] bundles identity (name, aliases), authorization (its
//! precondition container), argument parsing settings (quotes, flag
//! strategy) and the [`CommandHandler`] that implements its body. Commands
//! are built once at load time; afterwards only the precondition container
//! may change, and only by explicit append.

pub mod context;
pub mod misc;
pub mod registry;

pub use context::{Context, MatchedPrefix, RunContext};
pub use registry::CommandStore;

use crate::args::{Args, ArgumentStore};
use crate::error::{CommandError, RegistryError};
use crate::message::{ChatKind, Message};
use crate::preconditions::builtin::{GROUP_ONLY, PRIVATE_ONLY};
use crate::preconditions::{PreconditionContainer, PreconditionEntry};
use async_trait::async_trait;
use jinsoul_args::{ArgumentParser, FlagStrategy, Lexer, QuotePair};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Value returned by a successful command body.
pub type CommandOutput = serde_json::Value;

/// Result type for command bodies.
pub type CommandResult = Result<CommandOutput, CommandError>;

/// The body of a command.
///
/// # Example
///
/// ```ignore
/// pub struct PingCommand;
///
/// #[async_trait]
/// impl CommandHandler for PingCommand {
///     async fn message_run(&self, ctx: &Context<'_>, _args: &mut Args) -> CommandResult {
///         ctx.reply("Pong!").await?;
///         Ok(CommandOutput::Null)
///     }
/// }
/// ```
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Execute the command for a message.
    async fn message_run(&self, ctx: &Context<'_>, args: &mut Args) -> CommandResult;
}

/// Construction options for a [`Command`].
#[derive(Debug, Clone)]
pub struct CommandOptions {
    pub name: String,
    pub aliases: Vec<String>,
    pub description: String,
    pub detailed_description: String,
    /// Category path, e.g. `["General", "About"]`.
    pub full_category: Vec<String>,
    pub preconditions: Vec<PreconditionEntry>,
    /// Chat kinds the command may run in. `None` places no restriction.
    pub run_in: Option<Vec<ChatKind>>,
    /// Show the typing indicator while running (when enabled globally).
    pub typing: bool,
    /// Quote pairs for the lexer. `None` uses the defaults.
    pub quotes: Option<Vec<QuotePair>>,
    pub flags: FlagStrategy,
    /// Also register `foo-bar` as `foobar`.
    pub generate_dash_less_aliases: bool,
    pub enabled: bool,
}

impl CommandOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            description: String::new(),
            detailed_description: String::new(),
            full_category: Vec::new(),
            preconditions: Vec::new(),
            run_in: None,
            typing: true,
            quotes: None,
            flags: FlagStrategy::default(),
            generate_dash_less_aliases: false,
            enabled: true,
        }
    }

    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn detailed_description(mut self, text: impl Into<String>) -> Self {
        self.detailed_description = text.into();
        self
    }

    pub fn category<I, S>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.full_category = path.into_iter().map(Into::into).collect();
        self
    }

    pub fn precondition(mut self, entry: impl Into<PreconditionEntry>) -> Self {
        self.preconditions.push(entry.into());
        self
    }

    pub fn run_in<I: IntoIterator<Item = ChatKind>>(mut self, kinds: I) -> Self {
        self.run_in = Some(kinds.into_iter().collect());
        self
    }

    pub fn typing(mut self, typing: bool) -> Self {
        self.typing = typing;
        self
    }

    pub fn quotes<I, Q>(mut self, quotes: I) -> Self
    where
        I: IntoIterator<Item = Q>,
        Q: Into<QuotePair>,
    {
        self.quotes = Some(quotes.into_iter().map(Into::into).collect());
        self
    }

    pub fn flags(mut self, strategy: FlagStrategy) -> Self {
        self.flags = strategy;
        self
    }

    pub fn dash_less_aliases(mut self) -> Self {
        self.generate_dash_less_aliases = true;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// A registered command.
pub struct Command {
    name: String,
    aliases: Vec<String>,
    description: String,
    detailed_description: String,
    full_category: Vec<String>,
    preconditions: RwLock<PreconditionContainer>,
    typing: bool,
    enabled: AtomicBool,
    parser: ArgumentParser,
    handler: Arc<dyn CommandHandler>,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("full_category", &self.full_category)
            .field("typing", &self.typing)
            .field("enabled", &self.is_enabled())
            .finish_non_exhaustive()
    }
}

impl Command {
    /// Build a command. The name and aliases are lower-cased; `run_in` is
    /// compiled into precondition entries.
    pub fn new<H: CommandHandler + 'static>(options: CommandOptions, handler: H) -> Result<Self, RegistryError> {
        Self::with_handler(options, Arc::new(handler))
    }

    pub fn with_handler(options: CommandOptions, handler: Arc<dyn CommandHandler>) -> Result<Self, RegistryError> {
        let name = options.name.trim().to_lowercase();
        if name.is_empty() {
            return Err(RegistryError::EmptyName(options.name));
        }

        let mut aliases: Vec<String> = Vec::new();
        for alias in options.aliases.iter().map(|a| a.trim().to_lowercase()) {
            if !alias.is_empty() && alias != name && !aliases.contains(&alias) {
                aliases.push(alias);
            }
        }
        if options.generate_dash_less_aliases {
            let dash_less: Vec<String> = std::iter::once(&name)
                .chain(aliases.iter())
                .filter(|a| a.contains('-'))
                .map(|a| a.replace('-', ""))
                .collect();
            for alias in dash_less {
                if !alias.is_empty() && alias != name && !aliases.contains(&alias) {
                    aliases.push(alias);
                }
            }
        }

        let mut preconditions = PreconditionContainer::from_entries(options.preconditions);
        if let Some(entry) = run_in_entry(&name, options.run_in.as_deref())? {
            preconditions.append(entry);
        }

        let lexer = match options.quotes {
            Some(quotes) => Lexer::with_quotes(quotes),
            None => Lexer::new(),
        };

        Ok(Self {
            name,
            aliases,
            description: options.description,
            detailed_description: options.detailed_description,
            full_category: options.full_category,
            preconditions: RwLock::new(preconditions),
            typing: options.typing,
            enabled: AtomicBool::new(options.enabled),
            parser: ArgumentParser::new(lexer, options.flags),
            handler,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn detailed_description(&self) -> &str {
        &self.detailed_description
    }

    pub fn full_category(&self) -> &[String] {
        &self.full_category
    }

    /// First element of the category path.
    pub fn category(&self) -> Option<&str> {
        self.full_category.first().map(String::as_str)
    }

    /// Second element of the category path.
    pub fn sub_category(&self) -> Option<&str> {
        self.full_category.get(1).map(String::as_str)
    }

    /// Last element of the category path, when the path has at least two elements.
    pub fn parent_category(&self) -> Option<&str> {
        match self.full_category.as_slice() {
            [_, .., last] => Some(last.as_str()),
            _ => None,
        }
    }

    /// Whether this command wants the typing indicator.
    pub fn typing(&self) -> bool {
        self.typing
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    /// Snapshot of the command's own precondition container.
    pub fn preconditions(&self) -> PreconditionContainer {
        self.preconditions.read().clone()
    }

    /// Append an entry to the command's own precondition container.
    pub fn append_precondition(&self, entry: impl Into<PreconditionEntry>) {
        self.preconditions.write().append(entry.into());
    }

    /// The parser configured for this command.
    pub fn parser(&self) -> &ArgumentParser {
        &self.parser
    }

    /// Lex and parse `parameters`, and bind a reader to the result.
    pub fn pre_parse(&self, message: Arc<Message>, parameters: &str, resolvers: Arc<ArgumentStore>) -> Args {
        let parsed = Arc::new(self.parser.parse(parameters));
        Args::new(message, self.name.clone(), parsed, resolvers)
    }

    /// Run the command body.
    pub async fn run(&self, ctx: &Context<'_>, args: &mut Args) -> CommandResult {
        self.handler.message_run(ctx, args).await
    }
}

/// Compile a `run_in` restriction into a precondition entry.
fn run_in_entry(name: &str, run_in: Option<&[ChatKind]>) -> Result<Option<PreconditionEntry>, RegistryError> {
    let Some(kinds) = run_in else {
        return Ok(None);
    };
    if kinds.is_empty() {
        return Err(RegistryError::EmptyRunIn(name.to_string()));
    }

    let kinds: HashSet<ChatKind> = kinds.iter().copied().collect();
    let entry = match (kinds.contains(&ChatKind::Group), kinds.contains(&ChatKind::Private)) {
        (true, true) => None,
        (true, false) => Some(PreconditionEntry::from(GROUP_ONLY)),
        (false, true) => Some(PreconditionEntry::from(PRIVATE_ONLY)),
        (false, false) => None,
    };
    Ok(entry)
}

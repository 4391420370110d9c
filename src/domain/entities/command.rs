use std::collections::BTreeMap;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::application::services::SubscriptionTable;
use crate::domain::entities::InboundMessage;
use crate::domain::traits::Controller;

/// Everything a command handler may touch while answering one message
#[derive(Clone)]
pub struct CommandContext {
    pub controller: Arc<dyn Controller>,
    pub subscriptions: Arc<SubscriptionTable>,
    pub message: InboundMessage,
}

/// Command handler function type. Handlers always produce chat text.
pub type CommandHandler = Arc<dyn Fn(CommandContext) -> BoxFuture<'static, String> + Send + Sync>;

/// Represents a chat command
#[derive(Clone)]
pub struct Command {
    pub name: String,
    pub help: String,
    /// Verb pattern followed by the argument pattern
    pub pattern: String,
    /// Verb pattern followed by a space or end of text, used to detect
    /// malformed arguments
    pub suffix: String,
    pub handler: CommandHandler,
}

impl Command {
    pub fn new<F>(
        name: impl Into<String>,
        help: impl Into<String>,
        suffix: impl Into<String>,
        args: &str,
        handler: F,
    ) -> Self
    where
        F: Fn(CommandContext) -> BoxFuture<'static, String> + Send + Sync + 'static,
    {
        let verb = suffix.into();
        Self {
            name: name.into(),
            help: help.into(),
            pattern: format!("{}{}", verb, args),
            suffix: format!("{}(?: |$)", verb),
            handler: Arc::new(handler),
        }
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("pattern", &self.pattern)
            .field("suffix", &self.suffix)
            .finish()
    }
}

/// Command registry, keyed and iterated by command name
#[derive(Default)]
pub struct CommandRegistry {
    commands: BTreeMap<String, Command>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, command: Command) {
        self.commands.insert(command.name.clone(), command);
    }

    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.get(name)
    }

    pub fn all(&self) -> impl Iterator<Item = &Command> {
        self.commands.values()
    }

    /// `(name, help)` pairs sorted by name
    pub fn listing(&self) -> Vec<(String, String)> {
        self.commands
            .values()
            .map(|c| (c.name.clone(), c.help.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

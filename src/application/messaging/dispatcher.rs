//! Message dispatcher - Routes chat text to command handlers

use std::sync::Arc;

use crate::application::services::SubscriptionTable;
use crate::domain::entities::{CommandContext, CommandRegistry, InboundMessage};
use crate::domain::traits::Controller;
use super::handlers::{self, HELP_COMMAND};
use super::parser::match_command;

/// Routes every inbound message to exactly one reply.
///
/// The first command whose full pattern matches runs its handler. Failing
/// that, a command whose verb alone matches yields its usage text. Anything
/// else is answered by the help command.
pub struct Dispatcher {
    registry: CommandRegistry,
    controller: Arc<dyn Controller>,
    subscriptions: Arc<SubscriptionTable>,
}

impl Dispatcher {
    pub fn new(
        registry: CommandRegistry,
        controller: Arc<dyn Controller>,
        subscriptions: Arc<SubscriptionTable>,
    ) -> Self {
        Self {
            registry,
            controller,
            subscriptions,
        }
    }

    /// Dispatcher loaded with the default command set
    pub fn with_default_commands(
        controller: Arc<dyn Controller>,
        subscriptions: Arc<SubscriptionTable>,
    ) -> Self {
        Self::new(handlers::default_commands(), controller, subscriptions)
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Produce the reply for an already cleaned message
    pub async fn dispatch(&self, message: InboundMessage) -> String {
        let text = message.text.clone();

        if let Some(cmd) = self.registry.all().find(|c| match_command(&text, &c.pattern)) {
            tracing::info!("Running command {} for {}", cmd.name, message.sender_name);
            let handler = cmd.handler.clone();
            return handler(self.context(message)).await;
        }

        if let Some(cmd) = self.registry.all().find(|c| match_command(&text, &c.suffix)) {
            tracing::info!("Malformed arguments for {}: {:?}", cmd.name, text);
            return handlers::usage(&message.sender_name, cmd);
        }

        tracing::debug!("No command matched {:?}, answering with help", text);
        match self.registry.get(HELP_COMMAND) {
            Some(help) => {
                let handler = help.handler.clone();
                handler(self.context(message)).await
            }
            None => handlers::render_help(&message.sender_name, &self.registry.listing()),
        }
    }

    fn context(&self, message: InboundMessage) -> CommandContext {
        CommandContext {
            controller: self.controller.clone(),
            subscriptions: self.subscriptions.clone(),
            message,
        }
    }
}

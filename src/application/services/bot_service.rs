//! Bot service - Webhook registration and inbound message handling

use std::sync::Arc;

use tracing::Instrument;
use uuid::Uuid;

use crate::application::errors::BotError;
use crate::application::messaging::{clean_command, Dispatcher};
use crate::domain::entities::{InboundMessage, Person, Webhook};
use crate::domain::traits::Messenger;

/// Resource and event the bot listens to
const WEBHOOK_RESOURCE: &str = "messages";
const WEBHOOK_EVENT: &str = "created";

/// How a well-formed webhook delivery was handled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// A reply was produced for the room
    Replied,
    /// The bot wrote the message itself
    Ignored,
}

/// Glue between the messaging platform and the command dispatcher
pub struct BotService {
    messenger: Arc<dyn Messenger>,
    dispatcher: Dispatcher,
    identity: Person,
}

impl BotService {
    pub fn new(messenger: Arc<dyn Messenger>, dispatcher: Dispatcher, identity: Person) -> Self {
        Self {
            messenger,
            dispatcher,
            identity,
        }
    }

    /// Look up the bot identity and build the service around it
    pub async fn start(messenger: Arc<dyn Messenger>, dispatcher: Dispatcher) -> Result<Self, BotError> {
        let identity = messenger.bot_identity().await?;
        tracing::info!("Running as {} ({})", identity.display_name, identity.id);
        Ok(Self::new(messenger, dispatcher, identity))
    }

    pub fn identity(&self) -> &Person {
        &self.identity
    }

    pub fn messenger(&self) -> &Arc<dyn Messenger> {
        &self.messenger
    }

    /// Replace stale webhooks named after the bot with one pointing at
    /// `bot_url`
    pub async fn setup_webhook(&self, bot_url: &str) -> Result<Webhook, BotError> {
        let name = &self.identity.display_name;

        match self.messenger.webhooks().await {
            Ok(existing) => {
                for webhook in existing.iter().filter(|w| &w.name == name) {
                    tracing::info!("Deleting stale webhook {} ({})", webhook.id, webhook.target_url);
                    self.messenger.delete_webhook(&webhook.id).await?;
                }
            }
            Err(e) => tracing::warn!("Could not list existing webhooks: {}", e),
        }

        let target_url = format!("{}/webhook", bot_url.trim_end_matches('/'));
        let webhook = self
            .messenger
            .create_webhook(name, &target_url, WEBHOOK_RESOURCE, WEBHOOK_EVENT)
            .await?;
        tracing::info!("Webhook {} registered for {}", webhook.id, webhook.target_url);
        Ok(webhook)
    }

    /// Handle one raw webhook delivery
    pub async fn handle_webhook(&self, body: &[u8]) -> Result<WebhookOutcome, BotError> {
        let span = tracing::info_span!(
            "webhook",
            delivery = %Uuid::new_v4(),
            room = tracing::field::Empty
        );
        self.process(body).instrument(span).await
    }

    async fn process(&self, body: &[u8]) -> Result<WebhookOutcome, BotError> {
        let payload: Webhook = serde_json::from_slice(body)
            .map_err(|e| BotError::Parse(format!("webhook payload: {}", e)))?;
        let data = match payload.data {
            Some(data) if !payload.name.is_empty() => data,
            _ => return Err(BotError::Parse("webhook payload without name or data".into())),
        };

        let message = self.messenger.message(&data.id).await?;
        tracing::Span::current().record("room", message.room_id.as_str());

        if message.person_id == self.identity.id {
            tracing::debug!("Ignoring message {} sent by the bot", message.id);
            return Ok(WebhookOutcome::Ignored);
        }

        let sender = match self.messenger.person(&message.person_id).await {
            Ok(person) => person,
            Err(e) => {
                tracing::warn!("Could not resolve sender {}: {}", message.person_id, e);
                Person::default()
            }
        };

        let text = clean_command(&self.identity.display_name, &message.text);
        tracing::info!("Received {:?} from {}", text, sender.greeting_name());

        let inbound = InboundMessage::new(text, message.room_id.clone())
            .with_sender(message.person_id.clone(), sender.greeting_name());
        let reply = self.dispatcher.dispatch(inbound).await;

        if let Err(e) = self.messenger.send_message(&reply, &message.room_id).await {
            tracing::warn!("Could not send reply to room {}: {}", message.room_id, e);
        }
        Ok(WebhookOutcome::Replied)
    }
}

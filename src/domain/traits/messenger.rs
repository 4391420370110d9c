use async_trait::async_trait;

use crate::application::errors::MessengerError;
use crate::domain::entities::{ChatMessage, Person, Room, Webhook};

/// Messenger trait - abstraction for the messaging platform
#[async_trait]
pub trait Messenger: Send + Sync {
    /// The bot's own identity
    async fn bot_identity(&self) -> Result<Person, MessengerError>;

    async fn webhooks(&self) -> Result<Vec<Webhook>, MessengerError>;

    async fn create_webhook(
        &self,
        name: &str,
        target_url: &str,
        resource: &str,
        event: &str,
    ) -> Result<Webhook, MessengerError>;

    async fn delete_webhook(&self, id: &str) -> Result<(), MessengerError>;

    async fn message(&self, id: &str) -> Result<ChatMessage, MessengerError>;

    async fn person(&self, id: &str) -> Result<Person, MessengerError>;

    async fn room(&self, id: &str) -> Result<Room, MessengerError>;

    /// Send a message to a room, returning the new message id
    async fn send_message(&self, text: &str, room_id: &str) -> Result<String, MessengerError>;
}

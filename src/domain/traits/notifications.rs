use async_trait::async_trait;

use crate::application::errors::TransportError;
use crate::domain::entities::ChangeEvent;

/// Stream of change events pushed by the controller
#[async_trait]
pub trait NotificationSource: Send + Sync {
    /// (Re)establish the connection with a fresh session token
    async fn connect(&self, token: &str) -> Result<(), TransportError>;

    /// Wait for the next decoded batch
    async fn next_batch(&self) -> Result<Vec<ChangeEvent>, TransportError>;
}

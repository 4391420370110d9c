//! Webex adapter

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::application::errors::MessengerError;
use crate::domain::entities::{ChatMessage, Person, Room, Webhook};
use crate::domain::traits::Messenger;

/// Webex API base URL
pub const API_BASE: &str = "https://webexapis.com";

#[derive(Debug, Deserialize)]
struct Items<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewWebhook<'a> {
    name: &'a str,
    target_url: &'a str,
    resource: &'a str,
    event: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewMessage<'a> {
    room_id: &'a str,
    markdown: &'a str,
}

#[derive(Debug, Deserialize)]
struct Created {
    #[serde(default)]
    id: String,
}

/// Webex REST client authenticated with a bot token
pub struct WebexClient {
    token: String,
    client: Client,
    base_url: String,
}

impl WebexClient {
    pub fn new(token: impl Into<String>, timeout: Duration) -> Result<Self, MessengerError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            token: token.into(),
            client,
            base_url: API_BASE.to_string(),
        })
    }

    /// Point the client at another API host
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
    }

    async fn check(response: Response) -> Result<Response, MessengerError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(MessengerError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, MessengerError> {
        let response = self.request(reqwest::Method::GET, path).send().await?;
        let response = Self::check(response).await?;
        response
            .json()
            .await
            .map_err(|e| MessengerError::Parse(format!("{}: {}", path, e)))
    }
}

#[async_trait]
impl Messenger for WebexClient {
    async fn bot_identity(&self) -> Result<Person, MessengerError> {
        self.get_json("/v1/people/me").await
    }

    async fn webhooks(&self) -> Result<Vec<Webhook>, MessengerError> {
        let list: Items<Webhook> = self.get_json("/v1/webhooks").await?;
        Ok(list.items)
    }

    async fn create_webhook(
        &self,
        name: &str,
        target_url: &str,
        resource: &str,
        event: &str,
    ) -> Result<Webhook, MessengerError> {
        let body = NewWebhook {
            name,
            target_url,
            resource,
            event,
        };
        let response = self
            .request(reqwest::Method::POST, "/v1/webhooks")
            .json(&body)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn delete_webhook(&self, id: &str) -> Result<(), MessengerError> {
        let response = self
            .request(reqwest::Method::DELETE, &format!("/v1/webhooks/{}", id))
            .send()
            .await?;
        Self::check(response).await?;
        tracing::debug!("Deleted webhook {}", id);
        Ok(())
    }

    async fn message(&self, id: &str) -> Result<ChatMessage, MessengerError> {
        self.get_json(&format!("/v1/messages/{}", id)).await
    }

    async fn person(&self, id: &str) -> Result<Person, MessengerError> {
        self.get_json(&format!("/v1/people/{}", id)).await
    }

    async fn room(&self, id: &str) -> Result<Room, MessengerError> {
        self.get_json(&format!("/v1/rooms/{}", id)).await
    }

    async fn send_message(&self, text: &str, room_id: &str) -> Result<String, MessengerError> {
        let body = NewMessage {
            room_id,
            markdown: text,
        };
        let response = self
            .request(reqwest::Method::POST, "/v1/messages")
            .json(&body)
            .send()
            .await?;
        let created: Created = Self::check(response).await?.json().await?;
        tracing::debug!("Sent message {} to room {}", created.id, room_id);
        Ok(created.id)
    }
}

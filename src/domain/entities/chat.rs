//! Messaging platform records

use serde::{Deserialize, Serialize};

/// A person (or bot) known to the messaging platform
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Person {
    pub id: String,
    pub emails: Vec<String>,
    pub display_name: String,
    pub nick_name: String,
    pub first_name: String,
    pub last_name: String,
    pub user_name: String,
}

impl Person {
    /// Name used to greet the person in replies
    pub fn greeting_name(&self) -> &str {
        if self.nick_name.is_empty() {
            &self.display_name
        } else {
            &self.nick_name
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Room {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub room_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatMessage {
    pub id: String,
    pub room_id: String,
    pub text: String,
    pub person_id: String,
    pub person_email: String,
}

/// A registered webhook, also the shape of a webhook delivery
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Webhook {
    pub id: String,
    pub name: String,
    pub target_url: String,
    pub resource: String,
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<WebhookData>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WebhookData {
    pub id: String,
    pub room_id: String,
    pub person_id: String,
}

//! Application services - Business logic orchestration

pub mod bot_service;
pub mod refresh;
pub mod relay;
pub mod subscriptions;

pub use bot_service::{BotService, WebhookOutcome};
pub use refresh::RefreshLoop;
pub use relay::NotificationRelay;
pub use subscriptions::{AddOutcome, SubscriptionTable};

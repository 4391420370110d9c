//! Domain entities - Core business objects

pub mod chat;
pub mod command;
pub mod fabric;
pub mod message;
pub mod subscription;

pub use chat::{ChatMessage, Person, Room, Webhook, WebhookData};
pub use command::{Command, CommandContext, CommandHandler, CommandRegistry};
pub use fabric::{
    EndpointInfo, FabricNode, FabricSummary, MoAttributes, NeighborMap, PathLocation, Pod,
    ProcessEntity,
};
pub use message::InboundMessage;
pub use subscription::{ChangeEvent, Subscription};

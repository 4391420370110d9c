//! Domain layer - Core business objects and collaborator seams
//!
//! This layer contains:
//! - Entities: Commands, inbound messages, subscriptions, fabric and chat records
//! - Traits: Abstractions for the controller, messaging platform and push transport

pub mod entities;
pub mod traits;

//! Infrastructure layer - External concerns
//! 
//! This layer contains:
//! - Config: Configuration loading
//! - Apic: Fabric controller REST client and push-notification websocket
//! - Webex: Messaging platform client
//! - Http: Webhook receiver

pub mod apic;
pub mod config;
pub mod http;
pub mod webex;

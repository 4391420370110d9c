//! APIC controller integration - REST queries and the push-notification websocket

pub mod client;
pub mod mo;
pub mod websocket;

pub use client::ApicClient;
pub use mo::ManagedObject;
pub use websocket::ApicWebSocket;

//! Domain traits - Abstractions for infrastructure implementations

pub mod controller;
pub mod messenger;
pub mod notifications;

pub use controller::{Controller, ALL_NODES};
pub use messenger::Messenger;
pub use notifications::NotificationSource;

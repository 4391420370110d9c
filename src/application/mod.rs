//! Application layer - Use cases and business logic
//! 
//! This layer contains:
//! - Services: Webhook handling, subscription bookkeeping, background loops
//! - Errors: Domain-specific errors
//! - Messaging: Message parsing, command handlers, dispatching

pub mod errors;
pub mod services;
pub mod messaging;

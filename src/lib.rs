//! Chat-operated inspection console for an ACI fabric controller.
//!
//! Webex delivers chat messages through a webhook, commands are matched and
//! answered from read-only APIC queries, and class subscriptions relay APIC
//! change events back to the rooms that asked for them.

pub mod application;
pub mod domain;
pub mod infrastructure;

#[cfg(test)]
mod testing;

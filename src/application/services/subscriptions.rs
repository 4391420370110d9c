//! In-memory table of live controller subscriptions

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::entities::Subscription;

/// Result of [`SubscriptionTable::add`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// Room added; carries the subscription id held for the class
    Added(String),
    AlreadySubscribed,
}

/// Maps controller classes to their subscription id and interested rooms.
///
/// Every class present has at least one room. All access goes through the
/// internal lock, so readers never observe an entry mid-update.
#[derive(Debug, Default)]
pub struct SubscriptionTable {
    entries: RwLock<HashMap<String, Subscription>>,
}

impl SubscriptionTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Subscription>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Subscription>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Add `room_id` to `class` under a single write lock, creating the entry
    /// on first use. An existing entry keeps its own subscription id.
    pub fn add(&self, class: &str, subscription_id: &str, room_id: &str) -> AddOutcome {
        let mut entries = self.write();
        match entries.get_mut(class) {
            Some(entry) if entry.has_room(room_id) => AddOutcome::AlreadySubscribed,
            Some(entry) => {
                tracing::debug!("Adding room {} to existing class {}", room_id, class);
                entry.rooms.push(room_id.to_string());
                AddOutcome::Added(entry.subscription_id.clone())
            }
            None => {
                tracing::debug!("New subscription entry for class {}", class);
                entries.insert(
                    class.to_string(),
                    Subscription::new(class, subscription_id, room_id),
                );
                AddOutcome::Added(subscription_id.to_string())
            }
        }
    }

    /// Remove `room_id` from `class`, dropping the class once no room is left
    pub fn remove(&self, class: &str, room_id: &str) {
        let mut entries = self.write();
        let Some(entry) = entries.get_mut(class) else {
            return;
        };
        entry.rooms.retain(|r| r != room_id);
        if entry.rooms.is_empty() {
            tracing::debug!("Last room left class {}, dropping entry", class);
            entries.remove(class);
        }
    }

    pub fn contains(&self, class: &str, room_id: &str) -> bool {
        self.read()
            .get(class)
            .map(|entry| entry.has_room(room_id))
            .unwrap_or(false)
    }

    pub fn rooms_for(&self, class: &str) -> Vec<String> {
        self.read()
            .get(class)
            .map(|entry| entry.rooms.clone())
            .unwrap_or_default()
    }

    /// Class owning `subscription_id`, or an empty string
    pub fn class_for(&self, subscription_id: &str) -> String {
        self.read()
            .values()
            .find(|entry| entry.subscription_id == subscription_id)
            .map(|entry| entry.class.clone())
            .unwrap_or_default()
    }

    /// Classes `room_id` is subscribed to, sorted by name
    pub fn classes_for(&self, room_id: &str) -> Vec<String> {
        let mut classes: Vec<String> = self
            .read()
            .values()
            .filter(|entry| entry.has_room(room_id))
            .map(|entry| entry.class.clone())
            .collect();
        classes.sort();
        classes
    }

    /// Subscription id already held for `class`
    pub fn subscription_id(&self, class: &str) -> Option<String> {
        self.read().get(class).map(|entry| entry.subscription_id.clone())
    }

    /// Snapshot of class to subscription id
    pub fn active_subscriptions(&self) -> HashMap<String, String> {
        self.read()
            .values()
            .map(|entry| (entry.class.clone(), entry.subscription_id.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_new_table_is_empty() {
        let table = SubscriptionTable::new();
        assert!(table.is_empty());
        assert!(table.active_subscriptions().is_empty());
    }

    #[test]
    fn test_add_and_remove() {
        let table = SubscriptionTable::new();

        table.add("myClass", "12345", "ABC123");
        assert_eq!(table.rooms_for("myClass"), vec!["ABC123"]);
        assert_eq!(table.subscription_id("myClass").as_deref(), Some("12345"));

        table.add("myClass", "12345", "DEF456");
        assert_eq!(table.rooms_for("myClass"), vec!["ABC123", "DEF456"]);
        assert_eq!(table.class_for("12345"), "myClass");

        table.add("myClass", "12345", "GHI789");
        table.remove("myClass", "DEF456");
        assert_eq!(table.rooms_for("myClass"), vec!["ABC123", "GHI789"]);

        table.remove("myClass", "ABC123");
        table.remove("myClass", "GHI789");
        assert!(table.rooms_for("myClass").is_empty());
        assert!(table.active_subscriptions().is_empty());
        assert_eq!(table.class_for("12345"), "");
    }

    #[test]
    fn test_add_is_idempotent_per_room() {
        let table = SubscriptionTable::new();
        assert_eq!(table.add("myClass", "12345", "ABC123"), AddOutcome::Added("12345".into()));
        assert_eq!(table.add("myClass", "12345", "ABC123"), AddOutcome::AlreadySubscribed);
        assert_eq!(table.rooms_for("myClass"), vec!["ABC123"]);
    }

    #[test]
    fn test_add_keeps_existing_subscription_id() {
        let table = SubscriptionTable::new();
        table.add("myClass", "12345", "ABC123");
        assert_eq!(table.add("myClass", "67890", "DEF456"), AddOutcome::Added("12345".into()));
        assert_eq!(table.subscription_id("myClass").as_deref(), Some("12345"));
        assert_eq!(table.class_for("67890"), "");
    }

    #[test]
    fn test_contains() {
        let table = SubscriptionTable::new();
        assert!(!table.contains("myClass", "ABC123"));

        table.add("myClass", "12345", "ABC123");
        assert!(table.contains("myClass", "ABC123"));
        assert!(!table.contains("myClass", "DEF456"));
        assert!(!table.contains("otherClass", "ABC123"));
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let table = SubscriptionTable::new();
        table.add("myClass", "12345", "ABC123");
        table.remove("otherClass", "ABC123");
        table.remove("myClass", "nope");
        assert_eq!(table.rooms_for("myClass"), vec!["ABC123"]);
    }

    #[test]
    fn test_classes_for_room() {
        let table = SubscriptionTable::new();
        table.add("fvTenant", "1", "room-a");
        table.add("faultInst", "2", "room-a");
        table.add("fvBD", "3", "room-b");

        assert_eq!(table.classes_for("room-a"), vec!["faultInst", "fvTenant"]);
        assert_eq!(table.classes_for("room-b"), vec!["fvBD"]);
        assert!(table.classes_for("room-c").is_empty());

        let active = table.active_subscriptions();
        assert_eq!(active.len(), 3);
        assert_eq!(active["fvBD"], "3");
    }

    #[test]
    fn test_concurrent_adds_of_same_room_keep_one() {
        let table = Arc::new(SubscriptionTable::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let table = table.clone();
                std::thread::spawn(move || table.add("fvTenant", &format!("sub-{}", i), "room-a"))
            })
            .collect();
        let added = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|outcome| matches!(outcome, AddOutcome::Added(_)))
            .count();
        assert_eq!(added, 1);
        assert_eq!(table.rooms_for("fvTenant"), vec!["room-a"]);
        assert_eq!(table.active_subscriptions().len(), 1);
    }

    #[test]
    fn test_concurrent_adds_are_not_lost() {
        let table = Arc::new(SubscriptionTable::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let table = table.clone();
                std::thread::spawn(move || {
                    for j in 0..50 {
                        table.add("fvTenant", "sub-1", &format!("room-{}-{}", i, j));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(table.rooms_for("fvTenant").len(), 400);
        assert_eq!(table.len(), 1);
    }
}

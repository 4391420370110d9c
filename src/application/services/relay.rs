//! Forwards controller change events to subscribed rooms

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::domain::entities::ChangeEvent;
use crate::domain::traits::{Messenger, NotificationSource};
use super::SubscriptionTable;

/// Pause after a transport failure before reading again
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Chat notice for one change event
pub fn render_notice(class: &str, event: &ChangeEvent) -> String {
    format!(
        "🔔 MO/Class <code>{}</code> event: <ul><li><strong>DN</strong>: {}</li><li><strong>Status</strong>: {}</li></ul>",
        class, event.dn, event.status
    )
}

pub struct NotificationRelay {
    transport: Arc<dyn NotificationSource>,
    messenger: Arc<dyn Messenger>,
    subscriptions: Arc<SubscriptionTable>,
}

impl NotificationRelay {
    pub fn new(
        transport: Arc<dyn NotificationSource>,
        messenger: Arc<dyn Messenger>,
        subscriptions: Arc<SubscriptionTable>,
    ) -> Self {
        Self {
            transport,
            messenger,
            subscriptions,
        }
    }

    /// Deliver one batch, returning the number of notices sent
    pub async fn relay_batch(&self, events: &[ChangeEvent]) -> usize {
        let mut delivered = 0;
        for event in events {
            let class = self.subscriptions.class_for(&event.subscription_id);
            if class.is_empty() {
                tracing::debug!("No class owns subscription {}, dropping event", event.subscription_id);
                continue;
            }

            let notice = render_notice(&class, event);
            for room_id in self.subscriptions.rooms_for(&class) {
                if let Err(e) = self.messenger.room(&room_id).await {
                    tracing::warn!("Skipping room {} for {}: {}", room_id, class, e);
                    continue;
                }
                match self.messenger.send_message(&notice, &room_id).await {
                    Ok(_) => delivered += 1,
                    Err(e) => tracing::warn!("Could not notify room {}: {}", room_id, e),
                }
            }
        }
        delivered
    }

    /// Read and relay batches until `cancel` fires
    pub async fn run(self, cancel: CancellationToken) {
        tracing::info!("Notification relay started");
        loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => break,
                next = self.transport.next_batch() => next,
            };

            match next {
                Ok(events) => {
                    let delivered = self.relay_batch(&events).await;
                    tracing::debug!("Relayed {} events as {} notices", events.len(), delivered);
                }
                Err(e) => {
                    tracing::warn!("Notification transport error: {}", e);
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(RETRY_DELAY) => {}
                    }
                }
            }
        }
        tracing::info!("Notification relay stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::errors::TransportError;
    use crate::domain::entities::{Person, Room};
    use crate::testing::{MockMessenger, MockSource};

    fn event(dn: &str, status: &str, id: &str) -> ChangeEvent {
        ChangeEvent {
            dn: dn.into(),
            status: status.into(),
            subscription_id: id.into(),
        }
    }

    fn messenger_with_rooms(rooms: &[&str]) -> MockMessenger {
        let messenger = MockMessenger::new(Person::default());
        for id in rooms {
            messenger.add_room(Room {
                id: id.to_string(),
                ..Room::default()
            });
        }
        messenger
    }

    #[tokio::test]
    async fn test_batch_fans_out_to_every_room() {
        let messenger = messenger_with_rooms(&["room-a", "room-b"]);
        let table = Arc::new(SubscriptionTable::new());
        table.add("fvTenant", "sub-1", "room-a");
        table.add("fvTenant", "sub-1", "room-b");
        let relay = NotificationRelay::new(Arc::new(MockSource::new()), Arc::new(messenger.clone()), table);

        let sent = relay
            .relay_batch(&[event("uni/tn-prod", "created", "sub-1")])
            .await;
        assert_eq!(sent, 2);

        let sent = messenger.sent();
        assert_eq!(sent[0].1, "room-a");
        assert_eq!(sent[1].1, "room-b");
        assert!(sent[0].0.contains("<code>fvTenant</code>"));
        assert!(sent[0].0.contains("<strong>DN</strong>: uni/tn-prod"));
        assert!(sent[0].0.contains("<strong>Status</strong>: created"));
    }

    #[tokio::test]
    async fn test_missing_room_is_skipped() {
        let messenger = messenger_with_rooms(&["room-b"]);
        let table = Arc::new(SubscriptionTable::new());
        table.add("fvTenant", "sub-1", "deleted-room");
        table.add("fvTenant", "sub-1", "room-b");
        let relay = NotificationRelay::new(Arc::new(MockSource::new()), Arc::new(messenger.clone()), table);

        assert_eq!(relay.relay_batch(&[event("uni/tn-a", "modified", "sub-1")]).await, 1);
        assert_eq!(messenger.sent()[0].1, "room-b");
    }

    #[tokio::test]
    async fn test_unknown_subscription_dropped() {
        let messenger = messenger_with_rooms(&["room-a"]);
        let relay = NotificationRelay::new(
            Arc::new(MockSource::new()),
            Arc::new(messenger.clone()),
            Arc::new(SubscriptionTable::new()),
        );
        assert_eq!(relay.relay_batch(&[event("uni/tn-a", "deleted", "sub-9")]).await, 0);
        assert!(messenger.sent().is_empty());
    }

    #[tokio::test]
    async fn test_run_survives_transport_errors() {
        let messenger = messenger_with_rooms(&["room-a"]);
        let source = MockSource::new();
        source.push_batch(Err(TransportError::Decode("garbage".into())));
        source.push_batch(Ok(vec![event("uni/tn-a", "created", "sub-1")]));
        let table = Arc::new(SubscriptionTable::new());
        table.add("fvTenant", "sub-1", "room-a");
        let relay = NotificationRelay::new(Arc::new(source), Arc::new(messenger.clone()), table);

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(relay.run(cancel.clone()));
        for _ in 0..50 {
            if !messenger.sent().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        cancel.cancel();
        handle.await.unwrap();

        assert_eq!(messenger.sent().len(), 1);
    }
}

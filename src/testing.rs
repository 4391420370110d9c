//! Recording doubles for the collaborator traits

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::application::errors::{ControllerError, MessengerError, TransportError};
use crate::domain::entities::{
    ChangeEvent, ChatMessage, EndpointInfo, FabricSummary, MoAttributes, NeighborMap, Person,
    ProcessEntity, Room, Webhook,
};
use crate::domain::traits::{Controller, Messenger, NotificationSource};

#[derive(Default)]
struct ControllerState {
    calls: Vec<String>,
    logins: usize,
    login_error: Option<ControllerError>,
    process_entities: Option<Result<Vec<ProcessEntity>, ControllerError>>,
    fabric_summary: Option<Result<FabricSummary, ControllerError>>,
    endpoints: Option<Result<Vec<EndpointInfo>, ControllerError>>,
    neighbors: Option<Result<NeighborMap, ControllerError>>,
    faults: Option<Result<Vec<MoAttributes>, ControllerError>>,
    events: Option<Result<Vec<MoAttributes>, ControllerError>>,
    subscription_id: Option<String>,
    issued_subscriptions: usize,
    subscribe_delay: Option<Duration>,
    subscribe_error: Option<ControllerError>,
    failing_refreshes: HashSet<String>,
}

/// Controller double. Unset queries answer with empty results.
#[derive(Clone, Default)]
pub struct MockController {
    state: Arc<Mutex<ControllerState>>,
}

impl MockController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn set_login_error(&self, err: Option<ControllerError>) {
        self.state.lock().unwrap().login_error = err;
    }

    pub fn set_process_entities(&self, res: Result<Vec<ProcessEntity>, ControllerError>) {
        self.state.lock().unwrap().process_entities = Some(res);
    }

    pub fn set_fabric_summary(&self, res: Result<FabricSummary, ControllerError>) {
        self.state.lock().unwrap().fabric_summary = Some(res);
    }

    pub fn set_endpoints(&self, res: Result<Vec<EndpointInfo>, ControllerError>) {
        self.state.lock().unwrap().endpoints = Some(res);
    }

    pub fn set_neighbors(&self, res: Result<NeighborMap, ControllerError>) {
        self.state.lock().unwrap().neighbors = Some(res);
    }

    pub fn set_faults(&self, res: Result<Vec<MoAttributes>, ControllerError>) {
        self.state.lock().unwrap().faults = Some(res);
    }

    pub fn set_events(&self, res: Result<Vec<MoAttributes>, ControllerError>) {
        self.state.lock().unwrap().events = Some(res);
    }

    pub fn set_subscription_id(&self, id: &str) {
        self.state.lock().unwrap().subscription_id = Some(id.to_string());
    }

    /// Each subscribe call sleeps first and answers with a fresh `sub-<n>`
    pub fn set_slow_subscribe(&self, delay: Duration) {
        self.state.lock().unwrap().subscribe_delay = Some(delay);
    }

    pub fn set_subscribe_error(&self, err: Option<ControllerError>) {
        self.state.lock().unwrap().subscribe_error = err;
    }

    pub fn fail_refresh(&self, subscription_id: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_refreshes
            .insert(subscription_id.to_string());
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl Controller for MockController {
    async fn login(&self) -> Result<(), ControllerError> {
        self.record("login".into());
        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.login_error.clone() {
            return Err(err);
        }
        state.logins += 1;
        Ok(())
    }

    fn token(&self) -> String {
        format!("token-{}", self.state.lock().unwrap().logins)
    }

    async fn process_entities(&self) -> Result<Vec<ProcessEntity>, ControllerError> {
        self.record("process_entities".into());
        self.state.lock().unwrap().process_entities.clone().unwrap_or(Ok(Vec::new()))
    }

    async fn fabric_summary(&self) -> Result<FabricSummary, ControllerError> {
        self.record("fabric_summary".into());
        self.state
            .lock()
            .unwrap()
            .fabric_summary
            .clone()
            .unwrap_or_else(|| Ok(FabricSummary::default()))
    }

    async fn endpoint_info(&self, mac: &str) -> Result<Vec<EndpointInfo>, ControllerError> {
        self.record(format!("endpoint_info {}", mac));
        self.state.lock().unwrap().endpoints.clone().unwrap_or(Ok(Vec::new()))
    }

    async fn neighbors(&self, node: &str) -> Result<NeighborMap, ControllerError> {
        self.record(format!("neighbors {}", node));
        self.state
            .lock()
            .unwrap()
            .neighbors
            .clone()
            .unwrap_or_else(|| Ok(NeighborMap::new()))
    }

    async fn latest_faults(&self, count: u32) -> Result<Vec<MoAttributes>, ControllerError> {
        self.record(format!("latest_faults {}", count));
        self.state.lock().unwrap().faults.clone().unwrap_or(Ok(Vec::new()))
    }

    async fn latest_events(
        &self,
        count: u32,
        user: Option<&str>,
    ) -> Result<Vec<MoAttributes>, ControllerError> {
        match user {
            Some(user) => self.record(format!("latest_events {} {}", count, user)),
            None => self.record(format!("latest_events {}", count)),
        }
        self.state.lock().unwrap().events.clone().unwrap_or(Ok(Vec::new()))
    }

    async fn subscribe_to_class(&self, class: &str) -> Result<String, ControllerError> {
        self.record(format!("subscribe_to_class {}", class));
        let delay = self.state.lock().unwrap().subscribe_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.subscribe_error.clone() {
            return Err(err);
        }
        if delay.is_some() {
            let id = format!("sub-{}", state.issued_subscriptions);
            state.issued_subscriptions += 1;
            return Ok(id);
        }
        Ok(state
            .subscription_id
            .clone()
            .unwrap_or_else(|| format!("sub-{}", class)))
    }

    async fn refresh_subscription(&self, subscription_id: &str) -> Result<(), ControllerError> {
        self.record(format!("refresh_subscription {}", subscription_id));
        if self.state.lock().unwrap().failing_refreshes.contains(subscription_id) {
            return Err(ControllerError::Api {
                status: 400,
                path: "/api/subscriptionRefresh.json".into(),
                message: "unknown subscription".into(),
            });
        }
        Ok(())
    }
}

#[derive(Default)]
struct MessengerState {
    identity: Person,
    identity_error: Option<MessengerError>,
    webhooks: Vec<Webhook>,
    webhooks_error: Option<MessengerError>,
    created: Vec<Webhook>,
    create_error: Option<MessengerError>,
    deleted: Vec<String>,
    messages: HashMap<String, ChatMessage>,
    people: HashMap<String, Person>,
    rooms: HashMap<String, Room>,
    sent: Vec<(String, String)>,
    send_error: Option<MessengerError>,
}

fn not_found(what: &str, id: &str) -> MessengerError {
    MessengerError::Api {
        status: 404,
        message: format!("{} {} not found", what, id),
    }
}

/// Messaging platform double keeping every sent message
#[derive(Clone, Default)]
pub struct MockMessenger {
    state: Arc<Mutex<MessengerState>>,
}

impl MockMessenger {
    pub fn new(identity: Person) -> Self {
        let messenger = Self::default();
        messenger.state.lock().unwrap().identity = identity;
        messenger
    }

    pub fn set_identity_error(&self, err: Option<MessengerError>) {
        self.state.lock().unwrap().identity_error = err;
    }

    pub fn add_webhook(&self, webhook: Webhook) {
        self.state.lock().unwrap().webhooks.push(webhook);
    }

    pub fn set_webhooks_error(&self, err: Option<MessengerError>) {
        self.state.lock().unwrap().webhooks_error = err;
    }

    pub fn set_create_error(&self, err: Option<MessengerError>) {
        self.state.lock().unwrap().create_error = err;
    }

    pub fn add_message(&self, message: ChatMessage) {
        self.state
            .lock()
            .unwrap()
            .messages
            .insert(message.id.clone(), message);
    }

    pub fn add_person(&self, person: Person) {
        self.state.lock().unwrap().people.insert(person.id.clone(), person);
    }

    pub fn add_room(&self, room: Room) {
        self.state.lock().unwrap().rooms.insert(room.id.clone(), room);
    }

    pub fn set_send_error(&self, err: Option<MessengerError>) {
        self.state.lock().unwrap().send_error = err;
    }

    /// `(text, room_id)` of every message sent
    pub fn sent(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn created(&self) -> Vec<Webhook> {
        self.state.lock().unwrap().created.clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.state.lock().unwrap().deleted.clone()
    }
}

#[async_trait]
impl Messenger for MockMessenger {
    async fn bot_identity(&self) -> Result<Person, MessengerError> {
        let state = self.state.lock().unwrap();
        match state.identity_error.clone() {
            Some(err) => Err(err),
            None => Ok(state.identity.clone()),
        }
    }

    async fn webhooks(&self) -> Result<Vec<Webhook>, MessengerError> {
        let state = self.state.lock().unwrap();
        match state.webhooks_error.clone() {
            Some(err) => Err(err),
            None => Ok(state.webhooks.clone()),
        }
    }

    async fn create_webhook(
        &self,
        name: &str,
        target_url: &str,
        resource: &str,
        event: &str,
    ) -> Result<Webhook, MessengerError> {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.create_error.clone() {
            return Err(err);
        }
        let webhook = Webhook {
            id: format!("wh-{}", state.created.len() + 1),
            name: name.into(),
            target_url: target_url.into(),
            resource: resource.into(),
            event: event.into(),
            data: None,
        };
        state.created.push(webhook.clone());
        state.webhooks.push(webhook.clone());
        Ok(webhook)
    }

    async fn delete_webhook(&self, id: &str) -> Result<(), MessengerError> {
        let mut state = self.state.lock().unwrap();
        let before = state.webhooks.len();
        state.webhooks.retain(|w| w.id != id);
        if state.webhooks.len() == before {
            return Err(not_found("webhook", id));
        }
        state.deleted.push(id.to_string());
        Ok(())
    }

    async fn message(&self, id: &str) -> Result<ChatMessage, MessengerError> {
        self.state
            .lock()
            .unwrap()
            .messages
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("message", id))
    }

    async fn person(&self, id: &str) -> Result<Person, MessengerError> {
        self.state
            .lock()
            .unwrap()
            .people
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("person", id))
    }

    async fn room(&self, id: &str) -> Result<Room, MessengerError> {
        self.state
            .lock()
            .unwrap()
            .rooms
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("room", id))
    }

    async fn send_message(&self, text: &str, room_id: &str) -> Result<String, MessengerError> {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.send_error.clone() {
            return Err(err);
        }
        state.sent.push((text.to_string(), room_id.to_string()));
        Ok(format!("msg-{}", state.sent.len()))
    }
}

#[derive(Default)]
struct SourceState {
    tokens: Vec<String>,
    connect_error: Option<TransportError>,
    batches: VecDeque<Result<Vec<ChangeEvent>, TransportError>>,
}

/// Notification source double. Once the queued batches run out,
/// `next_batch` never resolves.
#[derive(Clone, Default)]
pub struct MockSource {
    state: Arc<Mutex<SourceState>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_batch(&self, batch: Result<Vec<ChangeEvent>, TransportError>) {
        self.state.lock().unwrap().batches.push_back(batch);
    }

    pub fn set_connect_error(&self, err: Option<TransportError>) {
        self.state.lock().unwrap().connect_error = err;
    }

    /// Tokens passed to every `connect` call
    pub fn tokens(&self) -> Vec<String> {
        self.state.lock().unwrap().tokens.clone()
    }
}

#[async_trait]
impl NotificationSource for MockSource {
    async fn connect(&self, token: &str) -> Result<(), TransportError> {
        let mut state = self.state.lock().unwrap();
        state.tokens.push(token.to_string());
        match state.connect_error.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn next_batch(&self) -> Result<Vec<ChangeEvent>, TransportError> {
        let next = self.state.lock().unwrap().batches.pop_front();
        match next {
            Some(batch) => batch,
            None => std::future::pending().await,
        }
    }
}

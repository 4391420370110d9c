//! APIC push-notification websocket

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use futures_util::StreamExt;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::Connector;
use url::Url;

use crate::application::errors::TransportError;
use crate::domain::entities::ChangeEvent;
use crate::domain::traits::NotificationSource;
use super::mo::{decode_objects, RawObject};

/// Batches buffered between the reader task and the relay
const CHANNEL_CAPACITY: usize = 64;

type Batch = Result<Vec<ChangeEvent>, TransportError>;

#[derive(Deserialize)]
#[serde(untagged)]
enum SubscriptionIds {
    Many(Vec<String>),
    One(String),
}

impl Default for SubscriptionIds {
    fn default() -> Self {
        SubscriptionIds::Many(Vec::new())
    }
}

impl SubscriptionIds {
    fn into_vec(self) -> Vec<String> {
        match self {
            SubscriptionIds::Many(ids) => ids,
            SubscriptionIds::One(id) => vec![id],
        }
    }
}

#[derive(Deserialize)]
struct Frame {
    #[serde(default, rename = "subscriptionId")]
    subscription_id: SubscriptionIds,
    #[serde(default)]
    imdata: Vec<BTreeMap<String, RawObject>>,
}

/// Turn one text frame into change events, one per subscription id and object
pub fn decode_frame(text: &str) -> Result<Vec<ChangeEvent>, TransportError> {
    let frame: Frame =
        serde_json::from_str(text).map_err(|e| TransportError::Decode(e.to_string()))?;
    let ids = frame.subscription_id.into_vec();
    let objects = decode_objects(frame.imdata);

    let mut events = Vec::with_capacity(ids.len() * objects.len());
    for id in &ids {
        for mo in &objects {
            events.push(ChangeEvent {
                dn: mo.attr("dn").to_string(),
                status: mo.attr("status").to_string(),
                subscription_id: id.clone(),
            });
        }
    }
    Ok(events)
}

/// Websocket feed of subscribed class changes.
///
/// Each `connect` replaces the reader task; batches from every connection
/// arrive on the same channel.
pub struct ApicWebSocket {
    socket_base: Url,
    insecure: bool,
    tx: mpsc::Sender<Batch>,
    rx: tokio::sync::Mutex<mpsc::Receiver<Batch>>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl ApicWebSocket {
    pub fn new(controller_url: &str, insecure: bool) -> Result<Self, TransportError> {
        let mut socket_base = Url::parse(controller_url)
            .map_err(|e| TransportError::Connection(format!("invalid controller url: {}", e)))?;
        let scheme = match socket_base.scheme() {
            "http" | "ws" => "ws",
            _ => "wss",
        };
        socket_base
            .set_scheme(scheme)
            .map_err(|_| TransportError::Connection(format!("cannot use {} for {}", scheme, controller_url)))?;

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        Ok(Self {
            socket_base,
            insecure,
            tx,
            rx: tokio::sync::Mutex::new(rx),
            reader: Mutex::new(None),
        })
    }

    /// `<ws|wss>://<host>/socket<token>`
    pub fn socket_url(&self, token: &str) -> Url {
        let mut url = self.socket_base.clone();
        url.set_path(&format!("/socket{}", token));
        url.set_query(None);
        url
    }

    fn connector(&self) -> Result<Option<Connector>, TransportError> {
        if self.socket_base.scheme() != "wss" {
            return Ok(None);
        }
        let tls = native_tls::TlsConnector::builder()
            .danger_accept_invalid_certs(self.insecure)
            .build()
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        Ok(Some(Connector::NativeTls(tls)))
    }
}

async fn read_frames<S>(mut stream: S, tx: mpsc::Sender<Batch>)
where
    S: futures_util::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    while let Some(msg) = stream.next().await {
        let batch = match msg {
            Ok(Message::Text(text)) => decode_frame(&text),
            Ok(Message::Close(_)) => {
                let _ = tx.send(Err(TransportError::Closed)).await;
                return;
            }
            Ok(_) => continue,
            Err(e) => {
                let _ = tx.send(Err(TransportError::Connection(e.to_string()))).await;
                return;
            }
        };
        if matches!(&batch, Ok(events) if events.is_empty()) {
            continue;
        }
        if tx.send(batch).await.is_err() {
            return;
        }
    }
    let _ = tx.send(Err(TransportError::Closed)).await;
}

#[async_trait]
impl NotificationSource for ApicWebSocket {
    async fn connect(&self, token: &str) -> Result<(), TransportError> {
        let url = self.socket_url(token);
        let connector = self.connector()?;
        let (stream, _) =
            tokio_tungstenite::connect_async_tls_with_config(url.as_str(), None, false, connector)
                .await
                .map_err(|e| TransportError::Connection(e.to_string()))?;
        tracing::info!("Websocket connected to {}", self.socket_base);

        let handle = tokio::spawn(read_frames(stream, self.tx.clone()));
        let previous = self
            .reader
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
        Ok(())
    }

    async fn next_batch(&self) -> Result<Vec<ChangeEvent>, TransportError> {
        if self.reader.lock().unwrap_or_else(|e| e.into_inner()).is_none() {
            return Err(TransportError::NotConnected);
        }
        self.rx
            .lock()
            .await
            .recv()
            .await
            .unwrap_or(Err(TransportError::Closed))
    }
}

impl Drop for ApicWebSocket {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.lock().unwrap_or_else(|e| e.into_inner()).take() {
            reader.abort();
        }
    }
}

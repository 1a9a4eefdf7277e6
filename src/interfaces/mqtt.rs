use std::collections::HashMap;
use std::str::{from_utf8, Utf8Error};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS};
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::config::MqttSettings;
use crate::constants::defaults;
use crate::helpers::rand_hex;

#[derive(Debug, Clone, PartialEq)]
pub struct MqttMessage {
    pub topic: String,
    pub payload: String,
    pub retain: bool,
}

impl MqttMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            retain: false,
        }
    }
}

#[derive(Error, Debug)]
pub enum BusError {
    #[error(transparent)]
    Utf8(#[from] Utf8Error),
    #[error(transparent)]
    MqttClient(#[from] rumqttc::ClientError),
    #[error("publish to {topic} rejected: {reason}")]
    Rejected { topic: String, reason: String },
}

/// Callback for messages arriving on a subscribed topic
pub type Handler = Box<dyn Fn(&MqttMessage) + Send + Sync>;

/// The slice of a message bus the bridge relies on
///
/// Implementations must be safe to call concurrently from many devices.
#[async_trait]
pub trait Bus: Send + Sync {
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), BusError>;

    /// Register `handler` for exact-topic matches
    ///
    /// Returns `false` if the subscription could not be placed; the caller carries
    /// on without it.
    async fn subscribe(&self, topic: &str, handler: Handler) -> bool;
}

/// Handlers by topic, and whether the broker has accepted the current connection
///
/// While disconnected a new topic is only recorded; the next ConnAck subscribes
/// every recorded topic, so each is subscribed once per connection.
#[derive(Default)]
struct Subscriptions {
    state: Mutex<SubscriptionState>,
}

#[derive(Default)]
struct SubscriptionState {
    handlers: HashMap<String, Vec<Handler>>,
    connected: bool,
}

impl Subscriptions {
    fn lock(&self) -> MutexGuard<'_, SubscriptionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record `handler`, returning true if a SUBSCRIBE must be sent right away
    fn register(&self, topic: &str, handler: Handler) -> bool {
        let mut state = self.lock();
        let new_topic = !state.handlers.contains_key(topic);
        state
            .handlers
            .entry(topic.to_string())
            .or_default()
            .push(handler);
        new_topic && state.connected
    }

    fn forget(&self, topic: &str) {
        self.lock().handlers.remove(topic);
    }

    /// Mark the connection accepted and return every topic to subscribe on it
    fn connected(&self) -> Vec<String> {
        let mut state = self.lock();
        state.connected = true;
        state.handlers.keys().cloned().collect()
    }

    fn disconnected(&self) {
        self.lock().connected = false;
    }

    fn dispatch(&self, msg: &MqttMessage) {
        let state = self.lock();
        match state.handlers.get(&msg.topic) {
            Some(topic_handlers) => topic_handlers.iter().for_each(|handle| handle(msg)),
            None => log::debug!("Unhandled message on {}", msg.topic),
        }
    }

    fn clear(&self) {
        self.lock().handlers.clear();
    }
}

/// [`Bus`] backed by a rumqttc async client
///
/// Connection management, including reconnects, happens in a background task that
/// polls the event loop. Subscriptions are re-issued every time the broker accepts
/// a connection.
pub struct MqttBus {
    client: AsyncClient,
    subscriptions: Arc<Subscriptions>,
    event_loop: Mutex<Option<JoinHandle<()>>>,
}

pub fn get_rand_client_id(prefix: Option<&str>) -> String {
    const RAND_ID_BYTES: usize = 3;
    let randhex = rand_hex(RAND_ID_BYTES);

    if let Some(pref) = prefix {
        format!("{pref}-{randhex}")
    } else {
        randhex
    }
}

impl MqttBus {
    /// Create the client and start driving its connection
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect(settings: &MqttSettings) -> Self {
        let client_id = get_rand_client_id(Some(&settings.client_id_prefix));
        log::info!(
            "Establishing MQTT connection to {}:{} as {}",
            settings.host,
            settings.port,
            client_id
        );

        let mut mqttoptions = MqttOptions::new(client_id, settings.host.clone(), settings.port);
        mqttoptions.set_keep_alive(defaults::MQTT_KEEP_ALIVE);
        mqttoptions.set_clean_session(true);
        if let Some(username) = &settings.username {
            let password = settings.password.clone().unwrap_or_default();
            mqttoptions.set_credentials(username.clone(), password);
        }

        let (client, eventloop) = AsyncClient::new(mqttoptions, defaults::MQTT_CHANNEL_CAPACITY);
        let subscriptions: Arc<Subscriptions> = Arc::default();
        let event_loop = tokio::spawn(drive(eventloop, client.clone(), subscriptions.clone()));

        Self {
            client,
            subscriptions,
            event_loop: Mutex::new(Some(event_loop)),
        }
    }

    /// Disconnect cleanly, giving the event loop at most `deadline` to flush
    pub async fn disconnect(&self, deadline: Duration) {
        log::info!("Disconnecting from MQTT broker");
        if let Err(e) = self.client.try_disconnect() {
            log::warn!("MQTT disconnect request failed: {e}");
        }

        let event_loop = self
            .event_loop
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(mut event_loop) = event_loop {
            if tokio::time::timeout(deadline, &mut event_loop).await.is_err() {
                log::warn!("MQTT event loop did not finish within {deadline:?}; aborting");
                event_loop.abort();
            }
        }
        // Subscribers waiting on a channel fed by a handler see it close here
        self.subscriptions.clear();
    }
}

#[async_trait]
impl Bus for MqttBus {
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), BusError> {
        log::debug!("Publishing to {}: {}", topic, payload);
        // Queued means accepted; a full queue while the broker is away fails fast
        self.client
            .try_publish(topic, QoS::AtLeastOnce, false, payload.as_bytes().to_vec())?;
        Ok(())
    }

    async fn subscribe(&self, topic: &str, handler: Handler) -> bool {
        if !self.subscriptions.register(topic, handler) {
            log::info!("Subscription to {} recorded", topic);
            return true;
        }

        log::info!("Subscribing to {}", topic);
        match self.client.try_subscribe(topic, QoS::AtLeastOnce) {
            Ok(()) => true,
            Err(e) => {
                log::error!("Could not subscribe to {}: {}", topic, e);
                self.subscriptions.forget(topic);
                false
            }
        }
    }
}

async fn drive(mut eventloop: EventLoop, client: AsyncClient, subscriptions: Arc<Subscriptions>) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                log::info!("MQTT connected: {:?}", ack.code);
                resubscribe(&client, subscriptions.connected());
            }
            Ok(Event::Incoming(Packet::Publish(p))) => match from_utf8(&p.payload) {
                Ok(payload) => subscriptions.dispatch(&MqttMessage {
                    topic: p.topic.clone(),
                    payload: payload.into(),
                    retain: p.retain,
                }),
                Err(e) => {
                    log::warn!("Dropping non-UTF-8 message on {}: {}", p.topic, BusError::from(e))
                }
            },
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                log::debug!("MQTT disconnect sent; stopping event loop");
                return;
            }
            Ok(notification) => log::trace!("Notification = {:?}", notification),
            Err(e) => {
                log::error!("MQTT connection error: {}", e);
                subscriptions.disconnected();
                tokio::time::sleep(defaults::MQTT_RECONNECT_DELAY).await;
            }
        }
    }
}

fn resubscribe(client: &AsyncClient, topics: Vec<String>) {
    for topic in topics {
        // Awaiting here would deadlock against our own event loop when the request queue is full
        if let Err(e) = client.try_subscribe(topic.clone(), QoS::AtLeastOnce) {
            log::error!("Could not re-subscribe to {}: {}", topic, e);
        }
    }
}

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use hass_bridge::interfaces::mqtt::{Bus, BusError, Handler, MqttMessage};

/// In-memory bus recording every publish, optionally rejecting chosen topics
#[derive(Default)]
pub struct RecordingBus {
    published: Mutex<Vec<(String, String)>>,
    handlers: Mutex<Vec<(String, Handler)>>,
    failing: Mutex<HashSet<String>>,
    refuse_subscriptions: bool,
}

impl RecordingBus {
    pub fn refusing_subscriptions() -> Self {
        Self {
            refuse_subscriptions: true,
            ..Default::default()
        }
    }

    pub fn fail_topic(&self, topic: &str) {
        self.failing.lock().unwrap().insert(topic.to_string());
    }

    pub fn published(&self) -> Vec<(String, String)> {
        self.published.lock().unwrap().clone()
    }

    pub fn published_to(&self, topic: &str) -> Vec<String> {
        self.published()
            .into_iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, p)| p)
            .collect()
    }

    pub fn take_published(&self) -> Vec<(String, String)> {
        self.published.lock().unwrap().drain(..).collect()
    }

    pub fn subscriptions(&self) -> Vec<String> {
        self.handlers.lock().unwrap().iter().map(|(t, _)| t.clone()).collect()
    }

    /// Hand a message to every handler subscribed to `topic`
    pub fn deliver(&self, topic: &str, payload: &str) {
        let msg = MqttMessage::new(topic, payload);
        for (_, handler) in self.handlers.lock().unwrap().iter().filter(|(t, _)| t == topic) {
            handler(&msg);
        }
    }

    /// Drop all handlers, as a disconnect would
    pub fn close(&self) {
        self.handlers.lock().unwrap().clear();
    }
}

#[async_trait]
impl Bus for RecordingBus {
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), BusError> {
        if self.failing.lock().unwrap().contains(topic) {
            return Err(BusError::Rejected {
                topic: topic.into(),
                reason: "rejected by test bus".into(),
            });
        }
        self.published.lock().unwrap().push((topic.into(), payload.into()));
        Ok(())
    }

    async fn subscribe(&self, topic: &str, handler: Handler) -> bool {
        if self.refuse_subscriptions {
            return false;
        }
        self.handlers.lock().unwrap().push((topic.into(), handler));
        true
    }
}

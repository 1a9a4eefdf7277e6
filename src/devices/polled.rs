use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::helpers::now_iso;
use crate::interfaces::http::FetchError;
use crate::interfaces::mqtt::Bus;
use crate::schedule::Schedule;

use super::{Device, DeviceKind, DiscoverySet};

#[derive(Error, Debug)]
pub enum ReadError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("source unavailable: {0}")]
    Unavailable(String),
    #[error("no usable reading: {0}")]
    Unusable(String),
}

/// Where a polled device gets its state from
#[async_trait]
pub trait Source: Send + Sync + 'static {
    /// Flat JSON object published as-is to the state topic
    type State: Serialize + Send;

    async fn read(&self) -> Result<Self::State, ReadError>;
}

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct DeviceHealth {
    pub last_success: Option<String>,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
}

impl DeviceHealth {
    /// The most recent poll published state
    pub fn is_healthy(&self) -> bool {
        self.last_success.is_some() && self.consecutive_failures == 0
    }

    fn record_success(&mut self) {
        self.last_success = Some(now_iso());
        self.consecutive_failures = 0;
    }

    fn record_failure(&mut self, error: String) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.last_error = Some(error);
    }
}

/// A [`Device`] that periodically reads a [`Source`] and publishes the result
///
/// Polling starts as soon as the device is built and runs at most once per
/// `poll_rate`. A failed read skips that iteration only.
pub struct PolledDevice<S: Source> {
    name: String,
    kind: DeviceKind,
    configuration: DiscoverySet,
    bus: Arc<dyn Bus>,
    schedule: Schedule,
    completion: Mutex<Option<JoinHandle<()>>>,
    health: Arc<Mutex<DeviceHealth>>,
    source: Arc<S>,
}

impl<S: Source> PolledDevice<S> {
    /// Must be called from within a tokio runtime
    pub fn start(
        name: &str,
        kind: DeviceKind,
        configuration: DiscoverySet,
        bus: Arc<dyn Bus>,
        source: S,
        state_topic: String,
        poll_rate: Duration,
    ) -> Self {
        let source = Arc::new(source);
        let health: Arc<Mutex<DeviceHealth>> = Arc::default();

        let schedule = {
            let (name, bus, source, health) =
                (name.to_string(), bus.clone(), source.clone(), health.clone());
            Schedule::new(
                move || {
                    let (name, bus, source, health, topic) = (
                        name.clone(),
                        bus.clone(),
                        source.clone(),
                        health.clone(),
                        state_topic.clone(),
                    );
                    async move {
                        poll_once(&name, source.as_ref(), bus.as_ref(), &topic, &health).await
                    }
                },
                poll_rate,
            )
        };

        log::info!("{}: polling every {:?}", name, poll_rate);
        let completion = schedule.start();

        Self {
            name: name.to_string(),
            kind,
            configuration,
            bus,
            schedule,
            completion: Mutex::new(Some(completion)),
            health,
            source,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

async fn poll_once<S: Source>(
    name: &str,
    source: &S,
    bus: &dyn Bus,
    topic: &str,
    health: &Mutex<DeviceHealth>,
) {
    let outcome = match source.read().await {
        Ok(state) => match serde_json::to_string(&state) {
            Ok(payload) => bus.publish(topic, &payload).await.map_err(|e| e.to_string()),
            Err(e) => Err(format!("could not encode state: {e}")),
        },
        Err(e) => Err(e.to_string()),
    };

    let mut health = health.lock().unwrap_or_else(PoisonError::into_inner);
    match outcome {
        Ok(()) => {
            log::debug!("{}: published state to {}", name, topic);
            health.record_success();
        }
        Err(e) => {
            log::warn!("{}: skipping this poll: {}", name, e);
            health.record_failure(e);
        }
    }
}

#[async_trait]
impl<S: Source> Device for PolledDevice<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> DeviceKind {
        self.kind
    }

    fn configuration(&self) -> &DiscoverySet {
        &self.configuration
    }

    fn bus(&self) -> &Arc<dyn Bus> {
        &self.bus
    }

    fn health(&self) -> DeviceHealth {
        self.health.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    async fn shutdown(&self) {
        self.schedule.stop();
        let completion = self.completion.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(completion) = completion {
            if let Err(e) = completion.await {
                log::error!("{}: poll loop ended abnormally: {}", self.name, e);
            }
            log::info!("{}: stopped", self.name);
        }
    }
}

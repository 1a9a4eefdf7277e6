use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::constants::topics;
use crate::interfaces::mqtt::{Bus, Handler, MqttMessage};

use super::{Device, DeviceError, DeviceHealth};

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DeviceStatus {
    pub healthy: bool,
    pub data: DeviceHealth,
}

/// Owns every bridged device and drives them as a group
///
/// Fan-out calls run against all devices concurrently and return one result per
/// device, in registration order; one device failing never holds up the rest.
pub struct DeviceManager {
    bus: Arc<dyn Bus>,
    devices: Vec<Arc<dyn Device>>,
}

impl DeviceManager {
    pub fn new(bus: Arc<dyn Bus>) -> Self {
        Self {
            bus,
            devices: Vec::new(),
        }
    }

    pub fn add(&mut self, device: Arc<dyn Device>) -> &mut Self {
        log::info!("Registered device {} ({})", device.name(), device.kind());
        self.devices.push(device);
        self
    }

    pub fn devices(&self) -> &[Arc<dyn Device>] {
        &self.devices
    }

    pub async fn announce(&self) -> Vec<Result<(), DeviceError>> {
        log::info!("Announcing {} devices", self.devices.len());
        let results = join_all(self.devices.iter().map(|d| d.announce())).await;
        log_failures("announce", &results);
        results
    }

    pub async fn denounce(&self) -> Vec<Result<(), DeviceError>> {
        log::info!("Denouncing {} devices", self.devices.len());
        let results = join_all(self.devices.iter().map(|d| d.denounce())).await;
        log_failures("denounce", &results);
        results
    }

    pub async fn shutdown(&self) {
        log::info!("Shutting down {} devices", self.devices.len());
        join_all(self.devices.iter().map(|d| d.shutdown())).await;
    }

    /// Stop every device, then withdraw them all from the hub
    ///
    /// Each step gets at most `bound`. Withdrawal runs even if a device is still
    /// finishing a poll when the first step runs out of time.
    pub async fn teardown(&self, bound: Duration) {
        if timeout(bound, self.shutdown()).await.is_err() {
            log::warn!("Devices did not stop within {:?}; withdrawing them anyway", bound);
        }
        if timeout(bound, self.denounce()).await.is_err() {
            log::warn!("Devices were not withdrawn within {:?}", bound);
        }
    }

    pub fn health(&self) -> BTreeMap<String, DeviceStatus> {
        self.devices
            .iter()
            .map(|d| {
                let data = d.health();
                (
                    d.name().to_string(),
                    DeviceStatus {
                        healthy: data.is_healthy(),
                        data,
                    },
                )
            })
            .collect()
    }

    /// Re-announce every device whenever the hub reports it is back online
    ///
    /// Places one subscription for the whole process. Returns `None` if the
    /// subscription could not be placed, in which case hub restarts go unnoticed.
    /// The returned task ends once the bus drops the subscription.
    pub async fn listen_for_hub(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let (tx, rx) = flume::unbounded::<String>();
        let handler: Handler = Box::new(move |msg: &MqttMessage| {
            if tx.send(msg.payload.clone()).is_err() {
                log::debug!("Hub status listener has gone away");
            }
        });

        if !self.bus.subscribe(topics::HUB_STATUS, handler).await {
            log::warn!(
                "Not watching {}; discovery will not be re-sent on hub restart",
                topics::HUB_STATUS
            );
            return None;
        }

        let manager = Arc::clone(self);
        Some(tokio::spawn(async move {
            while let Ok(payload) = rx.recv_async().await {
                if payload == topics::HUB_ONLINE_PAYLOAD {
                    log::info!("Hub came online; re-announcing devices");
                    manager.announce().await;
                } else {
                    log::debug!("Hub status: {}", payload);
                }
            }
        }))
    }
}

fn log_failures(action: &str, results: &[Result<(), DeviceError>]) {
    for e in results.iter().filter_map(|r| r.as_ref().err()) {
        log::warn!("Could not {} device: {}", action, e);
    }
}

//! Data sources bridged onto the bus
//!
//! Every device shares one lifecycle: built (subscriptions placed, polling
//! started), [`Device::announce`]d, polled until [`Device::shutdown`], then
//! [`Device::denounce`]d. The [`DeviceManager`] fans those calls out across all
//! registered devices.
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use thiserror::Error;

use crate::interfaces::http::HttpFetcher;
use crate::interfaces::mqtt::Bus;

pub mod discovery;
pub mod huawei;
pub mod manager;
pub mod polled;
pub mod zeversolar;

pub use discovery::DiscoverySet;
pub use manager::DeviceManager;
pub use polled::{DeviceHealth, PolledDevice, ReadError, Source};

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("{device}: {failed} of {total} publishes failed")]
    Publish {
        device: String,
        failed: usize,
        total: usize,
    },
    #[error("could not encode discovery descriptors: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    ZeversolarTlc5000,
    HuaweiHg659,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeviceKind::ZeversolarTlc5000 => "zeversolar_tlc5000",
            DeviceKind::HuaweiHg659 => "huawei_hg659",
        })
    }
}

/// Process-wide collaborators handed to every device
#[derive(Clone)]
pub struct DeviceContext {
    pub bus: Arc<dyn Bus>,
    pub http: HttpFetcher,
}

#[async_trait]
pub trait Device: Send + Sync {
    fn name(&self) -> &str;

    fn kind(&self) -> DeviceKind;

    fn configuration(&self) -> &DiscoverySet;

    fn bus(&self) -> &Arc<dyn Bus>;

    fn health(&self) -> DeviceHealth;

    /// Publish every discovery descriptor
    ///
    /// All descriptors are attempted even if some fail.
    async fn announce(&self) -> Result<(), DeviceError> {
        let messages = self.configuration().iter().map(|d| (d.topic.as_str(), d.payload.as_str()));
        publish_all(self.name(), self.bus().as_ref(), messages).await
    }

    /// Withdraw every entity by publishing an empty payload to its discovery topic
    async fn denounce(&self) -> Result<(), DeviceError> {
        let messages = self.configuration().iter().map(|d| (d.topic.as_str(), ""));
        publish_all(self.name(), self.bus().as_ref(), messages).await
    }

    /// Stop polling and wait for an in-flight poll to finish
    ///
    /// Nothing is published by this device's poll loop once this returns.
    async fn shutdown(&self);
}

async fn publish_all<'a>(
    device: &str,
    bus: &dyn Bus,
    messages: impl Iterator<Item = (&'a str, &'a str)>,
) -> Result<(), DeviceError> {
    let results = join_all(messages.map(|(topic, payload)| async move {
        let result = bus.publish(topic, payload).await;
        if let Err(e) = &result {
            log::error!("{}: publish to {} failed: {}", device, topic, e);
        }
        result
    }))
    .await;

    let total = results.len();
    let failed = results.iter().filter(|r| r.is_err()).count();
    if failed > 0 {
        return Err(DeviceError::Publish {
            device: device.to_string(),
            failed,
            total,
        });
    }
    log::debug!("{}: published {} messages", device, total);
    Ok(())
}

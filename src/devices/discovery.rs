//! Hub auto-discovery descriptors
//!
//! Every entity a device exposes is announced by publishing its
//! [`EntityConfiguration`] to `homeassistant/<category>/<node>/<object_id>/config`.
//! Descriptors are serialized once, when the device is built, and published
//! verbatim afterwards.
use serde::Serialize;

use crate::constants::topics;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DeviceInformation {
    pub identifiers: String,
    pub name: String,
    pub manufacturer: String,
    pub model: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct EntityConfiguration {
    pub name: String,
    pub unique_id: String,
    pub value_template: String,
    pub state_topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_of_measurement: Option<String>,
    pub device: DeviceInformation,
}

impl EntityConfiguration {
    /// An entity reading `value_key` out of the JSON published to `state_topic`
    pub fn new(
        name: &str,
        unique_id: String,
        value_key: &str,
        state_topic: &str,
        device: &DeviceInformation,
    ) -> Self {
        Self {
            name: name.to_string(),
            unique_id,
            value_template: format!("{{{{ value_json.{value_key} }}}}"),
            state_topic: state_topic.to_string(),
            state_class: None,
            last_reset: None,
            device_class: None,
            unit_of_measurement: None,
            device: device.clone(),
        }
    }

    pub fn state_class(mut self, state_class: &str) -> Self {
        self.state_class = Some(state_class.into());
        self
    }

    pub fn last_reset(mut self, last_reset: String) -> Self {
        self.last_reset = Some(last_reset);
        self
    }

    pub fn device_class(mut self, device_class: &str) -> Self {
        self.device_class = Some(device_class.into());
        self
    }

    pub fn unit(mut self, unit: &str) -> Self {
        self.unit_of_measurement = Some(unit.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryDescriptor {
    pub topic: String,
    pub payload: String,
}

/// The fixed, ordered set of descriptors one device announces
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DiscoverySet {
    descriptors: Vec<DiscoveryDescriptor>,
}

impl DiscoverySet {
    pub fn from_entities<I>(entities: I) -> Result<Self, serde_json::Error>
    where
        I: IntoIterator<Item = (String, EntityConfiguration)>,
    {
        let descriptors = entities
            .into_iter()
            .map(|(topic, entity)| {
                Ok(DiscoveryDescriptor {
                    topic,
                    payload: serde_json::to_string(&entity)?,
                })
            })
            .collect::<Result<Vec<_>, serde_json::Error>>()?;
        Ok(Self { descriptors })
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiscoveryDescriptor> {
        self.descriptors.iter()
    }

    pub fn topics(&self) -> Vec<&str> {
        self.descriptors.iter().map(|d| d.topic.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

pub fn config_topic(category: &str, node: &str, object_id: &str) -> String {
    format!("{}/{category}/{node}/{object_id}/config", topics::DISCOVERY_PREFIX)
}

pub fn state_topic(node: &str, name: &str) -> String {
    format!("{}/{node}/{name}", topics::DISCOVERY_PREFIX)
}

//! Zeversolar TLC5000 solar inverter
use std::sync::Arc;

use async_trait::async_trait;
use chrono_tz::Tz;
use serde::Serialize;

use crate::config::ZeversolarSettings;
use crate::constants::topics;
use crate::helpers::{midnight, slug};
use crate::interfaces::http::HttpFetcher;
use crate::readers::zeversolar_tlc5000::{fetch_reading, InverterReading};

use super::discovery::{
    config_topic, state_topic, DeviceInformation, DiscoverySet, EntityConfiguration,
};
use super::{DeviceContext, DeviceError, DeviceKind, PolledDevice, ReadError, Source};

pub const NAME: &str = "zeversolar_tlc5000";
const NODE: &str = "zeversolar";

pub fn solar_state_topic() -> String {
    state_topic(NODE, "solar_state")
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SolarState {
    pub last_updated: Option<String>,
    pub power_ac: Option<String>,
    pub energy_today: Option<String>,
    pub status: &'static str,
}

impl From<&InverterReading> for SolarState {
    fn from(reading: &InverterReading) -> Self {
        SolarState {
            last_updated: reading.last_updated(),
            power_ac: reading.power_ac.clone(),
            energy_today: reading.energy_today.clone(),
            status: if reading.status == "OK" { "ON" } else { "OFF" },
        }
    }
}

pub struct InverterSource {
    http: HttpFetcher,
    endpoint: String,
    timezone: Option<Tz>,
}

#[async_trait]
impl Source for InverterSource {
    type State = SolarState;

    async fn read(&self) -> Result<SolarState, ReadError> {
        let reading = fetch_reading(&self.http, &self.endpoint, self.timezone).await?;
        if !reading.is_usable() {
            return Err(ReadError::Unusable("status page carried no measurements".into()));
        }
        Ok(SolarState::from(&reading))
    }
}

fn device_information() -> DeviceInformation {
    DeviceInformation {
        identifiers: "zeversolar_inverter_TLC5000".into(),
        name: "Solar Inverter".into(),
        manufacturer: "Zeversolar".into(),
        model: "TLC5000".into(),
    }
}

/// Discovery descriptors for the inverter's four entities
///
/// `last_reset` is fixed to the local midnight at which this is called.
pub fn configuration() -> Result<DiscoverySet, serde_json::Error> {
    let device = device_information();
    let state = solar_state_topic();
    let entity = |name: &str, key: &str| {
        EntityConfiguration::new(name, slug("_", &[NODE, key]), key, &state, &device)
    };

    DiscoverySet::from_entities([
        (
            config_topic(topics::SENSOR, NODE, "solar_last_updated"),
            entity("Solar Last Updated", "last_updated").device_class("timestamp"),
        ),
        (
            config_topic(topics::SENSOR, NODE, "solar_power_ac"),
            entity("Solar Power AC (W)", "power_ac")
                .state_class("measurement")
                .device_class("power")
                .unit("W"),
        ),
        (
            config_topic(topics::SENSOR, NODE, "solar_energy_today"),
            entity("Solar Energy Today (kWh)", "energy_today")
                .state_class("total_increasing")
                .last_reset(midnight())
                .device_class("energy")
                .unit("kWh"),
        ),
        (
            config_topic(topics::BINARY_SENSOR, NODE, "solar_status"),
            entity("Solar Status", "status").device_class("power"),
        ),
    ])
}

pub type ZeversolarTlc5000 = PolledDevice<InverterSource>;

/// Build the inverter device and start polling it
pub fn start(
    ctx: &DeviceContext,
    settings: &ZeversolarSettings,
) -> Result<Arc<ZeversolarTlc5000>, DeviceError> {
    let source = InverterSource {
        http: ctx.http.clone(),
        endpoint: settings.endpoint.clone(),
        timezone: settings.timezone,
    };
    Ok(Arc::new(PolledDevice::start(
        NAME,
        DeviceKind::ZeversolarTlc5000,
        configuration()?,
        ctx.bus.clone(),
        source,
        solar_state_topic(),
        settings.poll_rate,
    )))
}

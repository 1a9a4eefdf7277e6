//! Huawei HG659 home router
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::HuaweiSettings;
use crate::constants::topics;
use crate::helpers::slug;
use crate::interfaces::http::HttpFetcher;
use crate::readers::huawei_hg659::{self_test, HuaweiApi, RouterSummary, SelfTest};

use super::discovery::{
    config_topic, state_topic, DeviceInformation, DiscoverySet, EntityConfiguration,
};
use super::{DeviceContext, DeviceError, DeviceKind, PolledDevice, ReadError, Source};

pub const NAME: &str = "huawei_hg659";
const NODE: &str = "huawei";

pub fn router_state_topic() -> String {
    state_topic(NODE, "router_state")
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RouterState {
    pub internet_connected: &'static str,
    pub self_test_message: String,
    pub internet_connection_status: Option<String>,
    pub internet_err_reason: Option<String>,
    pub internet_uptime: Option<u64>,
    pub device_uptime: Option<u64>,
}

impl RouterState {
    pub fn new(summary: &RouterSummary, test: &SelfTest) -> Self {
        let internet = summary.internet.clone().unwrap_or_default();
        let connected = internet.uptime.unwrap_or(0) > 0
            && internet.connection_status.as_deref() == Some("Connected")
            && test.success;

        RouterState {
            internet_connected: if connected { "ON" } else { "OFF" },
            self_test_message: test.message.clone().unwrap_or_else(|| "None".into()),
            internet_connection_status: internet.connection_status,
            internet_err_reason: internet.err_reason,
            internet_uptime: internet.uptime,
            device_uptime: summary.device.as_ref().and_then(|d| d.up_time),
        }
    }
}

pub struct RouterSource {
    api: HuaweiApi,
    self_test_http: HttpFetcher,
    self_test_url: String,
}

impl RouterSource {
    pub fn new(http: HttpFetcher, settings: &HuaweiSettings) -> Self {
        RouterSource {
            api: HuaweiApi::new(http, &settings.endpoint),
            self_test_http: HttpFetcher::new(settings.self_test_timeout()),
            self_test_url: settings.self_test_url.clone(),
        }
    }
}

#[async_trait]
impl Source for RouterSource {
    type State = RouterState;

    async fn read(&self) -> Result<RouterState, ReadError> {
        let (summary, test) = tokio::join!(
            self.api.summary(),
            self_test(&self.self_test_http, &self.self_test_url)
        );
        if summary.is_empty() {
            return Err(ReadError::Unavailable("router API calls all failed".into()));
        }
        Ok(RouterState::new(&summary, &test))
    }
}

fn device_information() -> DeviceInformation {
    DeviceInformation {
        identifiers: "huawei_router_hg659".into(),
        name: "Huawei HG659".into(),
        manufacturer: "Huawei".into(),
        model: "HG659".into(),
    }
}

pub fn configuration() -> Result<DiscoverySet, serde_json::Error> {
    let device = device_information();
    let state = router_state_topic();
    let entity = |name: &str, key: &str| {
        EntityConfiguration::new(name, slug("_", &[NODE, key]), key, &state, &device)
    };
    let uptime = |name: &str, key: &str| {
        entity(name, key)
            .state_class("total_increasing")
            .device_class("duration")
            .unit("ms")
    };

    DiscoverySet::from_entities([
        (
            config_topic(topics::BINARY_SENSOR, NODE, "router_internet_connected"),
            entity("Internet Connected", "internet_connected").device_class("power"),
        ),
        (
            config_topic(topics::SENSOR, NODE, "router_internet_self_test_message"),
            entity("Self-test Message", "self_test_message"),
        ),
        (
            config_topic(topics::SENSOR, NODE, "router_internet_connection_status"),
            entity("Internet Connection Status", "internet_connection_status"),
        ),
        (
            config_topic(topics::SENSOR, NODE, "router_internet_err_reason"),
            entity("Internet Err Reason", "internet_err_reason"),
        ),
        (
            config_topic(topics::SENSOR, NODE, "router_internet_uptime"),
            uptime("Internet Uptime", "internet_uptime"),
        ),
        (
            config_topic(topics::SENSOR, NODE, "router_device_uptime"),
            uptime("Device Uptime", "device_uptime"),
        ),
    ])
}

pub type HuaweiHg659 = PolledDevice<RouterSource>;

/// Build the router device and start polling it
pub fn start(
    ctx: &DeviceContext,
    settings: &HuaweiSettings,
) -> Result<Arc<HuaweiHg659>, DeviceError> {
    Ok(Arc::new(PolledDevice::start(
        NAME,
        DeviceKind::HuaweiHg659,
        configuration()?,
        ctx.bus.clone(),
        RouterSource::new(ctx.http.clone(), settings),
        router_state_topic(),
        settings.poll_rate,
    )))
}

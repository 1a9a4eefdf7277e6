use std::sync::Arc;
use std::time::Duration;

use hass_bridge::config::{HuaweiSettings, ZeversolarSettings};
use hass_bridge::devices::huawei::{self, router_state_topic};
use hass_bridge::devices::zeversolar::{self, solar_state_topic};
use hass_bridge::devices::{Device, DeviceContext};
use hass_bridge::interfaces::http::HttpFetcher;

mod stubs;

use stubs::bus::RecordingBus;
use stubs::payloads;
use stubs::wait_for;

const POLL_RATE: Duration = Duration::from_secs(60);

fn context(bus: &Arc<RecordingBus>) -> DeviceContext {
    DeviceContext {
        bus: bus.clone(),
        http: HttpFetcher::new(Duration::from_secs(2)),
    }
}

fn inverter_settings(server: &mockito::Server) -> ZeversolarSettings {
    ZeversolarSettings {
        endpoint: format!("{}/home.cgi", server.url()),
        poll_rate: POLL_RATE,
        timezone: Some(chrono_tz::UTC),
    }
}

fn router_settings(server: &mockito::Server) -> HuaweiSettings {
    HuaweiSettings {
        endpoint: server.url(),
        poll_rate: POLL_RATE,
        self_test_url: format!("{}/self-test", server.url()),
    }
}

#[tokio::test]
async fn inverter_publishes_state_on_start() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/home.cgi")
        .with_body(payloads::INVERTER_PAGE)
        .create_async()
        .await;

    let bus = Arc::new(RecordingBus::default());
    let device = zeversolar::start(&context(&bus), &inverter_settings(&server)).unwrap();

    wait_for(|| !bus.published_to(&solar_state_topic()).is_empty()).await;
    device.shutdown().await;

    assert_eq!(bus.published_to(&solar_state_topic()), vec![payloads::SOLAR_STATE]);
    assert!(device.health().is_healthy());
}

#[tokio::test]
async fn inverter_fetch_failure_skips_publish() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/home.cgi")
        .with_status(500)
        .create_async()
        .await;

    let bus = Arc::new(RecordingBus::default());
    let device = zeversolar::start(&context(&bus), &inverter_settings(&server)).unwrap();

    wait_for(|| device.health().consecutive_failures > 0).await;
    device.shutdown().await;

    assert!(bus.published().is_empty());
    assert!(device.health().last_error.unwrap().starts_with("fetch failed"));
}

#[tokio::test]
async fn inverter_empty_page_skips_publish() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/home.cgi")
        .with_body(payloads::INVERTER_PAGE_EMPTY)
        .create_async()
        .await;

    let bus = Arc::new(RecordingBus::default());
    let device = zeversolar::start(&context(&bus), &inverter_settings(&server)).unwrap();

    wait_for(|| device.health().consecutive_failures > 0).await;
    device.shutdown().await;

    assert!(bus.published().is_empty());
    assert!(device.health().last_error.unwrap().starts_with("no usable reading"));
}

#[tokio::test]
async fn router_publishes_combined_state() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/system/diagnose_internet")
        .with_body(payloads::ROUTER_DIAGNOSE_INTERNET)
        .create_async()
        .await;
    server
        .mock("GET", "/api/system/deviceinfo")
        .with_body(payloads::ROUTER_DEVICE_INFO)
        .create_async()
        .await;
    server.mock("GET", "/self-test").create_async().await;

    let bus = Arc::new(RecordingBus::default());
    let device = huawei::start(&context(&bus), &router_settings(&server)).unwrap();

    wait_for(|| !bus.published_to(&router_state_topic()).is_empty()).await;
    device.shutdown().await;

    let published = bus.published_to(&router_state_topic());
    let state: serde_json::Value = serde_json::from_str(&published[0]).unwrap();
    assert_eq!(
        state,
        serde_json::json!({
            "internet_connected": "ON",
            "self_test_message": "None",
            "internet_connection_status": "Connected",
            "internet_err_reason": "Success",
            "internet_uptime": 65,
            "device_uptime": 1034698,
        })
    );
}

#[tokio::test]
async fn router_unreachable_skips_publish() {
    // Nothing mocked: every call gets a 501
    let server = mockito::Server::new_async().await;

    let bus = Arc::new(RecordingBus::default());
    let device = huawei::start(&context(&bus), &router_settings(&server)).unwrap();

    wait_for(|| device.health().consecutive_failures > 0).await;
    device.shutdown().await;

    assert!(bus.published().is_empty());
    assert!(!device.health().is_healthy());
}

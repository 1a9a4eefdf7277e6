use std::net::TcpListener;
use std::sync::Arc;
use std::time::{Duration, Instant};

use hass_bridge::config::{HuaweiSettings, ZeversolarSettings};
use hass_bridge::constants::topics;
use hass_bridge::devices::{huawei, zeversolar, DeviceContext, DeviceError, DeviceManager};
use hass_bridge::interfaces::http::HttpFetcher;

mod stubs;

use stubs::bus::RecordingBus;
use stubs::wait_for;

/// Both devices, pointed at endpoints that never answer usefully
///
/// Only discovery traffic reaches the bus.
async fn manager_with(bus: Arc<RecordingBus>, server: &mockito::Server) -> DeviceManager {
    let ctx = DeviceContext {
        bus: bus.clone(),
        http: HttpFetcher::new(Duration::from_secs(2)),
    };
    let mut manager = DeviceManager::new(bus);
    manager
        .add(
            zeversolar::start(
                &ctx,
                &ZeversolarSettings {
                    endpoint: format!("{}/home.cgi", server.url()),
                    poll_rate: Duration::from_secs(60),
                    timezone: None,
                },
            )
            .unwrap(),
        )
        .add(
            huawei::start(
                &ctx,
                &HuaweiSettings {
                    endpoint: server.url(),
                    poll_rate: Duration::from_secs(60),
                    self_test_url: server.url(),
                },
            )
            .unwrap(),
        );
    manager
}

fn discovery_topics(published: &[(String, String)]) -> Vec<String> {
    let mut topics: Vec<String> = published
        .iter()
        .map(|(t, _)| t.clone())
        .filter(|t| t.ends_with("/config"))
        .collect();
    topics.sort();
    topics
}

#[tokio::test]
async fn announce_publishes_every_descriptor() {
    let server = mockito::Server::new_async().await;
    let bus = Arc::new(RecordingBus::default());
    let manager = manager_with(bus.clone(), &server).await;

    let results = manager.announce().await;
    manager.shutdown().await;

    assert!(results.iter().all(Result::is_ok));
    let published = bus.published();
    assert_eq!(discovery_topics(&published).len(), 10);
    assert!(published
        .iter()
        .filter(|(t, _)| t.ends_with("/config"))
        .all(|(_, payload)| payload.starts_with(r#"{"name":"#)));
}

#[tokio::test]
async fn one_failing_topic_does_not_block_others() {
    let server = mockito::Server::new_async().await;
    let bus = Arc::new(RecordingBus::default());
    bus.fail_topic("homeassistant/sensor/zeversolar/solar_power_ac/config");
    let manager = manager_with(bus.clone(), &server).await;

    let results = manager.announce().await;
    manager.shutdown().await;

    assert!(matches!(
        &results[0],
        Err(DeviceError::Publish { failed: 1, total: 4, .. })
    ));
    assert!(results[1].is_ok());

    // 3 of the inverter's descriptors and all 6 of the router's
    assert_eq!(discovery_topics(&bus.published()).len(), 9);
}

#[tokio::test]
async fn denounce_twice_is_repeatable() {
    let server = mockito::Server::new_async().await;
    let bus = Arc::new(RecordingBus::default());
    let manager = manager_with(bus.clone(), &server).await;
    manager.shutdown().await;
    bus.take_published();

    assert!(manager.denounce().await.iter().all(Result::is_ok));
    let first = bus.take_published();
    assert!(manager.denounce().await.iter().all(Result::is_ok));
    let second = bus.take_published();

    assert_eq!(first.len(), 10);
    assert!(first.iter().all(|(_, payload)| payload.is_empty()));
    assert_eq!(discovery_topics(&first), discovery_topics(&second));
}

#[tokio::test]
async fn hub_online_triggers_reannounce() {
    let server = mockito::Server::new_async().await;
    let bus = Arc::new(RecordingBus::default());
    let manager = Arc::new(manager_with(bus.clone(), &server).await);

    let listener = manager.listen_for_hub().await.unwrap();
    assert_eq!(bus.subscriptions(), vec![topics::HUB_STATUS.to_string()]);
    manager.shutdown().await;
    bus.take_published();

    bus.deliver(topics::HUB_STATUS, "offline");
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(bus.published().is_empty());

    bus.deliver(topics::HUB_STATUS, "online");
    wait_for(|| bus.published().len() == 10).await;

    bus.close();
    listener.await.unwrap();
}

#[tokio::test]
async fn refused_subscription_degrades_quietly() {
    let server = mockito::Server::new_async().await;
    let bus = Arc::new(RecordingBus::refusing_subscriptions());
    let manager = Arc::new(manager_with(bus.clone(), &server).await);

    assert!(manager.listen_for_hub().await.is_none());
    assert!(manager.announce().await.iter().all(Result::is_ok));
    manager.shutdown().await;
}

#[tokio::test]
async fn teardown_withdraws_devices_stuck_mid_poll() {
    let server = mockito::Server::new_async().await;
    // Accepts connections into the backlog but never answers
    let silent = TcpListener::bind("127.0.0.1:0").unwrap();
    let bus = Arc::new(RecordingBus::default());
    let ctx = DeviceContext {
        bus: bus.clone(),
        http: HttpFetcher::new(Duration::from_secs(2)),
    };

    let mut manager = DeviceManager::new(bus.clone());
    manager.add(
        huawei::start(
            &ctx,
            &HuaweiSettings {
                endpoint: server.url(),
                // Self-test may run for 59 s
                poll_rate: Duration::from_secs(60),
                self_test_url: format!("http://{}/", silent.local_addr().unwrap()),
            },
        )
        .unwrap(),
    );
    tokio::time::sleep(Duration::from_millis(200)).await;

    let started = Instant::now();
    manager.teardown(Duration::from_millis(500)).await;

    assert!(started.elapsed() < Duration::from_secs(3));
    let published = bus.published();
    assert_eq!(discovery_topics(&published).len(), 6);
    assert!(published.iter().all(|(_, payload)| payload.is_empty()));
}

use std::time::Duration;

pub const LOG_LEVEL: &str = "info";

pub const MQTT_PORT: u16 = 1883;
pub const MQTT_CLIENT_ID: &str = "hass-bridge";
pub const MQTT_KEEP_ALIVE: Duration = Duration::from_secs(30);
pub const MQTT_CHANNEL_CAPACITY: usize = 32;
pub const MQTT_RECONNECT_DELAY: Duration = Duration::from_secs(2);

pub const FETCH_TIMEOUT: Duration = Duration::from_secs(5);
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);
pub const MIN_POLL_RATE: Duration = Duration::from_secs(1);

pub const ZEVERSOLAR_TLC5000_POLL_RATE: Duration = Duration::from_secs(5);
pub const HUAWEI_HG659_POLL_RATE: Duration = Duration::from_secs(60);
pub const HUAWEI_HG659_SELF_TEST_URL: &str = "https://tpg.com.au";
pub const HUAWEI_HG659_MIN_SELF_TEST_TIMEOUT: Duration = Duration::from_secs(4);

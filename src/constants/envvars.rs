pub const LOG_LEVEL: &str = "LOG_LEVEL";

pub const MQTT_ENDPOINT: &str = "MQTT_ENDPOINT";
pub const MQTT_USER: &str = "MQTT_USER";
pub const MQTT_PASS: &str = "MQTT_PASS";
pub const MQTT_CLIENT_ID: &str = "MQTT_CLIENT_ID";

pub const ZEVERSOLAR_TLC5000_ENDPOINT: &str = "ZEVERSOLAR_TLC5000_ENDPOINT";
pub const ZEVERSOLAR_TLC5000_POLL_RATE: &str = "ZEVERSOLAR_TLC5000_POLL_RATE";
pub const ZEVERSOLAR_TLC5000_TIMEZONE: &str = "ZEVERSOLAR_TLC5000_TIMEZONE";

pub const HUAWEI_HG659_ENDPOINT: &str = "HUAWEI_HG659_ENDPOINT";
pub const HUAWEI_HG659_POLL_RATE: &str = "HUAWEI_HG659_POLL_RATE";
pub const HUAWEI_HG659_SELF_TEST_URL: &str = "HUAWEI_HG659_SELF_TEST_URL";

pub const FETCH_TIMEOUT: &str = "FETCH_TIMEOUT";
pub const HTTP_PORT: &str = "HTTP_PORT";
pub const SHUTDOWN_TIMEOUT: &str = "SHUTDOWN_TIMEOUT";

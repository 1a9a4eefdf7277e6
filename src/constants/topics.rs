/// Discovery prefix the hub listens on
pub const DISCOVERY_PREFIX: &str = "homeassistant";

/// Hub birth/last-will topic; `online` means discovery must be re-sent
pub const HUB_STATUS: &str = "homeassistant/status";
pub const HUB_ONLINE_PAYLOAD: &str = "online";

pub const SENSOR: &str = "sensor";
pub const BINARY_SENSOR: &str = "binary_sensor";

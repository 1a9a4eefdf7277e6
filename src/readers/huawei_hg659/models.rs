use serde::{Deserialize, Serialize};

/// `/api/system/diagnose_internet`, trimmed to the fields the bridge publishes
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "PascalCase")]
pub struct DiagnoseInternet {
    pub connection_status: Option<String>,
    pub err_reason: Option<String>,
    /// Seconds the WAN link has been up
    pub uptime: Option<u64>,
}

/// `/api/system/deviceinfo`
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "PascalCase")]
pub struct DeviceInfo {
    pub device_name: Option<String>,
    pub serial_number: Option<String>,
    pub up_time: Option<u64>,
    pub software_version: Option<String>,
    pub hardware_version: Option<String>,
}

/// The two calls a poll needs; each is absent if its request failed
#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct RouterSummary {
    pub internet: Option<DiagnoseInternet>,
    pub device: Option<DeviceInfo>,
}

impl RouterSummary {
    pub fn is_empty(&self) -> bool {
        self.internet.is_none() && self.device.is_none()
    }
}

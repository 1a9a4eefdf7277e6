use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::interfaces::http::HttpFetcher;

use super::models::{DeviceInfo, DiagnoseInternet, RouterSummary};
use super::HuaweiError;

pub const DIAGNOSE_INTERNET: &str = "/api/system/diagnose_internet";
pub const DEVICE_COUNT: &str = "/api/system/device_count";
pub const WIZARD_WIFI: &str = "/api/system/wizard_wifi";
pub const DEVICE_INFO: &str = "/api/system/deviceinfo";
pub const WANDETECT: &str = "/api/ntwk/wandetect";

const BODY_PREFIX: &str = "while(1); /*";
const BODY_SUFFIX: &str = "*/";

/// Read-only client for the HG659 web API
#[derive(Clone)]
pub struct HuaweiApi {
    http: HttpFetcher,
    base_url: String,
}

/// Strip the anti-JSON-hijacking wrapper the router puts around every body
pub fn unwrap_body(body: &str) -> &str {
    let body = body.trim();
    let body = body.strip_prefix(BODY_PREFIX).unwrap_or(body);
    body.strip_suffix(BODY_SUFFIX).unwrap_or(body)
}

impl HuaweiApi {
    pub fn new(http: HttpFetcher, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, HuaweiError> {
        let response = self.http.get(&format!("{}{}", self.base_url, path)).await?;
        Ok(serde_json::from_str(unwrap_body(&response.body))?)
    }

    /// Like [`Self::get`], logging and swallowing the failure
    async fn get_or_log<T: DeserializeOwned>(&self, path: &str) -> Option<T> {
        match self.get(path).await {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Router API call {} failed: {}", path, e);
                None
            }
        }
    }

    pub async fn diagnose_internet(&self) -> Option<DiagnoseInternet> {
        self.get_or_log(DIAGNOSE_INTERNET).await
    }

    pub async fn device_info(&self) -> Option<DeviceInfo> {
        self.get_or_log(DEVICE_INFO).await
    }

    /// The two calls a poll publishes from, made concurrently
    pub async fn summary(&self) -> RouterSummary {
        let (internet, device) = tokio::join!(self.diagnose_internet(), self.device_info());
        RouterSummary { internet, device }
    }

    /// Every known endpoint, undecoded, for troubleshooting
    pub async fn all(&self) -> Value {
        let mut out = serde_json::Map::new();
        for (key, path) in [
            ("DiagnoseInternet", DIAGNOSE_INTERNET),
            ("DeviceCount", DEVICE_COUNT),
            ("WizardWifi", WIZARD_WIFI),
            ("Deviceinfo", DEVICE_INFO),
            ("Wandetect", WANDETECT),
        ] {
            let value: Option<Value> = self.get_or_log(path).await;
            out.insert(key.to_string(), value.unwrap_or(Value::Null));
        }
        Value::Object(out)
    }
}

use serde::Serialize;

use crate::interfaces::http::HttpFetcher;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SelfTest {
    pub success: bool,
    pub message: Option<String>,
}

/// Probe an outside URL through the router
///
/// Only a timeout counts against connectivity. Any other failure (TLS, a 4xx from
/// the far end) still proves packets are getting out, so it is logged and passed.
pub async fn self_test(http: &HttpFetcher, url: &str) -> SelfTest {
    match http.get(url).await {
        Ok(_) => SelfTest {
            success: true,
            message: None,
        },
        Err(e) if e.is_timeout() => SelfTest {
            success: false,
            message: Some(e.to_string()),
        },
        Err(e) => {
            log::warn!("Connectivity self-test against {} failed: {}", url, e);
            SelfTest {
                success: true,
                message: None,
            }
        }
    }
}

//! Zeversolar TLC5000 inverter status page
//!
//! The inverter serves a fixed-position, newline separated page at `/home.cgi`.
//! See [`parse::parse_in`] for the field layout and how unreadable fields degrade.
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Serialize, Serializer};

use crate::helpers::to_iso;
use crate::interfaces::http::{FetchError, HttpFetcher};

pub mod parse;

pub use parse::{normalize_decimal, parse, parse_in, parse_timestamp_in};

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct InverterReading {
    pub registry_id: String,
    pub registry_key: String,
    pub hardware_version: String,
    pub software_version: String,
    #[serde(serialize_with = "serialize_iso")]
    pub timestamp: Option<DateTime<Utc>>,
    pub cloud_status: String,
    pub serial_number: String,
    pub power_ac: Option<String>,
    /// At least two fractional digits, see [`normalize_decimal`]
    pub energy_today: Option<String>,
    /// Passed through as reported; `OK` while generating
    pub status: String,
}

impl InverterReading {
    /// A page carrying neither measurement is not worth publishing
    pub fn is_usable(&self) -> bool {
        self.power_ac.is_some() || self.energy_today.is_some()
    }

    pub fn last_updated(&self) -> Option<String> {
        self.timestamp.as_ref().map(to_iso)
    }
}

fn serialize_iso<S: Serializer>(
    ts: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match ts {
        Some(ts) => serializer.serialize_str(&to_iso(ts)),
        None => serializer.serialize_none(),
    }
}

/// Fetch and parse one status page
///
/// `timezone` is the zone the inverter clock runs in; `None` means host local time.
pub async fn fetch_reading(
    http: &HttpFetcher,
    endpoint: &str,
    timezone: Option<Tz>,
) -> Result<InverterReading, FetchError> {
    let response = http.get(endpoint).await?;
    log::trace!("Inverter status page: {:?}", response.body);

    Ok(match timezone {
        Some(tz) => parse_in(&response.body, &tz),
        None => parse(&response.body),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    const PAGE: &str =
        "\n\nREG1\nKEY1\nHW1\nSW1\n14:31 02/06/2024\nCloudOK\n\nSN123\n512\n9.3\nOK\n";

    #[tokio::test]
    async fn test_fetch_reading() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/home.cgi")
            .with_body(PAGE)
            .create_async()
            .await;

        let http = HttpFetcher::new(Duration::from_secs(2));
        let endpoint = format!("{}/home.cgi", server.url());
        let reading = fetch_reading(&http, &endpoint, Some(chrono_tz::UTC))
            .await
            .unwrap();

        assert_eq!(reading.serial_number, "SN123");
        assert_eq!(reading.last_updated().as_deref(), Some("2024-06-01T13:30:00.000Z"));
    }

    #[test]
    fn test_reading_serializes_iso_timestamp() {
        let reading = parse_in(PAGE, &Utc);
        let json = serde_json::to_value(&reading).unwrap();
        assert_eq!(json["timestamp"], "2024-06-01T13:30:00.000Z");
        assert_eq!(json["energy_today"], "9.30");

        let unreadable = serde_json::to_value(InverterReading::default()).unwrap();
        assert!(unreadable["timestamp"].is_null());
    }
}

//! Environment-driven process configuration
//!
//! Everything is read once at start-up. Any invalid or missing required value is a
//! [`ConfigError`] and the process must not start.
use std::env;
use std::time::Duration;

use chrono_tz::Tz;
use thiserror::Error;
use url::Url;

use crate::constants::{defaults, envvars};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct MqttSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub client_id_prefix: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ZeversolarSettings {
    pub endpoint: String,
    pub poll_rate: Duration,
    /// Zone the inverter clock runs in; `None` means host local time
    pub timezone: Option<Tz>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HuaweiSettings {
    pub endpoint: String,
    pub poll_rate: Duration,
    pub self_test_url: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub mqtt: MqttSettings,
    pub zeversolar: Option<ZeversolarSettings>,
    pub huawei: Option<HuaweiSettings>,
    pub fetch_timeout: Duration,
    pub http_port: Option<u16>,
    pub shutdown_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Config {
            mqtt: MqttSettings::from_env()?,
            zeversolar: ZeversolarSettings::from_env()?,
            huawei: HuaweiSettings::from_env()?,
            fetch_timeout: fetch_timeout()?,
            http_port: optional(envvars::HTTP_PORT)
                .map(|raw| parse_number(envvars::HTTP_PORT, &raw))
                .transpose()?,
            shutdown_timeout: millis_or(envvars::SHUTDOWN_TIMEOUT, defaults::SHUTDOWN_TIMEOUT)?,
        })
    }
}

impl MqttSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let endpoint = optional(envvars::MQTT_ENDPOINT)
            .ok_or(ConfigError::Missing(envvars::MQTT_ENDPOINT))?;
        let url = parse_url(envvars::MQTT_ENDPOINT, &endpoint)?;

        match url.scheme() {
            "mqtt" | "tcp" => {}
            other => {
                return Err(ConfigError::Invalid {
                    var: envvars::MQTT_ENDPOINT,
                    reason: format!("unsupported scheme '{other}'; expected mqtt:// or tcp://"),
                })
            }
        }

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or(ConfigError::Invalid {
                var: envvars::MQTT_ENDPOINT,
                reason: "missing host".into(),
            })?
            .to_string();

        // Explicit variables win over credentials embedded in the URL
        let url_user = Some(url.username().to_string()).filter(|u| !u.is_empty());
        let url_pass = url.password().map(str::to_string);

        Ok(MqttSettings {
            host,
            port: url.port().unwrap_or(defaults::MQTT_PORT),
            username: optional(envvars::MQTT_USER).or(url_user),
            password: optional(envvars::MQTT_PASS).or(url_pass),
            client_id_prefix: optional(envvars::MQTT_CLIENT_ID)
                .unwrap_or_else(|| defaults::MQTT_CLIENT_ID.to_string()),
        })
    }
}

impl ZeversolarSettings {
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(endpoint) = optional(envvars::ZEVERSOLAR_TLC5000_ENDPOINT) else {
            return Ok(None);
        };
        parse_url(envvars::ZEVERSOLAR_TLC5000_ENDPOINT, &endpoint)?;

        let timezone = optional(envvars::ZEVERSOLAR_TLC5000_TIMEZONE)
            .map(|raw| {
                raw.parse::<Tz>().map_err(|e| ConfigError::Invalid {
                    var: envvars::ZEVERSOLAR_TLC5000_TIMEZONE,
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        Ok(Some(ZeversolarSettings {
            endpoint,
            poll_rate: poll_rate(
                envvars::ZEVERSOLAR_TLC5000_POLL_RATE,
                defaults::ZEVERSOLAR_TLC5000_POLL_RATE,
            )?,
            timezone,
        }))
    }
}

impl HuaweiSettings {
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(endpoint) = optional(envvars::HUAWEI_HG659_ENDPOINT) else {
            return Ok(None);
        };
        parse_url(envvars::HUAWEI_HG659_ENDPOINT, &endpoint)?;

        let self_test_url = optional(envvars::HUAWEI_HG659_SELF_TEST_URL)
            .unwrap_or_else(|| defaults::HUAWEI_HG659_SELF_TEST_URL.to_string());
        parse_url(envvars::HUAWEI_HG659_SELF_TEST_URL, &self_test_url)?;

        Ok(Some(HuaweiSettings {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            poll_rate: poll_rate(
                envvars::HUAWEI_HG659_POLL_RATE,
                defaults::HUAWEI_HG659_POLL_RATE,
            )?,
            self_test_url,
        }))
    }

    /// The self-test gets most of a poll period, but never less than a few seconds
    pub fn self_test_timeout(&self) -> Duration {
        self.poll_rate
            .saturating_sub(Duration::from_secs(1))
            .max(defaults::HUAWEI_HG659_MIN_SELF_TEST_TIMEOUT)
    }
}

pub fn fetch_timeout() -> Result<Duration, ConfigError> {
    millis_or(envvars::FETCH_TIMEOUT, defaults::FETCH_TIMEOUT)
}

/// Unset and empty are the same thing
fn optional(var: &'static str) -> Option<String> {
    env::var(var).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_number<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| ConfigError::Invalid {
        var,
        reason: format!("'{raw}': {e}"),
    })
}

fn parse_url(var: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::Invalid {
        var,
        reason: format!("'{raw}': {e}"),
    })
}

fn millis_or(var: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    match optional(var) {
        Some(raw) => Ok(Duration::from_millis(parse_number::<u64>(var, &raw)?)),
        None => Ok(default),
    }
}

/// The scheduler applies no floor of its own, so clamp here
fn poll_rate(var: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    let rate = millis_or(var, default)?;
    if rate < defaults::MIN_POLL_RATE {
        log::warn!(
            "{var} of {}ms is below the minimum; using {}ms",
            rate.as_millis(),
            defaults::MIN_POLL_RATE.as_millis()
        );
    }
    Ok(rate.max(defaults::MIN_POLL_RATE))
}

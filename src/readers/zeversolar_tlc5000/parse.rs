use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use super::InverterReading;

/// Line count of a complete status page, trailing empty line included
pub const EXPECTED_FIELDS: usize = 14;

const REGISTRY_ID: usize = 2;
const REGISTRY_KEY: usize = 3;
const HARDWARE_VERSION: usize = 4;
const SOFTWARE_VERSION: usize = 5;
const TIMESTAMP: usize = 6;
const CLOUD_STATUS: usize = 7;
const SERIAL_NUMBER: usize = 9;
const POWER_AC: usize = 10;
const ENERGY_TODAY: usize = 11;
const STATUS: usize = 12;

static TIMESTAMP_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{2}):(\d{2}) (\d{2})/(\d{2})/(\d{4})").unwrap());

/// Parse a status page, reading its clock as host local time
pub fn parse(raw: &str) -> InverterReading {
    parse_in(raw, &Local)
}

/// Parse a status page whose clock runs in `tz`
///
/// Never fails: a field the page does not carry comes back empty, and a timestamp
/// that cannot be read comes back as `None`.
pub fn parse_in<Tz: TimeZone>(raw: &str, tz: &Tz) -> InverterReading {
    let fields: Vec<&str> = raw
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).trim())
        .collect();

    if fields.len() != EXPECTED_FIELDS {
        log::warn!(
            "Inverter status page has {} lines, expected {}: {:?}",
            fields.len(),
            EXPECTED_FIELDS,
            raw
        );
    }

    let field = |idx: usize| fields.get(idx).copied().unwrap_or_default();
    let optional = |idx: usize| Some(field(idx)).filter(|v| !v.is_empty()).map(str::to_string);

    let raw_timestamp = field(TIMESTAMP);
    let timestamp = parse_timestamp_in(raw_timestamp, tz);
    if timestamp.is_none() {
        log::warn!("Could not read inverter timestamp {:?}", raw_timestamp);
    }

    InverterReading {
        registry_id: field(REGISTRY_ID).to_string(),
        registry_key: field(REGISTRY_KEY).to_string(),
        hardware_version: field(HARDWARE_VERSION).to_string(),
        software_version: field(SOFTWARE_VERSION).to_string(),
        timestamp,
        cloud_status: field(CLOUD_STATUS).to_string(),
        serial_number: field(SERIAL_NUMBER).to_string(),
        power_ac: optional(POWER_AC),
        energy_today: normalize_decimal(field(ENERGY_TODAY)),
        status: field(STATUS).to_string(),
    }
}

/// Read an inverter `HH:MM DD/MM/YYYY` clock value
///
/// The firmware reports every field except the year one higher than the wall
/// clock, so hour, minute, day and month are each taken minus one. Out-of-range
/// results roll over into the neighbouring unit: `00:00 01/01/2024` lands on
/// 2023-12-30 22:59. A wall-clock time skipped by a daylight-saving change is
/// moved forward by the hour that was skipped.
pub fn parse_timestamp_in<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    let caps = TIMESTAMP_PATTERN.captures(raw)?;
    let number = |idx: usize| caps[idx].parse::<i64>().ok();
    let (hour, minute, day, month, year) =
        (number(1)?, number(2)?, number(3)?, number(4)?, number(5)?);

    let month_index = year * 12 + (month - 1);
    let first_of_month = NaiveDate::from_ymd_opt(
        i32::try_from(month_index.div_euclid(12)).ok()?,
        u32::try_from(month_index.rem_euclid(12) + 1).ok()?,
        1,
    )?;

    let local = first_of_month.and_time(NaiveTime::MIN)
        + Duration::days(day - 2)
        + Duration::hours(hour - 1)
        + Duration::minutes(minute - 1);

    tz.from_local_datetime(&local)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(local + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Render a decimal with at least two fractional digits
///
/// `9.3` becomes `9.30`, `12` becomes `12.00`; longer fractions are kept as they
/// are. An empty value stays absent.
pub fn normalize_decimal(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.split_once('.') {
        Some((whole, fraction)) => Some(format!("{whole}.{fraction:0<2}")),
        None => Some(format!("{raw}.00")),
    }
}

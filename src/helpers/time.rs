use chrono::{DateTime, Local, SecondsFormat, TimeZone, Utc};

/// Render an instant the way the hub expects: UTC, millisecond precision, `Z` suffix
pub fn to_iso(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn now_iso() -> String {
    to_iso(&Utc::now())
}

/// Midnight at the start of the current local day, as an ISO instant
pub fn midnight() -> String {
    midnight_of(&Local::now())
}

pub fn midnight_of<Tz: TimeZone>(now: &DateTime<Tz>) -> String {
    let start = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|naive| now.timezone().from_local_datetime(&naive).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        // Midnight can fall in a DST gap; the current instant is the best we have
        .unwrap_or_else(|| now.with_timezone(&Utc));
    to_iso(&start)
}

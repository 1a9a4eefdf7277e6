use once_cell::sync::Lazy;
use regex::Regex;

static NON_ALPHANUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z0-9]").unwrap());

/// Strip everything but ASCII letters and digits from each part, then join with `separator`
///
/// Used for discovery `unique_id`s, so the output must stay stable across releases:
/// `slug("_", &["zeversolar", "power_ac"])` is `zeversolar_powerac`.
pub fn slug(separator: &str, parts: &[&str]) -> String {
    parts
        .iter()
        .map(|part| NON_ALPHANUMERIC.replace_all(part, "").into_owned())
        .collect::<Vec<_>>()
        .join(separator)
}

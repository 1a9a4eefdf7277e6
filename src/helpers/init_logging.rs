use env_logger::Env;

use crate::constants::{defaults, envvars};

/// Initialize the global logger
///
/// Respects LOG_LEVEL, which accepts anything env_logger understands
/// (e.g. "debug" or "hass_bridge=trace,rumqttc=warn"). Defaults to "info".
pub fn init_logging() {
    env_logger::Builder::from_env(Env::default().filter_or(envvars::LOG_LEVEL, defaults::LOG_LEVEL))
        .format_target(true)
        .init();
}

//! One-shot reads that print what a device reports, without touching the bus
use anyhow::{anyhow, Result};
use serde_json::json;

use crate::config::{self, HuaweiSettings, ZeversolarSettings};
use crate::constants::envvars;
use crate::interfaces::http::HttpFetcher;
use crate::readers::huawei_hg659::{self_test, HuaweiApi};
use crate::readers::zeversolar_tlc5000::fetch_reading;

pub async fn read_zeversolar() -> Result<()> {
    let settings = ZeversolarSettings::from_env()?
        .ok_or_else(|| anyhow!("{} is not set", envvars::ZEVERSOLAR_TLC5000_ENDPOINT))?;
    let http = HttpFetcher::new(config::fetch_timeout()?);

    let reading = fetch_reading(&http, &settings.endpoint, settings.timezone).await?;
    println!("{}", serde_json::to_string_pretty(&reading)?);
    Ok(())
}

pub async fn read_huawei() -> Result<()> {
    let settings = HuaweiSettings::from_env()?
        .ok_or_else(|| anyhow!("{} is not set", envvars::HUAWEI_HG659_ENDPOINT))?;
    let api = HuaweiApi::new(HttpFetcher::new(config::fetch_timeout()?), &settings.endpoint);
    let self_test_http = HttpFetcher::new(settings.self_test_timeout());

    let (responses, test) = tokio::join!(
        api.all(),
        self_test(&self_test_http, &settings.self_test_url)
    );
    let report = json!({
        "self_test": test,
        "api": responses,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

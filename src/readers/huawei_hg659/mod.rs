//! Huawei HG659 router web API
use thiserror::Error;

use crate::interfaces::http::FetchError;

pub mod api;
pub mod models;
mod connectivity;

pub use api::HuaweiApi;
pub use models::{DeviceInfo, DiagnoseInternet, RouterSummary};
pub use connectivity::{self_test, SelfTest};

#[derive(Error, Debug)]
pub enum HuaweiError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

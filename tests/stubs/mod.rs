#![allow(dead_code)]
// Each integration test binary uses a different subset of these

use std::time::Duration;

pub mod bus;
pub mod payloads;

/// Poll `condition` until it holds, panicking after a few seconds
pub async fn wait_for(condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(tokio::time::Instant::now() < deadline, "condition not met in time");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

//! Inbound HTTP listener for probes and troubleshooting
//!
//! `GET /readyz` reports per-device poll health. Any other request is logged in
//! full and answered `200`, which makes it easy to see what a device or webhook
//! is sending.
use std::collections::BTreeMap;
use std::future::Future;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::routing::get;
use axum::{Json, Router};
use tokio::net::TcpListener;

use crate::devices::manager::{DeviceManager, DeviceStatus};

pub fn router(manager: Arc<DeviceManager>) -> Router {
    Router::new()
        .route("/readyz", get(readiness_probe))
        .fallback(log_request)
        .with_state(manager)
}

async fn readiness_probe(
    State(manager): State<Arc<DeviceManager>>,
) -> Json<BTreeMap<String, DeviceStatus>> {
    let health = manager.health();
    for (name, status) in health.iter().filter(|(_, s)| !s.healthy) {
        log::debug!("Readiness: {} unhealthy: {:?}", name, status.data);
    }
    Json(health)
}

async fn log_request(method: Method, uri: Uri, headers: HeaderMap, body: String) -> StatusCode {
    log::info!(
        "Received {} {} headers={:?} body={:?}",
        method,
        uri,
        headers,
        body
    );
    StatusCode::OK
}

/// Bind `port` on all interfaces and serve until `shutdown` resolves
pub async fn serve<F>(port: u16, manager: Arc<DeviceManager>, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port))).await?;
    serve_on(listener, manager, shutdown).await
}

pub async fn serve_on<F>(
    listener: TcpListener,
    manager: Arc<DeviceManager>,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    log::info!("Diagnostics listening on {}", listener.local_addr()?);
    axum::serve(listener, router(manager))
        .with_graceful_shutdown(shutdown)
        .await?;
    log::info!("Diagnostics listener stopped");
    Ok(())
}

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::oneshot;
use tokio::time::timeout;

use crate::config::Config;
use crate::devices::{huawei, zeversolar, DeviceContext, DeviceManager};
use crate::interfaces::diagnostics;
use crate::interfaces::http::HttpFetcher;
use crate::interfaces::mqtt::MqttBus;

/// Run the bridge until SIGINT or SIGTERM, then tear everything down
pub async fn start(config: Config) -> Result<()> {
    let bus = Arc::new(MqttBus::connect(&config.mqtt));
    let ctx = DeviceContext {
        bus: bus.clone(),
        http: HttpFetcher::new(config.fetch_timeout),
    };

    let mut manager = DeviceManager::new(bus.clone());
    if let Some(settings) = &config.zeversolar {
        manager.add(zeversolar::start(&ctx, settings)?);
    }
    if let Some(settings) = &config.huawei {
        manager.add(huawei::start(&ctx, settings)?);
    }
    if manager.devices().is_empty() {
        log::warn!("No devices configured; set at least one device endpoint");
    }
    let manager = Arc::new(manager);

    let hub_listener = manager.listen_for_hub().await;
    manager.announce().await;

    let (stop_diagnostics, diagnostics_stopped) = oneshot::channel::<()>();
    let diagnostics = config.http_port.map(|port| {
        tokio::spawn(diagnostics::serve(port, manager.clone(), async move {
            let _ = diagnostics_stopped.await;
        }))
    });

    shutdown_signal().await?;
    log::info!("Shutting down");

    if let Some(listener) = hub_listener {
        listener.abort();
    }

    manager.teardown(config.shutdown_timeout).await;

    let _ = stop_diagnostics.send(());
    if let Some(diagnostics) = diagnostics {
        match timeout(config.shutdown_timeout, diagnostics).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(e))) => log::error!("Diagnostics listener failed: {}", e),
            Ok(Err(e)) => log::error!("Diagnostics listener task failed: {}", e),
            Err(_) => log::warn!("Diagnostics listener did not stop in time"),
        }
    }

    bus.disconnect(config.shutdown_timeout).await;
    log::info!("Shutdown complete");
    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result?,
        _ = terminate.recv() => {}
    }
    Ok(())
}

#[cfg(not(unix))]
async fn shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

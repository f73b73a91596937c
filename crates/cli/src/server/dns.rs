use dns_relay_infrastructure::dns::{DnsListener, DnsServerHandler, ListenerConfig};
use std::sync::Arc;
use tracing::{error, info};

/// Serve until Ctrl-C or SIGTERM, then stop the listener.
pub async fn start_dns_server(
    config: ListenerConfig,
    handler: DnsServerHandler,
) -> anyhow::Result<()> {
    let listener = DnsListener::bind(config, Arc::new(handler)).map_err(|e| {
        error!(error = %e, "Failed to start DNS listener");
        anyhow::anyhow!(e)
    })?;

    let handle = listener.spawn();
    info!(bind_address = %handle.local_addr(), "DNS server ready");

    shutdown_signal().await;

    info!("Shutdown signal received, stopping DNS listener");
    handle.stop().await;
    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(e) => {
            error!(error = %e, "Failed to install SIGTERM handler");
            wait_for_ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = wait_for_ctrl_c() => {},
        _ = terminate.recv() => {},
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

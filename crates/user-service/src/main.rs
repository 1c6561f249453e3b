use std::net::SocketAddr;
use tracing::{error, info};
use user_service::bootstrap;
use user_service::config::Config;
use user_service::errors::StartupError;
use user_service::monitoring::{GceMetadataClient, ProcessEnvironment};
use user_service::observability::{
    init_tracing,
    metrics::{init_metrics_recorder, metrics_router},
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing()?;

    info!("Starting User Service");

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!("Configuration loaded successfully");

    let metadata = GceMetadataClient::new(
        config.metadata_endpoint.clone(),
        config.metadata_timeout,
    )
    .map_err(|e| {
        error!("Failed to create metadata client: {}", e);
        e
    })?;

    info!(endpoint = metadata.endpoint(), "Metadata client ready");

    let ready = bootstrap::run(&config, &ProcessEnvironment, &metadata)
        .await
        .map_err(|e| {
            error!("Startup failed: {}", e);
            e
        })?;

    // The recorder carries the resource labels, so it can only be installed
    // once they are known. Startup steps are counted right after.
    let prometheus_handle = init_metrics_recorder(&ready.monitored_resource).map_err(|e| {
        let e = StartupError::Metrics(e);
        error!("Failed to initialize metrics: {}", e);
        e
    })?;
    ready.record_startup_metrics();

    let metrics_addr: SocketAddr = config.metrics_bind_address.parse().map_err(|e| {
        error!(error = %e, addr = %config.metrics_bind_address, "Invalid metrics bind address");
        StartupError::Metrics(format!("Invalid metrics bind address: {e}"))
    })?;

    // Bind before reporting ready to fail fast on bind errors
    let listener = tokio::net::TcpListener::bind(metrics_addr)
        .await
        .map_err(|e| {
            error!(error = %e, addr = %metrics_addr, "Failed to bind metrics server");
            StartupError::Metrics(format!("Failed to bind metrics server to {metrics_addr}: {e}"))
        })?;

    info!(
        resource_type = ready.monitored_resource.resource_type,
        project_id = %ready.monitored_resource.project_id,
        token_expiry_seconds = ready.token_issuer.expiry_seconds(),
        metrics_addr = %metrics_addr,
        "User Service ready"
    );

    axum::serve(listener, metrics_router(prometheus_handle))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("User Service shutting down");
        })
        .await?;

    Ok(())
}

use anyhow::{Context, Result};
use dojo_service::api::{start_api_server, AppState};
use dojo_service::{
    AiProcessor, Config, Discovery, HttpInferenceClient, IdentityService, PgStore,
    S3ObjectStore, SessionKeys, SocialService, UploadOrchestrator, VideoLibrary,
};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    init_tracing(&config.service.log_level);

    info!(service = %config.service.name, "Starting Dojo service");

    init_metrics(config.service.metrics_port)?;

    let store = Arc::new(
        PgStore::new(&config.database)
            .await
            .context("Failed to initialize database store")?,
    );

    if config.database.run_migrations {
        store
            .run_migrations()
            .await
            .context("Failed to run database migrations")?;
    }

    let object_store = Arc::new(
        S3ObjectStore::new(&config.object_store)
            .await
            .context("Failed to initialize object store")?,
    );

    let inference = Arc::new(HttpInferenceClient::new(&config.inference));

    let uploads = Arc::new(UploadOrchestrator::new(
        object_store.clone(),
        config.upload.clone(),
    ));

    let library = Arc::new(VideoLibrary::new(
        store.clone(),
        store.clone(),
        uploads.clone(),
    ));

    let processor = Arc::new(
        AiProcessor::new(
            store.clone(),
            store.clone(),
            object_store.clone(),
            inference,
            config.inference.default_model.clone(),
        )
        .with_signed_url_ttl(config.signed_url_expiry()),
    );

    let social = Arc::new(SocialService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        config.feed.clone(),
    ));

    let identity = Arc::new(IdentityService::new(
        store.clone(),
        uploads,
        SessionKeys::from_config(&config.auth),
    ));

    let api_state = AppState {
        library,
        processor,
        social,
        discovery: Arc::new(Discovery::new(store.clone())),
        identity,
        database: store,
    };

    let api_config = config.api.clone();
    let upload_config = config.upload.clone();
    let api_handle = tokio::spawn(async move {
        if let Err(e) = start_api_server(api_state, &api_config, &upload_config).await {
            error!(error = %e, "API server error");
        }
    });

    info!("Dojo service started successfully");

    shutdown_signal().await;

    info!("Shutting down Dojo service");
    api_handle.abort();
    info!("Dojo service stopped");

    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().json())
        .init();
}

/// Initialize Prometheus metrics exporter
fn init_metrics(port: u16) -> Result<()> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus metrics exporter")?;

    info!(port = port, "Prometheus metrics exporter started");
    Ok(())
}

/// Wait for shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C signal"),
        _ = terminate => info!("Received SIGTERM signal"),
    }
}

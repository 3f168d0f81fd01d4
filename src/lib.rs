pub mod api;
pub mod config;
pub mod consultations;
pub mod db;
pub mod models;
pub mod patients;
pub mod pipeline;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::api::{start_api_server, ApiContext, ServerError};
use crate::config::{AppConfig, ConfigError};
use crate::db::{DatabaseError, KvStore};
use crate::pipeline::triage::{InvocationError, OllamaClient, TriageClassifier, TriageCoordinator};

/// Failures that stop the service before or while serving.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Failed to open store: {0}")]
    Database(#[from] DatabaseError),
    #[error("Failed to create model client: {0}")]
    ModelClient(#[from] InvocationError),
    #[error("Failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error(transparent)]
    Server(#[from] ServerError),
}

/// Load configuration, wire the store and triage pipeline, serve until Ctrl-C.
pub fn run() -> Result<(), StartupError> {
    let env_file_error = config::load_env_file();
    let config = AppConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.default_log_filter())),
        )
        .init();

    if let Some(e) = env_file_error {
        tracing::warn!(error = %e, "Ignoring malformed .env file");
    }

    tracing::info!(
        environment = %config.app.environment,
        "{} starting v{}",
        config.app.name,
        config::APP_VERSION
    );

    let store = Arc::new(KvStore::open(&config.database, config.tables.clone())?);

    // The blocking HTTP client must be built and dropped outside the runtime.
    let llm = OllamaClient::from_config(&config.llm)?;
    tracing::info!(
        base_url = llm.base_url(),
        model = %config.llm.model,
        timeout_secs = config.llm.timeout_secs,
        "Model client configured"
    );
    let classifier = TriageClassifier::from_config(Box::new(llm), &config.llm);
    let coordinator = Arc::new(TriageCoordinator::new(
        store.clone(),
        classifier,
        store.clone(),
    ));

    let addr = config.bind_addr();
    let ctx = ApiContext::new(store, coordinator.clone(), Arc::new(config));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let served = runtime.block_on(serve_until_shutdown(ctx, &addr));
    drop(runtime);
    drop(coordinator);

    tracing::info!("Shutdown complete");
    served
}

async fn serve_until_shutdown(ctx: ApiContext, addr: &str) -> Result<(), StartupError> {
    let mut server = start_api_server(ctx, addr).await?;
    tracing::info!(addr = %server.session.server_addr, "Listening");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
    server.shutdown();
    server.wait().await?;
    Ok(())
}

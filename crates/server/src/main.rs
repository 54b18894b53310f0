//! Diabetes predictor - web front-end for a pre-trained diabetes classifier
//!
//! Loads the model once at startup and refuses to serve if it cannot.

use anyhow::Result;
use diabetes_server::{api, config::ServerConfig};
use predictor_lib::{
    health::{components, HealthRegistry},
    load_model,
    observability::{PredictorMetrics, StructuredLogger},
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    let config = ServerConfig::load()?;
    let logger = StructuredLogger::new(&config.instance);
    let model_path = config.model_path.display().to_string();

    let health_registry = HealthRegistry::new();
    health_registry.register(components::HTTP).await;

    let predictor = match load_model(&config.model_path, config.model_sha256.as_deref()) {
        Ok(predictor) => predictor,
        Err(e) => {
            logger.log_model_load_failure(&model_path, &e.to_string());
            return Err(e.into());
        }
    };
    let model_info = predictor.info().clone();
    logger.log_model_loaded(&model_path, &model_info.format, &model_info.version);

    let metrics = PredictorMetrics::new();
    metrics.set_model_info(&model_info.format, &model_info.version);

    health_registry.register(components::MODEL).await;
    health_registry.set_ready(true).await;

    let app_state = Arc::new(api::AppState::new(
        Arc::new(predictor),
        health_registry.clone(),
        metrics,
        logger.clone(),
    ));

    let bind_address = config.bind_address();
    logger.log_startup(SERVER_VERSION, &bind_address);

    let shutdown_logger = logger.clone();
    api::serve(&bind_address, app_state, async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown_logger.log_shutdown("SIGINT received");
        }
        // Stop reporting ready before connections drain
        health_registry.set_ready(false).await;
    })
    .await?;

    info!("Shutting down");
    Ok(())
}

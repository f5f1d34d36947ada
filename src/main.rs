use marketing_predictor::{
    api::{build_router, AppState},
    config::Config,
    ml::{ModelArtifact, PredictionEngine},
    records::NocoDbSource,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration before tracing so the log settings apply
    let config = Config::load()?;

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "marketing_predictor={},tower_http=info",
            config.observability.log_level
        )
        .into()
    });

    if config.observability.json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("Starting marketing-predictor v{}", env!("CARGO_PKG_VERSION"));

    // Load the pre-trained pipeline artifact; immutable for the process lifetime
    let artifact = ModelArtifact::from_path(&config.model.artifact_path)?;
    tracing::info!(
        path = %config.model.artifact_path.display(),
        n_features = artifact.n_features(),
        version = %artifact.version,
        "Model artifact loaded"
    );

    let engine = Arc::new(PredictionEngine::new(artifact)?);

    // Record store adapter (token resolved lazily per request)
    if config.record_source.token().is_none() {
        tracing::warn!(
            token_env = %config.record_source.token_env,
            "Record store token is not set; store-backed endpoints will fail"
        );
    }
    let records = Arc::new(NocoDbSource::new(config.record_source.clone())?);

    let state = AppState::new(
        engine,
        records,
        config.queue.clone(),
        config.record_source.default_limit,
    );

    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("HTTP API server listening on http://{}", addr);
    tracing::info!("   Health check: http://{}/health", addr);
    tracing::info!("   Prediction:   http://{}/predict", addr);
    tracing::info!("   Call queue:   http://{}/v1/queue", addr);

    tokio::select! {
        result = axum::serve(listener, app) => {
            if let Err(e) = result {
                tracing::error!("HTTP server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    tracing::info!("Shutting down gracefully...");
    Ok(())
}

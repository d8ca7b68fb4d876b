use anyhow::Context;
use hygie_risk::{
    api::{build_router, AppState},
    assistant::AssistantClient,
    config::Config,
    risk::{FeatureCatalog, ModelRegistry},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new(&config.observability.log_filter)
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting HygieAI risk service v{}", env!("CARGO_PKG_VERSION"));

    // Load the full model set; a missing artifact aborts startup so a
    // partial risk-model set is never served.
    let registry =
        Arc::new(ModelRegistry::load(&config.models).context("Failed to load risk models")?);
    tracing::info!("✅ Risk models loaded ({} categories)", registry.len());

    let catalog =
        Arc::new(FeatureCatalog::build(&registry).context("Failed to build feature catalog")?);
    tracing::info!(
        "✅ Feature catalog built ({} features: {} diagnosis, {} measurement)",
        catalog.len(),
        catalog.diagnosis_features().len(),
        catalog.measurement_features().len()
    );

    let mut state = AppState::new(registry, catalog);

    if config.assistant.enabled {
        match AssistantClient::new(&config.assistant) {
            Ok(client) => {
                state = state.with_assistant(Arc::new(client));
                tracing::info!("✅ Assistant client initialized");
            }
            Err(e) => {
                tracing::warn!("⚠️  Assistant unavailable: {}", e);
                tracing::warn!("   Continuing without narrative summaries");
            }
        }
    } else {
        tracing::info!("Assistant disabled in configuration");
    }

    let app = build_router(state);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

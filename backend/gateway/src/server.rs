//! Main HTTP Gateway Server.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, instrument};

use sportsgpt_config::SportsGptConfig;
use sportsgpt_core::{ChatProvider, EventStore, Publisher, ResearchProvider, Subscriber};
use sportsgpt_research::{ProviderRegistry, ResearchOrchestrator, chat_provider_from_config};

use crate::housekeeping::Housekeeper;
use crate::{chat_api, health_api, progress_stream, research_api};

/// Application state shared across routes.
#[derive(Clone)]
pub struct GatewayState {
    pub store: Arc<EventStore>,
    pub subscriber: Subscriber,
    pub orchestrator: Arc<ResearchOrchestrator>,
    pub chat: Option<Arc<dyn ChatProvider>>,
    pub started_at: Instant,
}

impl GatewayState {
    pub fn new(
        store: Arc<EventStore>,
        providers: Vec<Arc<dyn ResearchProvider>>,
        research_timeout: Duration,
        chat: Option<Arc<dyn ChatProvider>>,
    ) -> Self {
        let publisher = Publisher::new(store.clone());
        let subscriber = Subscriber::new(store.clone());
        Self {
            store,
            subscriber,
            orchestrator: Arc::new(ResearchOrchestrator::new(
                publisher,
                providers,
                research_timeout,
            )),
            chat,
            started_at: Instant::now(),
        }
    }

    /// Wire a fresh store to the providers named in `config.research.providers`.
    pub fn from_config(config: &SportsGptConfig) -> Self {
        let registry = ProviderRegistry::from_config(config);
        let providers = registry.get_providers(&config.research.providers);
        Self::new(
            Arc::new(EventStore::new()),
            providers,
            config.research.timeout(),
            chat_provider_from_config(config),
        )
    }
}

/// Build the router with every route and middleware layer.
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/research", post(research_api::post_research))
        .route("/research/progress", get(research_api::get_progress))
        .route("/research/events", get(progress_stream::stream_progress))
        .route("/chat", post(chat_api::post_chat))
        .route("/api/health", get(health_api::get_health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start housekeeping and serve until Ctrl-C.
#[instrument(skip(state, housekeeper))]
pub async fn start_server(addr: &str, state: GatewayState, housekeeper: Housekeeper) -> Result<()> {
    let housekeeping = housekeeper.spawn();

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Gateway HTTP server listening on {}", addr);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    housekeeping.abort();
    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

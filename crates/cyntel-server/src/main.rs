//! cyntel HTTP Server
//!
//! Axum-based server exposing the five assistant commands as plain-text
//! endpoints. Providers are selected and configured from the environment.

mod config;
mod handlers;
mod state;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cyntel_advisor::{
    BalanceClient, CoinGeckoClient, CommandPipeline, MarketDataClient, MockBalanceClient,
    MockMarketData, MoralisClient, NarrativeClient,
};
use cyntel_core::LlmProvider;
use cyntel_runtime::{OllamaProvider, OpenAiProvider};

use crate::config::{BalanceBackend, MarketBackend, NarrativeBackend, ServerConfig};
use crate::handlers::{health_check, help, run_command};
use crate::state::AppState;

/// Routes and middleware over the given state
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health & info
        .route("/health", get(health_check))
        .route("/api/help", get(help))

        // Assistant commands
        .route("/api/commands/{command}", post(run_command))

        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment before reading RUST_LOG
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    // Narrative provider; a missing credential aborts startup
    let provider: Arc<dyn LlmProvider> = match config.narrative {
        NarrativeBackend::OpenAi => Arc::new(
            OpenAiProvider::from_env().context("OpenAI narrative provider is not configured")?,
        ),
        NarrativeBackend::Ollama => {
            let ollama = OllamaProvider::from_env();
            tracing::info!(endpoint = %ollama.endpoint(), "Using Ollama");
            Arc::new(ollama)
        }
    };

    match provider.health_check().await {
        Ok(true) => {
            tracing::info!("✓ Connected to {}", provider.name());
            if let Ok(models) = provider.list_models().await {
                let available = models.iter().any(|m| m.id == config.narrative_model);
                tracing::info!(count = models.len(), available, "  Model {}", config.narrative_model);
            }
        }
        Ok(false) | Err(_) => {
            tracing::warn!("⚠ {} not reachable - narrative commands will fail", provider.name());
        }
    }

    // Market data
    let market: Arc<dyn MarketDataClient> = match config.market {
        MarketBackend::CoinGecko => Arc::new(CoinGeckoClient::from_env()?),
        MarketBackend::Mock => Arc::new(MockMarketData::new()),
    };
    if market.health_check().await {
        tracing::info!("✓ Market data: {}", market.name());
    } else {
        tracing::warn!("⚠ Market data provider {} not reachable", market.name());
    }

    // Wallet balances
    let balances: Arc<dyn BalanceClient> = match config.balances {
        BalanceBackend::Moralis => Arc::new(MoralisClient::from_env()?),
        BalanceBackend::Mock => Arc::new(MockBalanceClient::new()),
    };
    tracing::info!("✓ Wallet balances: {}", balances.name());

    let narrator = NarrativeClient::new(provider.clone()).with_model(config.narrative_model.clone());
    let pipeline = CommandPipeline::new(market, balances, narrator);

    // Build application state
    let state = AppState {
        pipeline: Arc::new(pipeline),
        provider,
    };

    let app = build_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 cyntel server running on http://{}", config.bind_addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                  - Health check");
    tracing::info!("  GET  /api/help                - Command list");
    tracing::info!("  POST /api/commands/{{command}}  - Run price | scan | portfolio | trending | signals");

    axum::serve(listener, app).await?;

    Ok(())
}

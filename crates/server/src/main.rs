//! Thin HTTP adapter for the world simulation.
//!
//! Carries no game logic: every request resolves a session, delegates to
//! the runtime, and shapes the response. Catalog violations abort startup;
//! a missing `DEEPSEEK_API_KEY` degrades narration and semantic parsing to
//! their deterministic fallbacks without error.

mod routes;
mod state;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use runtime::{DeepSeekClient, Orchestrator, RuntimeConfig, SaveRepository, SessionStore};

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Catalog violations are fatal at init.
    let catalogs = Arc::new(world_content::load()?);
    let config = RuntimeConfig::from_env();

    let mut orchestrator = Orchestrator::new(catalogs);
    let llm_configured = match DeepSeekClient::from_env() {
        Some(client) => {
            orchestrator = orchestrator.with_llm(client);
            true
        }
        None => {
            info!("DEEPSEEK_API_KEY absent; running on deterministic fallbacks");
            false
        }
    };

    let app_state = Arc::new(AppState {
        sessions: SessionStore::new(),
        orchestrator,
        saves: SaveRepository::new(&config.saves_dir),
        started_at: std::time::Instant::now(),
        llm_configured,
    });

    let router = routes::router(app_state);
    let addr = format!("0.0.0.0:{}", config.port);
    info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

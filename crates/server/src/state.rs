//! Shared application state for the HTTP adapter.

use std::time::Instant;

use runtime::{Orchestrator, SaveRepository, SessionStore};

pub struct AppState {
    pub sessions: SessionStore,
    pub orchestrator: Orchestrator,
    pub saves: SaveRepository,
    pub started_at: Instant,
    pub llm_configured: bool,
}

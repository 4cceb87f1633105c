//! Runtime orchestration for the deterministic world simulation.
//!
//! This crate wires the simulation core to its external collaborators: the
//! session table with one writer per session, the per-turn sequencer, the
//! LLM provider ports (with caching, timeouts, retries, and deterministic
//! fallbacks), the save-file repository, and system-command detection. The
//! HTTP adapter lives in the `server` crate and carries no game logic.

pub mod command;
pub mod config;
pub mod providers;
pub mod saves;
pub mod session;
pub mod turn;

pub use command::{SystemCommand, detect};
pub use config::RuntimeConfig;
pub use providers::{
    DeepSeekClient, FallbackNarrator, GameContext, IntentParser, LegacyParser, NarrationError,
    Narrator, ParseCache, ParserError, QuestNarrativeProvider,
};
pub use saves::{SaveError, SaveFile, SaveInfo, SaveRepository, sanitize_name};
pub use session::SessionStore;
pub use turn::{Orchestrator, TurnError, TurnInput, TurnOutput};

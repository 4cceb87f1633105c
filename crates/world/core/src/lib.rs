//! Deterministic simulation core for a text-driven roguelike world server.
//!
//! This crate owns everything that must be reproducible: the PRNG
//! primitives, the session state model with ordered deltas, the
//! hierarchical world generator, the NPC generator, the action pipeline,
//! the quest constraint engine, and state fingerprinting. It performs no
//! I/O, reads no clocks, and talks to no network; timestamps and external
//! narrative replies are passed in by the runtime layer.

pub mod action;
pub mod catalog;
pub mod fingerprint;
pub mod npc;
pub mod quest;
pub mod rng;
pub mod state;
pub mod worldgen;

pub use action::{
    Action, ActionError, ApplyOutcome, Direction, Intent, QueuedAction, QuestActionKind,
    ShallowKind, TrivialKind, apply_action, present_npcs, validate_intent,
};
pub use catalog::{Biome, CatalogError, Catalogs, SettlementKind};
pub use fingerprint::{inventory_digest, stable_digest, state_digest, update_fingerprints};
pub use npc::{generate_npc, generate_npc_pool};
pub use quest::{Difficulty, Quest, QuestError, QuestLog, QuestStatus};
pub use state::{
    Delta, DeltaLog, DeltaOp, GameState, HistoryEntry, Item, Player, RULESET_REV, SCHEMA_VERSION,
};
pub use worldgen::{init_world, world_gen_step};

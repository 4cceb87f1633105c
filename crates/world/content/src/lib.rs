//! Static, load-time-validated content catalogs.
//!
//! This crate houses the data tables the simulation core draws from: NPC
//! traits and jobs, biome keywords and terrain palettes, settlement size
//! tables and name pools, and the quest difficulty tables. Content is
//! consumed by the runtime at startup and never appears in session state.
//!
//! [`load`] is the production entry point: it validates every catalog
//! invariant and fails fatally on violation. [`catalogs`] skips validation
//! and exists for test fixtures.

mod biomes;
mod jobs;
mod quests;
mod settlements;
mod traits;

pub use biomes::BIOMES;
pub use jobs::JOBS;
pub use quests::{DIFFICULTIES, SIZE_MODIFIERS};
pub use settlements::{
    AVAILABILITY, BUILDING_NAMES, SETTLEMENTS, SETTLEMENT_PREFIXES, SETTLEMENT_SUFFIXES,
};
pub use traits::TRAITS;

use world_core::catalog::{CatalogError, Catalogs};

/// Assembles the full catalog set without validating.
pub fn catalogs() -> Catalogs {
    Catalogs {
        traits: &TRAITS,
        jobs: &JOBS,
        biomes: &BIOMES,
        settlements: &SETTLEMENTS,
        settlement_prefixes: &SETTLEMENT_PREFIXES,
        settlement_suffixes: &SETTLEMENT_SUFFIXES,
        building_names: &BUILDING_NAMES,
        difficulties: &DIFFICULTIES,
        availability: &AVAILABILITY,
        size_modifiers: &SIZE_MODIFIERS,
    }
}

/// Loads and validates the catalogs. Any violation is fatal at startup.
pub fn load() -> Result<Catalogs, CatalogError> {
    let catalogs = catalogs();
    catalogs.validate()?;
    Ok(catalogs)
}

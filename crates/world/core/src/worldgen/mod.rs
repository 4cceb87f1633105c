//! Hierarchical procedural world generation.
//!
//! Three nested layers of spatial granularity: the fixed 8×8 L0 macro grid,
//! per-macro L1 local grids with a sliding streaming window, and L2/L3
//! interiors for settlements, points of interest, and buildings.
//!
//! Everything here is a deterministic function of the world seed and
//! coordinates; two sessions seeded identically observe identical worlds.

mod biome;
mod interior;
mod site_plan;
mod stream;

pub use biome::{detect_biome, seed_from_prompt};
pub use interior::{
    LayerError, enter_l2_from_l1, enter_l3_from_l2, exit_layer, generate_poi, generate_rooms,
    generate_settlement,
};
pub use site_plan::{chebyshev, ensure_site_plan, plan_sites};
pub use stream::{backfill_cells, reveal_sites, stream_window};

use serde_json::json;

use crate::catalog::Catalogs;
use crate::state::world::{ClusterCaps, Dims, MacroCell, Position, L0_SIZE};
use crate::state::{Delta, DeltaLog, GameState};

/// Seeds the L0 macro grid from the opening prompt.
///
/// Detects the macro biome, fixes the world seed (user-provided when given,
/// otherwise hashed from the prompt), and creates all 64 macro entries.
/// A no-op on an already-initialized world.
pub fn init_world(
    state: &mut GameState,
    prompt: &str,
    user_seed: Option<u32>,
    catalogs: &Catalogs,
    log: &mut DeltaLog,
) {
    if state.world.is_initialized() {
        return;
    }

    let biome = detect_biome(prompt, catalogs);
    state.rng_seed = user_seed.unwrap_or_else(|| seed_from_prompt(prompt)) & 0x7FFF_FFFF;
    state.world.macro_biome = Some(biome);

    for my in 0..L0_SIZE {
        for mx in 0..L0_SIZE {
            let key = MacroCell::key(mx, my);
            state.world.macro_map.insert(
                key.clone(),
                MacroCell {
                    id: key,
                    mx,
                    my,
                    l1: state.world.l1_default,
                    caps: ClusterCaps::default(),
                    biome,
                    site_plan: None,
                },
            );
        }
    }

    log.push(Delta::set("/rng_seed", json!(state.rng_seed)));
    log.push(Delta::set("/world/macro_biome", json!(biome)));
    log.push(Delta::set("/world/macro", json!(&state.world.macro_map)));
}

/// Runs one full worldgen pass at the player's position: site planning
/// (cached), window hydration and eviction, site reveal, and terrain
/// backfill. Idempotent while the player stands still.
pub fn world_gen_step(state: &mut GameState, catalogs: &Catalogs, log: &mut DeltaLog) {
    if !state.world.is_initialized() {
        return;
    }
    state.world.normalize_cell_keys();
    let pos = state.world.position;
    let plan = ensure_site_plan(&mut state.world, state.rng_seed, pos.mx, pos.my, catalogs);
    stream_window(state, log);
    reveal_sites(state, &plan, log);
    backfill_cells(state, catalogs, log);
}

/// Applies a one-step cardinal move, crossing macro boundaries where the
/// L1 grid ends. Off-world movement is a silent no-op (`WORLD_WRAP` is
/// false). Returns the new position, unchanged when the move was clamped.
pub fn step_position(position: Position, dims: Dims, dx: i32, dy: i32) -> Position {
    let mut next = position;
    next.lx += dx;
    next.ly += dy;

    if next.lx < 0 {
        if next.mx > 0 {
            next.mx -= 1;
            next.lx = dims.w - 1;
        } else {
            return position;
        }
    } else if next.lx >= dims.w {
        if next.mx < L0_SIZE - 1 {
            next.mx += 1;
            next.lx = 0;
        } else {
            return position;
        }
    }

    if next.ly < 0 {
        if next.my > 0 {
            next.my -= 1;
            next.ly = dims.h - 1;
        } else {
            return position;
        }
    } else if next.ly >= dims.h {
        if next.my < L0_SIZE - 1 {
            next.my += 1;
            next.ly = 0;
        } else {
            return position;
        }
    }

    next
}

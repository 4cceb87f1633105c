//! L1 streaming window: hydration, eviction, site reveal, and terrain
//! backfill.
//!
//! The window keeps every cell within Chebyshev distance `R + P` of the
//! player materialized, the subset within `R` hydrated, and deletes current-
//! macro cells that fall outside the window. Revealed sites never unreveal.

use serde_json::json;

use crate::catalog::Catalogs;
use crate::rng::derive_seed;
use crate::state::world::{Cell, CellOffset, Site, SitePlan};
use crate::state::{Delta, DeltaLog, GameState};

/// Runs the hydration/eviction pass for the player's current position.
pub fn stream_window(state: &mut GameState, log: &mut DeltaLog) {
    let pos = state.world.position;
    let dims = state.world.l1_dims(pos.mx, pos.my);
    let r = state.world.stream.r;
    let reach = r + state.world.stream.p;

    for dy in -reach..=reach {
        for dx in -reach..=reach {
            let (lx, ly) = (pos.lx + dx, pos.ly + dy);
            if lx < 0 || ly < 0 || lx >= dims.w || ly >= dims.h {
                continue;
            }
            let dist = dx.abs().max(dy.abs());
            let hydrated = dist <= r;
            let key = Cell::key(pos.mx, pos.my, lx, ly);

            match state.world.cells.get_mut(&key) {
                Some(cell) => {
                    let mut changed = false;
                    if !cell.known {
                        cell.known = true;
                        changed = true;
                    }
                    if cell.hydrated != hydrated {
                        cell.hydrated = hydrated;
                        changed = true;
                    }
                    if changed {
                        let value = json!(&*cell);
                        log.push(Delta::set(format!("/world/cells/{key}"), value));
                        log.cell_rev = true;
                    }
                }
                None => {
                    let mut cell = Cell::new(pos.mx, pos.my, lx, ly);
                    cell.known = true;
                    cell.hydrated = hydrated;
                    log.push(Delta::add(format!("/world/cells/{key}"), json!(&cell)));
                    log.cell_rev = true;
                    state.world.cells.insert(key, cell);
                }
            }
        }
    }

    // Evict current-macro cells beyond the prefetch radius. Cells belonging
    // to other macros are left untouched.
    let stale: Vec<String> = state
        .world
        .cells
        .iter()
        .filter(|(_, c)| {
            c.mx == pos.mx
                && c.my == pos.my
                && (c.lx - pos.lx).abs().max((c.ly - pos.ly).abs()) > reach
        })
        .map(|(k, _)| k.clone())
        .collect();
    for key in stale {
        state.world.cells.remove(&key);
        log.push(Delta::del(format!("/world/cells/{key}")));
        log.cell_rev = true;
    }
}

/// Reveals planned sites whose center cell is currently hydrated.
pub fn reveal_sites(state: &mut GameState, plan: &SitePlan, log: &mut DeltaLog) {
    let pos = state.world.position;
    for cluster in &plan.clusters {
        let site_id = format!("site_{}", cluster.cluster_id);
        if state.world.sites.contains_key(&site_id) {
            continue;
        }
        let center_key = Cell::key(pos.mx, pos.my, cluster.center.lx, cluster.center.ly);
        let hydrated = state
            .world
            .cells
            .get(&center_key)
            .is_some_and(|c| c.hydrated);
        if !hydrated {
            continue;
        }

        let site = Site {
            id: site_id.clone(),
            mx: pos.mx,
            my: pos.my,
            cluster_id: cluster.cluster_id.clone(),
            seg_index: cluster.seg_index,
            tier: cluster.tier,
            cells: cluster.cells.clone(),
            promoted: false,
        };
        log.push(Delta::add(format!("/world/sites/{site_id}"), json!(&site)));
        log.site_rev = true;

        // Tag member cells so the action layer can resolve site membership.
        let tag = format!("site:{site_id}");
        for CellOffset { lx, ly } in &cluster.cells {
            let key = Cell::key(pos.mx, pos.my, *lx, *ly);
            if let Some(cell) = state.world.cells.get_mut(&key)
                && !cell.tags.contains(&tag)
            {
                cell.tags.push(tag.clone());
                log.push(Delta::set(format!("/world/cells/{key}"), json!(&*cell)));
            }
        }

        state.world.sites.insert(site_id, site);
    }
}

/// Backfills terrain types and descriptions on hydrated cells.
///
/// Terrain picks are a pure hash of `(seed, "terrain", coords)` into the
/// macro biome's palette; descriptions come from the biome template table.
/// Cells marked `is_custom` are never touched.
pub fn backfill_cells(state: &mut GameState, catalogs: &Catalogs, log: &mut DeltaLog) {
    let Some(biome) = state.world.macro_biome else {
        return;
    };
    let spec = catalogs.biome_spec(biome);
    let seed = state.rng_seed;

    let keys: Vec<String> = state
        .world
        .cells
        .iter()
        .filter(|(_, c)| c.hydrated && !c.is_custom && (c.kind.is_none() || c.description.is_none()))
        .map(|(k, _)| k.clone())
        .collect();

    for key in keys {
        let Some(cell) = state.world.cells.get_mut(&key) else {
            continue;
        };
        let coords = [
            cell.mx.to_string(),
            cell.my.to_string(),
            cell.lx.to_string(),
            cell.ly.to_string(),
        ];

        if cell.kind.is_none() {
            let idx = derive_seed(
                seed,
                &["terrain", &coords[0], &coords[1], &coords[2], &coords[3]],
            ) as usize
                % spec.palette.len();
            let (kind, subtype) = spec.palette[idx];
            cell.kind = Some(kind.to_string());
            cell.subtype = Some(subtype.to_string());
        }
        if cell.description.is_none() {
            let idx = derive_seed(
                seed,
                &["desc", &coords[0], &coords[1], &coords[2], &coords[3]],
            ) as usize
                % spec.templates.len();
            let kind = cell.kind.as_deref().unwrap_or("ground");
            let subtype = cell.subtype.as_deref().unwrap_or("plain");
            let text = spec.templates[idx]
                .replace("${type}", kind)
                .replace("${subtype}", subtype);
            cell.description = Some(text);
        }
        log.push(Delta::set(format!("/world/cells/{key}"), json!(&*cell)));
        log.cell_rev = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worldgen;

    fn seeded_state() -> GameState {
        let catalogs = world_content::catalogs();
        let mut state = GameState::new(0);
        let mut log = DeltaLog::new();
        worldgen::init_world(&mut state, "A windy coast of pine islands.", None, &catalogs, &mut log);
        worldgen::world_gen_step(&mut state, &catalogs, &mut log);
        state
    }

    #[test]
    fn window_covers_prefetch_radius() {
        let state = seeded_state();
        let pos = state.world.position;
        let mut hydrated = 0;
        let mut known = 0;
        for cell in state.world.cells.values() {
            let dist = (cell.lx - pos.lx).abs().max((cell.ly - pos.ly).abs());
            assert!(dist <= 3, "cell {} outside window", cell.id);
            assert!(cell.known);
            if cell.hydrated {
                assert!(dist <= 2);
                hydrated += 1;
            }
            known += 1;
        }
        assert!(hydrated >= 9, "hydrated {hydrated}");
        assert!(known >= 9, "known {known}");
    }

    #[test]
    fn second_pass_is_idempotent() {
        let catalogs = world_content::catalogs();
        let mut state = seeded_state();
        let before = state.world.cells.clone();
        let mut log = DeltaLog::new();
        worldgen::world_gen_step(&mut state, &catalogs, &mut log);
        assert!(log.is_empty(), "expected no deltas, got {:?}", log.deltas());
        assert_eq!(state.world.cells, before);
    }

    #[test]
    fn eviction_respects_boundary_after_movement() {
        let catalogs = world_content::catalogs();
        let mut state = seeded_state();
        state.world.position.lx += 1;
        let mut log = DeltaLog::new();
        worldgen::world_gen_step(&mut state, &catalogs, &mut log);
        let pos = state.world.position;
        for cell in state.world.cells.values() {
            if cell.mx == pos.mx && cell.my == pos.my {
                let dist = (cell.lx - pos.lx).abs().max((cell.ly - pos.ly).abs());
                assert!(dist <= 3, "stale cell {}", cell.id);
            }
        }
    }

    #[test]
    fn hydrated_cells_get_terrain_and_descriptions() {
        let state = seeded_state();
        for cell in state.world.cells.values().filter(|c| c.hydrated) {
            assert!(cell.kind.is_some(), "untyped hydrated cell {}", cell.id);
            assert!(cell.description.is_some());
        }
    }

    #[test]
    fn custom_cells_are_never_overwritten() {
        let catalogs = world_content::catalogs();
        let mut state = seeded_state();
        let pos = state.world.position;
        let key = Cell::key(pos.mx, pos.my, pos.lx, pos.ly);
        {
            let cell = state.world.cells.get_mut(&key).unwrap();
            cell.is_custom = true;
            cell.kind = None;
            cell.description = Some("a hand-written description".to_string());
        }
        let mut log = DeltaLog::new();
        worldgen::world_gen_step(&mut state, &catalogs, &mut log);
        let cell = &state.world.cells[&key];
        assert_eq!(cell.kind, None);
        assert_eq!(cell.description.as_deref(), Some("a hand-written description"));
    }

    #[test]
    fn sites_never_unreveal() {
        let catalogs = world_content::catalogs();
        let mut state = seeded_state();
        // Walk the player far enough that any revealed center dehydrates.
        state.world.position.lx = 0;
        state.world.position.ly = 0;
        let mut log = DeltaLog::new();
        worldgen::world_gen_step(&mut state, &catalogs, &mut log);
        let count_before = state.world.sites.len();
        state.world.position.lx = 11;
        state.world.position.ly = 11;
        let mut log = DeltaLog::new();
        worldgen::world_gen_step(&mut state, &catalogs, &mut log);
        assert!(state.world.sites.len() >= count_before);
    }
}

//! L2/L3 interiors and layer transitions.
//!
//! Settlement interiors are carved once, persisted in `world.settlements`,
//! and reused by id on every later visit. POI interiors and building rooms
//! follow the same create-once discipline.

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::catalog::{BuildingPurpose, Catalogs, SettlementKind};
use crate::npc::generate_npc_pool;
use crate::rng::{KeyedRng, derive_seed};
use crate::state::world::{
    Building, Cell, Npc, PoiInterior, Room, Settlement, SubPosition,
};
use crate::state::{Delta, DeltaLog, GameState};

/// Errors raised by layer transitions.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LayerError {
    #[error("world has not been initialized")]
    WorldNotInitialized,

    #[error("no settlement is active at layer 2")]
    NotInSettlement,

    #[error("building {0:?} does not exist in the active settlement")]
    BuildingNotFound(String),

    #[error("already at the outermost layer")]
    AlreadyOutside,
}

/// Share of the NPC pool assigned to street slots.
const STREET_SHARE: f64 = 0.7;

fn purpose_for_index(rng: &mut KeyedRng) -> BuildingPurpose {
    let weights = [
        (BuildingPurpose::House, 0.50),
        (BuildingPurpose::Shop, 0.20),
        (BuildingPurpose::Tavern, 0.15),
        (BuildingPurpose::Temple, 0.10),
        (BuildingPurpose::Guildhall, 0.04),
        (BuildingPurpose::Palace, 0.01),
    ];
    let r = rng.next_f64();
    let idx = crate::rng::weighted_index(r, &weights.map(|(_, w)| w));
    weights[idx].0
}

/// Builds a settlement interior from its id, kind, seed, and NPC pool.
///
/// The grid is `size×size` with a "+" of streets through the middle;
/// buildings scatter over non-street cells with bounded retries; NPCs split
/// 70% onto street slots (round-robin in insertion order) and the remainder
/// round-robin over buildings.
pub fn generate_settlement(
    settlement_id: &str,
    kind: SettlementKind,
    world_seed: u32,
    mut npcs: Vec<Npc>,
    catalogs: &Catalogs,
) -> Settlement {
    let spec = catalogs.settlement_spec(kind);
    let size = spec.interior_size as i32;
    let mid = size / 2;

    let mut grid: Vec<Vec<String>> = (0..size)
        .map(|y| {
            (0..size)
                .map(|x| {
                    if x == mid || y == mid {
                        "street".to_string()
                    } else {
                        "empty".to_string()
                    }
                })
                .collect()
        })
        .collect();

    let mut buildings = Vec::new();
    for i in 0..spec.building_count {
        let mut rng = KeyedRng::new(
            world_seed,
            &["bld", settlement_id, &i.to_string()],
        );
        let purpose = purpose_for_index(&mut rng);

        // Bounded scatter: give up on a crowded grid rather than spin.
        let mut placed = None;
        for _ in 0..50 {
            let x = rng.next_range(0, i64::from(size - 1)) as i32;
            let y = rng.next_range(0, i64::from(size - 1)) as i32;
            if grid[y as usize][x as usize] == "empty" {
                placed = Some((x, y));
                break;
            }
        }
        let Some((x, y)) = placed else { continue };

        let pool = catalogs
            .building_names
            .iter()
            .find(|p| p.purpose == purpose)
            .map(|p| p.names)
            .unwrap_or(&["the old hall"]);
        let name = pool[crate::rng::choice_index(rng.next_f64(), pool.len())].to_string();

        let id = format!("{settlement_id}_b{i}");
        grid[y as usize][x as usize] = id.clone();
        buildings.push(Building {
            id,
            name,
            purpose,
            x,
            y,
            rooms: Vec::new(),
            npc_ids: Vec::new(),
        });
    }

    // Street slots in insertion order (row-major).
    let street_slots: Vec<(i32, i32)> = (0..size)
        .flat_map(|y| (0..size).map(move |x| (x, y)))
        .filter(|(x, y)| grid[*y as usize][*x as usize] == "street")
        .collect();

    let street_count = (npcs.len() as f64 * STREET_SHARE) as usize;
    for (i, npc) in npcs.iter_mut().enumerate().take(street_count) {
        if !street_slots.is_empty() {
            let (x, y) = street_slots[i % street_slots.len()];
            npc.schedule = Some(json!({ "post": "street", "x": x, "y": y }));
        }
    }
    if !buildings.is_empty() {
        for (i, npc) in npcs.iter().enumerate().skip(street_count) {
            let slot = (i - street_count) % buildings.len();
            buildings[slot].npc_ids.push(npc.id.clone());
        }
    }

    let mut name_rng = KeyedRng::new(world_seed, &[settlement_id, "name"]);
    let prefix = catalogs.settlement_prefixes
        [crate::rng::choice_index(name_rng.next_f64(), catalogs.settlement_prefixes.len())];
    let suffix = catalogs.settlement_suffixes
        [crate::rng::choice_index(name_rng.next_f64(), catalogs.settlement_suffixes.len())];
    let name = format!("{prefix}{suffix}");

    let npc_count = (npcs.len() as u32).max(1);
    let mut pop_rng = KeyedRng::new(world_seed, &[settlement_id, "pop"]);
    let population =
        npc_count * 10 + pop_rng.next_range(0, i64::from(npc_count * 5)) as u32;

    // Promote one resident to quest giver: the highest-standing local.
    if let Some(giver) = npcs
        .iter_mut()
        .min_by_key(|n| n.tier)
    {
        giver.is_quest_giver = true;
        giver.quest_giver_rank = 3;
    }

    Settlement {
        id: settlement_id.to_string(),
        name,
        kind,
        population,
        width: size,
        height: size,
        grid,
        buildings,
        npcs,
        tier: kind,
    }
}

/// Builds a POI interior with 0..2 scattered hazards.
pub fn generate_poi(poi_id: &str, world_seed: u32) -> PoiInterior {
    const HAZARDS: [&str; 3] = ["water", "collapse", "gas"];
    const SIZE: i32 = 6;

    let mut rng = KeyedRng::new(world_seed, &["poi", poi_id]);
    let count = rng.next_range(0, 2);
    let hazards = (0..count)
        .map(|_| {
            let kind = HAZARDS[rng.next_range(0, 2) as usize].to_string();
            let x = rng.next_range(0, i64::from(SIZE - 1)) as i32;
            let y = rng.next_range(0, i64::from(SIZE - 1)) as i32;
            (kind, x, y)
        })
        .collect();

    PoiInterior {
        id: poi_id.to_string(),
        width: SIZE,
        height: SIZE,
        hazards,
    }
}

/// Generates the room chain for a building on first L3 entry.
///
/// Rooms are chain-connected with bidirectional `to_{room}` exits; the
/// building's NPCs are assigned round-robin.
pub fn generate_rooms(building: &Building, world_seed: u32) -> Vec<Room> {
    const ROOM_NAMES: [&str; 6] = ["hall", "chamber", "back room", "cellar", "loft", "study"];

    let (lo, hi) = building.purpose.room_range();
    let mut rng = KeyedRng::new(world_seed, &["rooms", &building.id]);
    let count = rng.next_range(i64::from(lo), i64::from(hi)) as usize;

    let ids: Vec<String> = (0..count).map(|i| format!("{}_r{i}", building.id)).collect();
    let mut rooms: Vec<Room> = ids
        .iter()
        .map(|id| Room {
            id: id.clone(),
            name: ROOM_NAMES[crate::rng::choice_index(rng.next_f64(), ROOM_NAMES.len())]
                .to_string(),
            exits: Default::default(),
            npc_ids: Vec::new(),
        })
        .collect();

    for i in 0..count.saturating_sub(1) {
        let next = ids[i + 1].clone();
        let prev = ids[i].clone();
        rooms[i].exits.insert(format!("to_{next}"), next.clone());
        rooms[i + 1].exits.insert(format!("to_{prev}"), prev);
    }
    let rooms_len = rooms.len().max(1);
    for (i, npc_id) in building.npc_ids.iter().enumerate() {
        rooms[i % rooms_len].npc_ids.push(npc_id.clone());
    }
    rooms
}

/// Enters L2 from the player's current L1 cell.
///
/// A cell belonging to a revealed site opens that settlement (creating and
/// persisting it, with quest seeding, on first entry); any other cell opens
/// a POI interior. Returns the id of the interior entered.
pub fn enter_l2_from_l1(
    state: &mut GameState,
    catalogs: &Catalogs,
    now: DateTime<Utc>,
    log: &mut DeltaLog,
) -> Result<String, LayerError> {
    if !state.world.is_initialized() {
        return Err(LayerError::WorldNotInitialized);
    }
    let pos = state.world.position;
    let key = Cell::key(pos.mx, pos.my, pos.lx, pos.ly);

    let site = state.world.sites.values().find(|s| {
        s.mx == pos.mx
            && s.my == pos.my
            && s.cells.iter().any(|c| c.lx == pos.lx && c.ly == pos.ly)
    });

    let interior_id = if let Some(site) = site {
        let settlement_id = site.id.clone();
        if !state.world.settlements.contains_key(&settlement_id) {
            let spec = catalogs.settlement_spec(site.tier);
            let base_seed = derive_seed(state.rng_seed, &[&settlement_id, "npcs"]);
            let pool = generate_npc_pool(
                &settlement_id,
                spec.npc_count,
                base_seed,
                (pos.mx, pos.my),
                state.world.l1_dims(pos.mx, pos.my),
                now,
                catalogs,
            );
            let settlement =
                generate_settlement(&settlement_id, site.tier, state.rng_seed, pool, catalogs);
            log.push(Delta::add(
                format!("/world/settlements/{settlement_id}"),
                json!(&settlement),
            ));
            state
                .world
                .settlements
                .insert(settlement_id.clone(), settlement);
            crate::quest::seed_settlement_quests(state, &settlement_id, catalogs, log);
        }
        settlement_id
    } else {
        let poi_id = format!("poi_{key}");
        if !state.world.pois.contains_key(&poi_id) {
            let poi = generate_poi(&poi_id, state.rng_seed);
            log.push(Delta::add(format!("/world/pois/{poi_id}"), json!(&poi)));
            state.world.pois.insert(poi_id.clone(), poi);
        }
        poi_id
    };

    state.world.l2_active = Some(interior_id.clone());
    state.world.current_layer = 2;
    state.world.sub_position = Some(SubPosition { x: 0, y: 0 });
    log.push(Delta::set("/world/l2_active", json!(&interior_id)));
    log.push(Delta::set("/world/current_layer", json!(2)));
    Ok(interior_id)
}

/// Enters a building interior from an active settlement.
pub fn enter_l3_from_l2(
    state: &mut GameState,
    building_id: &str,
    log: &mut DeltaLog,
) -> Result<(), LayerError> {
    let Some(settlement_id) = state.world.l2_active.clone() else {
        return Err(LayerError::NotInSettlement);
    };
    let seed = state.rng_seed;
    let Some(settlement) = state.world.settlements.get_mut(&settlement_id) else {
        return Err(LayerError::NotInSettlement);
    };
    let Some(building) = settlement
        .buildings
        .iter_mut()
        .find(|b| b.id == building_id)
    else {
        return Err(LayerError::BuildingNotFound(building_id.to_string()));
    };

    if building.rooms.is_empty() {
        building.rooms = generate_rooms(building, seed);
        log.push(Delta::set(
            format!("/world/settlements/{settlement_id}/buildings/{building_id}"),
            json!(&*building),
        ));
    }

    state.world.l3_active = Some(building_id.to_string());
    state.world.current_layer = 3;
    state.world.sub_position = Some(SubPosition { x: 0, y: 0 });
    log.push(Delta::set("/world/l3_active", json!(building_id)));
    log.push(Delta::set("/world/current_layer", json!(3)));
    Ok(())
}

/// Leaves the current layer, returning to the one above.
pub fn exit_layer(state: &mut GameState, log: &mut DeltaLog) -> Result<(), LayerError> {
    match state.world.current_layer {
        3 => {
            state.world.l3_active = None;
            state.world.current_layer = 2;
            state.world.sub_position = Some(SubPosition { x: 0, y: 0 });
            log.push(Delta::set("/world/l3_active", json!(null)));
            log.push(Delta::set("/world/current_layer", json!(2)));
            Ok(())
        }
        2 => {
            state.world.l2_active = None;
            state.world.current_layer = 1;
            state.world.sub_position = None;
            log.push(Delta::set("/world/l2_active", json!(null)));
            log.push(Delta::set("/world/current_layer", json!(1)));
            Ok(())
        }
        _ => Err(LayerError::AlreadyOutside),
    }
}

//! Spatial world model: the L0 macro grid, L1 cell window, revealed sites,
//! and persisted settlement interiors.
//!
//! The world is a three-layer hierarchy. L0 is a fixed 8×8 macro grid; each
//! macro cell holds a 12×12 (by default) L1 local grid of streamed cells;
//! settlements and buildings open into L2/L3 interiors. Only a sliding
//! window of L1 cells around the player is ever materialized.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{Biome, BuildingPurpose, SettlementKind};
use crate::state::player::Item;

/// Fixed width and height of the L0 macro grid.
pub const L0_SIZE: i32 = 8;
/// Default L1 local grid edge.
pub const L1_DEFAULT: i32 = 12;
/// Hydration radius (Chebyshev, inclusive).
pub const STREAM_R: i32 = 2;
/// Prefetch margin beyond the hydration radius.
pub const STREAM_P: i32 = 1;

/// Movements that would leave the grid silently no-op instead of wrapping.
pub const WORLD_WRAP: bool = false;

/// Grid dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dims {
    pub w: i32,
    pub h: i32,
}

/// Streaming window parameters: `r` is the hydration radius, `r + p` the
/// prefetch radius beyond which cells are evicted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamParams {
    #[serde(rename = "R")]
    pub r: i32,
    #[serde(rename = "P")]
    pub p: i32,
}

/// Player coordinates, always clamped into bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub mx: i32,
    pub my: i32,
    pub lx: i32,
    pub ly: i32,
}

impl Position {
    /// Clamps all components into the L0/L1 bounds.
    pub fn clamped(mut self, l1: Dims) -> Self {
        self.mx = self.mx.clamp(0, L0_SIZE - 1);
        self.my = self.my.clamp(0, L0_SIZE - 1);
        self.lx = self.lx.clamp(0, l1.w - 1);
        self.ly = self.ly.clamp(0, l1.h - 1);
        self
    }
}

/// Cursor inside an L2/L3 interior grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubPosition {
    pub x: i32,
    pub y: i32,
}

/// Per-macro cluster capacity caps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterCaps {
    pub city: u32,
    pub metropolis: u32,
}

impl Default for ClusterCaps {
    fn default() -> Self {
        Self {
            city: 1,
            metropolis: 0,
        }
    }
}

/// One entry of the L0 macro grid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MacroCell {
    pub id: String,
    pub mx: i32,
    pub my: i32,
    pub l1: Dims,
    pub caps: ClusterCaps,
    pub biome: Biome,
    /// Deterministic site plan, cached on first access.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_plan: Option<SitePlan>,
}

impl MacroCell {
    /// Canonical macro key: `"{mx},{my}"`.
    pub fn key(mx: i32, my: i32) -> String {
        format!("{mx},{my}")
    }
}

/// A planned settlement cluster inside one macro cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlannedCluster {
    pub cluster_id: String,
    pub seg_index: u32,
    pub tier: SettlementKind,
    pub center: CellOffset,
    pub cells: Vec<CellOffset>,
}

/// Placement bookkeeping attached to a site plan.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanMeta {
    pub target: u32,
    pub placed: u32,
    pub warn_shortfall: bool,
}

/// The deterministic per-macro site plan.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SitePlan {
    pub clusters: Vec<PlannedCluster>,
    pub meta: PlanMeta,
}

/// An `(lx, ly)` offset within an L1 grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellOffset {
    pub lx: i32,
    pub ly: i32,
}

/// One streamed L1 cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub id: String,
    pub mx: i32,
    pub my: i32,
    pub lx: i32,
    pub ly: i32,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub known: bool,
    pub hydrated: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Hand-authored cells are never overwritten by generation.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_custom: bool,
    /// Loose items lying in the cell.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Item>,
}

impl Cell {
    /// Canonical cell key: `"L1:{mx},{my}:{lx},{ly}"`.
    pub fn key(mx: i32, my: i32, lx: i32, ly: i32) -> String {
        format!("L1:{mx},{my}:{lx},{ly}")
    }

    /// Creates an unknown, unhydrated, untyped cell at the coordinates.
    pub fn new(mx: i32, my: i32, lx: i32, ly: i32) -> Self {
        Self {
            id: Self::key(mx, my, lx, ly),
            mx,
            my,
            lx,
            ly,
            kind: None,
            subtype: None,
            description: None,
            known: false,
            hydrated: false,
            tags: Vec::new(),
            is_custom: false,
            items: Vec::new(),
        }
    }
}

/// Parses a canonical cell key into `(mx, my, lx, ly)`.
///
/// Only exact matches of `L1:{mx},{my}:{lx},{ly}` with decimal integers are
/// accepted.
pub fn parse_cell_key(key: &str) -> Option<(i32, i32, i32, i32)> {
    let rest = key.strip_prefix("L1:")?;
    let (macro_part, local_part) = rest.split_once(':')?;
    let (mx, my) = macro_part.split_once(',')?;
    let (lx, ly) = local_part.split_once(',')?;
    let parse = |s: &str| -> Option<i32> {
        if s.is_empty() || (s.len() > 1 && s.starts_with('0')) {
            return None;
        }
        s.parse().ok()
    };
    Some((parse(mx)?, parse(my)?, parse(lx)?, parse(ly)?))
}

/// A revealed settlement site.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: String,
    pub mx: i32,
    pub my: i32,
    pub cluster_id: String,
    pub seg_index: u32,
    pub tier: SettlementKind,
    pub cells: Vec<CellOffset>,
    pub promoted: bool,
}

/// A room inside a building interior (L3).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    pub name: String,
    /// Exit label (`to_{room}`) to room id, bidirectional by construction.
    pub exits: BTreeMap<String, String>,
    #[serde(default)]
    pub npc_ids: Vec<String>,
}

/// A building placed on a settlement interior grid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub id: String,
    pub name: String,
    pub purpose: BuildingPurpose,
    pub x: i32,
    pub y: i32,
    /// Rooms are generated lazily on first L3 entry.
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub npc_ids: Vec<String>,
}

/// A generated non-player character.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Npc {
    pub id: String,
    pub site_id: String,
    pub age: u32,
    pub gender: Gender,
    /// Social tier 1..=4.
    pub tier: u8,
    pub job_category: String,
    /// Site id, `"wanderer"`, or none.
    #[serde(default)]
    pub home_location: Option<String>,
    #[serde(default)]
    pub faction_id: Option<String>,
    pub wealth_tier: u8,
    pub player_reputation: i32,
    pub traits: Vec<String>,
    pub corruption_level: f64,
    pub is_criminal: bool,
    pub position: Position,
    pub state: String,
    pub created_at_utc: String,
    pub expires_at_utc: String,
    #[serde(default)]
    pub schedule: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_quest_giver: bool,
    #[serde(default)]
    pub quest_giver_rank: u32,
}

/// NPC gender, drawn uniformly at generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

/// A persisted settlement interior.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SettlementKind,
    pub population: u32,
    pub width: i32,
    pub height: i32,
    /// Row-major interior tiles: `"street"`, `"empty"`, or a building id.
    pub grid: Vec<Vec<String>>,
    pub buildings: Vec<Building>,
    pub npcs: Vec<Npc>,
    pub tier: SettlementKind,
}

/// A point-of-interest interior (non-settlement L2).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoiInterior {
    pub id: String,
    pub width: i32,
    pub height: i32,
    /// Hazards as `(kind, x, y)`; kinds are water, collapse, gas.
    pub hazards: Vec<(String, i32, i32)>,
}

/// The spatial model carried inside session state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldModel {
    /// ISO-8601 timestamp of the last turn.
    pub time_utc: String,
    pub l0: Dims,
    /// Macro entries keyed `"mx,my"`. Empty until the first world prompt.
    #[serde(rename = "macro")]
    pub macro_map: BTreeMap<String, MacroCell>,
    pub l1_default: Dims,
    pub stream: StreamParams,
    pub position: Position,
    pub cells: BTreeMap<String, Cell>,
    pub sites: BTreeMap<String, Site>,
    pub settlements: BTreeMap<String, Settlement>,
    #[serde(default)]
    pub pois: BTreeMap<String, PoiInterior>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l2_active: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l3_active: Option<String>,
    /// Active nested layer: 1, 2, or 3.
    pub current_layer: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_position: Option<SubPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub macro_biome: Option<Biome>,
}

impl WorldModel {
    /// An empty world awaiting its first prompt.
    pub fn new() -> Self {
        Self {
            time_utc: String::new(),
            l0: Dims {
                w: L0_SIZE,
                h: L0_SIZE,
            },
            macro_map: BTreeMap::new(),
            l1_default: Dims {
                w: L1_DEFAULT,
                h: L1_DEFAULT,
            },
            stream: StreamParams {
                r: STREAM_R,
                p: STREAM_P,
            },
            position: Position {
                mx: 0,
                my: 0,
                lx: L1_DEFAULT / 2,
                ly: L1_DEFAULT / 2,
            },
            cells: BTreeMap::new(),
            sites: BTreeMap::new(),
            settlements: BTreeMap::new(),
            pois: BTreeMap::new(),
            l2_active: None,
            l3_active: None,
            current_layer: 1,
            sub_position: None,
            macro_biome: None,
        }
    }

    /// L1 dimensions for a macro cell, falling back to the default.
    pub fn l1_dims(&self, mx: i32, my: i32) -> Dims {
        self.macro_map
            .get(&MacroCell::key(mx, my))
            .map(|m| m.l1)
            .unwrap_or(self.l1_default)
    }

    /// Returns true once the L0 grid has been generated.
    pub fn is_initialized(&self) -> bool {
        !self.macro_map.is_empty()
    }

    /// Rewrites any cell whose mapping key does not match the canonical
    /// `L1:{mx},{my}:{lx},{ly}` grammar derived from its own coordinates.
    ///
    /// Returns the number of keys normalized.
    pub fn normalize_cell_keys(&mut self) -> usize {
        let bad: Vec<String> = self
            .cells
            .iter()
            .filter(|(k, c)| **k != Cell::key(c.mx, c.my, c.lx, c.ly))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &bad {
            if let Some(mut cell) = self.cells.remove(key) {
                let canonical = Cell::key(cell.mx, cell.my, cell.lx, cell.ly);
                cell.id = canonical.clone();
                self.cells.insert(canonical, cell);
            }
        }
        bad.len()
    }

    /// Human-facing L0 label: row letter (from `my`) plus 1-based column.
    pub fn l0_label(&self) -> String {
        let row = (b'A' + self.position.my.clamp(0, 25) as u8) as char;
        format!("{}{}", row, self.position.mx + 1)
    }
}

impl Default for WorldModel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_key_round_trips() {
        let key = Cell::key(3, 7, 11, 0);
        assert_eq!(key, "L1:3,7:11,0");
        assert_eq!(parse_cell_key(&key), Some((3, 7, 11, 0)));
    }

    #[test]
    fn parse_rejects_malformed_keys() {
        assert_eq!(parse_cell_key("L2:0,0:1,1"), None);
        assert_eq!(parse_cell_key("L1:0,0:1"), None);
        assert_eq!(parse_cell_key("L1:00,0:1,1"), None);
        assert_eq!(parse_cell_key("L1:0,0:1,x"), None);
    }

    #[test]
    fn normalize_rewrites_stray_keys() {
        let mut world = WorldModel::new();
        let cell = Cell::new(2, 2, 5, 5);
        world.cells.insert("L1:2,2:05,5".to_string(), cell);
        assert_eq!(world.normalize_cell_keys(), 1);
        assert!(world.cells.contains_key("L1:2,2:5,5"));
        assert_eq!(world.cells["L1:2,2:5,5"].id, "L1:2,2:5,5");
    }

    #[test]
    fn position_clamps_into_bounds() {
        let dims = Dims { w: 12, h: 12 };
        let p = Position {
            mx: -1,
            my: 9,
            lx: 30,
            ly: -4,
        }
        .clamped(dims);
        assert_eq!((p.mx, p.my, p.lx, p.ly), (0, 7, 11, 0));
    }

    #[test]
    fn l0_label_uses_row_letter_and_column_number() {
        let mut world = WorldModel::new();
        world.position = Position {
            mx: 0,
            my: 0,
            lx: 0,
            ly: 0,
        };
        assert_eq!(world.l0_label(), "A1");
        world.position.mx = 7;
        world.position.my = 7;
        assert_eq!(world.l0_label(), "H8");
    }
}

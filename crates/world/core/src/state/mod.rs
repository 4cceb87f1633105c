//! Authoritative session state representation.
//!
//! This module owns the data structures the orchestrator clones, mutates,
//! and atomically swaps back per turn. Everything here is plain data with
//! deterministic serde output (maps are `BTreeMap`s, struct field order is
//! fixed), which the fingerprint layer relies on.

pub mod delta;
pub mod player;
pub mod world;

use serde::{Deserialize, Serialize};

pub use delta::{Delta, DeltaLog, DeltaOp};
pub use player::{Item, ItemProps, Player};
pub use world::{
    Cell, CellOffset, ClusterCaps, Dims, Gender, MacroCell, Npc, PlanMeta, PlannedCluster,
    PoiInterior, Position, Room, Building, Settlement, Site, SitePlan, StreamParams, SubPosition,
    WorldModel, parse_cell_key,
};

use crate::quest::QuestLog;

/// Schema version fed into the stable fingerprint.
pub const SCHEMA_VERSION: &str = "3";
/// Ruleset revision fed into the stable fingerprint.
pub const RULESET_REV: &str = "phase-3c";

/// Monotonic revision counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub state_rev: u64,
    pub cell_rev: u64,
    pub site_rev: u64,
    pub inventory_rev: u64,
    pub merchant_state_rev: u64,
    pub faction_rev: u64,
}

/// Stable identity fields plus the three state digests.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    pub schema_version: String,
    pub world_seed: u32,
    pub ruleset_rev: String,
    pub hex_digest_stable: String,
    pub hex_digest_state: String,
    pub hex_digest: String,
}

/// Content digests recomputed each turn.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Digests {
    pub inventory_digest: String,
}

/// One append-only history record per accepted turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub turn_id: String,
    pub timestamp_utc: String,
    pub intent: String,
    pub summary: String,
}

/// Complete per-session state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub schema_version: String,
    /// 32-bit world seed deriving all downstream randomness.
    pub rng_seed: u32,
    pub turn_counter: u64,
    pub player: Player,
    pub world: WorldModel,
    pub quests: QuestLog,
    pub counters: Counters,
    pub fingerprint: Fingerprint,
    pub digests: Digests,
    pub history: Vec<HistoryEntry>,
    /// Running count of deltas emitted over the session's lifetime.
    #[serde(default)]
    pub ledger_len: u64,
}

impl GameState {
    /// Fresh state for a new session. The world stays empty until the first
    /// prompt seeds it.
    pub fn new(rng_seed: u32) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            rng_seed,
            turn_counter: 0,
            player: Player::new("player"),
            world: WorldModel::new(),
            quests: QuestLog::new(),
            counters: Counters::default(),
            fingerprint: Fingerprint::default(),
            digests: Digests::default(),
            history: Vec::new(),
            ledger_len: 0,
        }
    }

    /// Applies the revision flags raised during a turn, bumping each flagged
    /// counter exactly once. `state_rev` bumps whenever anything did.
    pub fn bump_revisions(&mut self, log: &DeltaLog) {
        let mut any = !log.is_empty();
        if log.cell_rev {
            self.counters.cell_rev += 1;
            any = true;
        }
        if log.site_rev {
            self.counters.site_rev += 1;
            any = true;
        }
        if log.inventory_rev {
            self.counters.inventory_rev += 1;
            any = true;
        }
        if log.merchant_state_rev {
            self.counters.merchant_state_rev += 1;
            any = true;
        }
        if log.faction_rev {
            self.counters.faction_rev += 1;
            any = true;
        }
        if any {
            self.counters.state_rev += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revision_flags_bump_once() {
        let mut state = GameState::new(1);
        let mut log = DeltaLog::new();
        log.cell_rev = true;
        log.inventory_rev = true;
        state.bump_revisions(&log);
        assert_eq!(state.counters.cell_rev, 1);
        assert_eq!(state.counters.inventory_rev, 1);
        assert_eq!(state.counters.site_rev, 0);
        assert_eq!(state.counters.state_rev, 1);
    }

    #[test]
    fn state_round_trips_through_json() {
        let state = GameState::new(77);
        let json = serde_json::to_string(&state).unwrap();
        let back: GameState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, back);
    }
}

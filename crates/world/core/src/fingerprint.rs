//! Digests and fingerprints over canonical state projections.
//!
//! The state fingerprint is a SHA-256 over a deterministic JSON projection:
//! struct field order is fixed and every map in the state tree is a
//! `BTreeMap`, so serialization is byte-stable. The fingerprint deliberately
//! excludes itself — it covers everything observable *about* the state, not
//! the digest fields it populates.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::state::{Counters, Digests, GameState, Player, RULESET_REV};

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Digest of the inventory projection.
///
/// Each item contributes `"{id}|{name}|{slot}|{rarity}|{property_revision}"`;
/// lines are sorted lexicographically and joined by newline before hashing.
pub fn inventory_digest(player: &Player) -> String {
    let mut lines: Vec<String> = player
        .inventory
        .iter()
        .map(|item| {
            format!(
                "{}|{}|{}|{}|{}",
                item.id, item.name, item.props.slot, item.props.rarity, item.property_revision
            )
        })
        .collect();
    lines.sort();
    sha256_hex(lines.join("\n").as_bytes())
}

/// Digest of the fields that never change within a session.
pub fn stable_digest(state: &GameState) -> String {
    sha256_hex(
        format!(
            "{}|{}|{}",
            state.schema_version, state.rng_seed, RULESET_REV
        )
        .as_bytes(),
    )
}

/// The canonical projection hashed into `hex_digest_state`.
///
/// `world` is carried as a JSON value with `time_utc` blanked: the digest
/// exists for replay-equivalence checks, and two replays of the same
/// action sequence must agree regardless of wall clock.
#[derive(Serialize)]
struct StateProjection<'a> {
    schema_version: &'a str,
    rng_seed: u32,
    turn_counter: u64,
    player: &'a Player,
    world: serde_json::Value,
    counters: &'a Counters,
    digests: &'a Digests,
    history_len: usize,
    ledger_len: u64,
}

/// Digest over the full observable state projection.
pub fn state_digest(state: &GameState) -> String {
    let mut world = serde_json::to_value(&state.world)
        .unwrap_or_else(|_| serde_json::Value::Null);
    if let Some(time) = world.get_mut("time_utc") {
        *time = serde_json::Value::String(String::new());
    }
    let projection = StateProjection {
        schema_version: &state.schema_version,
        rng_seed: state.rng_seed,
        turn_counter: state.turn_counter,
        player: &state.player,
        world,
        counters: &state.counters,
        digests: &state.digests,
        history_len: state.history.len(),
        ledger_len: state.ledger_len,
    };
    let json = serde_json::to_string(&projection)
        .unwrap_or_else(|_| String::from("{}"));
    sha256_hex(json.as_bytes())
}

/// Recomputes all fingerprint fields in place.
pub fn update_fingerprints(state: &mut GameState) {
    state.fingerprint.schema_version = state.schema_version.clone();
    state.fingerprint.world_seed = state.rng_seed;
    state.fingerprint.ruleset_rev = RULESET_REV.to_string();
    state.fingerprint.hex_digest_stable = stable_digest(state);
    let digest = state_digest(state);
    state.fingerprint.hex_digest_state = digest.clone();
    state.fingerprint.hex_digest = digest;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::player::{Item, ItemProps};

    fn item(id: &str, name: &str, rev: u64) -> Item {
        Item {
            id: id.into(),
            name: name.into(),
            aliases: Vec::new(),
            props: ItemProps {
                slot: "hand".into(),
                rarity: "common".into(),
            },
            property_revision: rev,
        }
    }

    #[test]
    fn inventory_digest_is_order_insensitive() {
        let mut a = GameState::new(1);
        a.player.inventory.push(item("a", "axe", 0));
        a.player.inventory.push(item("b", "bow", 0));
        let mut b = GameState::new(1);
        b.player.inventory.push(item("b", "bow", 0));
        b.player.inventory.push(item("a", "axe", 0));
        assert_eq!(inventory_digest(&a.player), inventory_digest(&b.player));
    }

    #[test]
    fn inventory_digest_tracks_property_revisions() {
        let mut state = GameState::new(1);
        state.player.inventory.push(item("a", "axe", 0));
        let before = inventory_digest(&state.player);
        state.player.inventory[0].property_revision = 1;
        assert_ne!(before, inventory_digest(&state.player));
    }

    #[test]
    fn state_digest_changes_only_with_observable_state() {
        let mut state = GameState::new(9);
        update_fingerprints(&mut state);
        let first = state.fingerprint.hex_digest_state.clone();

        // Recomputing without changes is stable (the fingerprint itself is
        // not part of the projection).
        update_fingerprints(&mut state);
        assert_eq!(state.fingerprint.hex_digest_state, first);

        state.turn_counter += 1;
        update_fingerprints(&mut state);
        assert_ne!(state.fingerprint.hex_digest_state, first);
    }

    #[test]
    fn state_digest_ignores_wall_clock() {
        let mut a = GameState::new(5);
        let mut b = GameState::new(5);
        a.world.time_utc = "2026-01-01T00:00:00Z".to_string();
        b.world.time_utc = "2026-06-30T23:59:59Z".to_string();
        assert_eq!(state_digest(&a), state_digest(&b));
    }

    #[test]
    fn stable_digest_depends_on_seed() {
        let a = GameState::new(1);
        let b = GameState::new(2);
        assert_ne!(stable_digest(&a), stable_digest(&b));
    }
}

//! Action application: routing validated actions into state mutations.

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::action::{Action, ActionError, Direction, QueuedAction, QuestActionKind, TrivialKind};
use crate::catalog::Catalogs;
use crate::quest;
use crate::state::world::SubPosition;
use crate::state::{Delta, DeltaLog, GameState};
use crate::worldgen;

/// Result of applying one queued action.
#[derive(Clone, Debug, PartialEq)]
pub struct ApplyOutcome {
    /// One-line summary for the history log and scene payload.
    pub summary: String,
    /// Whether the action moved the player (and re-ran worldgen).
    pub moved: bool,
}

/// Applies a validated action to state, emitting deltas.
///
/// Movement routes through the world generator (position update, window
/// hydration, site reveal); `drop` splices the inventory; quest actions
/// delegate to the quest engine; everything else is non-mutating.
pub fn apply_action(
    state: &mut GameState,
    queued: &QueuedAction,
    catalogs: &Catalogs,
    now: DateTime<Utc>,
    log: &mut DeltaLog,
) -> Result<ApplyOutcome, ActionError> {
    match &queued.action {
        Action::Move { dir } => {
            let direction = Direction::canonicalize(dir)
                .ok_or_else(|| ActionError::InvalidDirection(dir.clone()))?;
            apply_move(state, direction, catalogs, now, log)
        }

        Action::Drop { target } => {
            let query = target.trim();
            let index = state
                .player
                .inventory
                .iter()
                .position(|i| {
                    i.name.eq_ignore_ascii_case(query)
                        || i.aliases.iter().any(|a| a.eq_ignore_ascii_case(query))
                })
                .ok_or_else(|| ActionError::TargetNotInInventory(target.clone()))?;
            let item = state.player.inventory.remove(index);
            log.push(Delta::set(
                "/player/inventory",
                json!(&state.player.inventory),
            ));
            log.inventory_rev = true;
            Ok(ApplyOutcome {
                summary: format!("dropped the {}", item.name),
                moved: false,
            })
        }

        Action::Take { target } => Ok(ApplyOutcome {
            summary: format!("reached for the {target}"),
            moved: false,
        }),

        Action::Examine { target } => Ok(ApplyOutcome {
            summary: format!("examined the {target}"),
            moved: false,
        }),

        Action::Talk { target } => Ok(ApplyOutcome {
            summary: format!("spoke with {target}"),
            moved: false,
        }),

        Action::Quest {
            kind,
            quest_id,
            npc_id,
        } => {
            let summary = match kind {
                QuestActionKind::AskAboutQuest => {
                    let quest = quest::ask_about_quest(state, npc_id.as_deref())?;
                    format!("heard about {}", quest.id)
                }
                QuestActionKind::AcceptQuest => {
                    let quest = quest::accept_quest(state, quest_id.as_deref(), log)?;
                    format!("accepted {}", quest.id)
                }
                QuestActionKind::CompleteQuest => {
                    let quest =
                        quest::complete_quest(state, quest_id.as_deref(), npc_id.as_deref(), log)?;
                    format!("completed {} for {} gold", quest.id, quest.reward_gold)
                }
            };
            Ok(ApplyOutcome {
                summary,
                moved: false,
            })
        }

        Action::Trivial { kind } => Ok(ApplyOutcome {
            summary: match kind {
                TrivialKind::Look => "looked around".to_string(),
                TrivialKind::Inventory => "checked the pack".to_string(),
                other => format!("chose to {other}"),
            },
            moved: false,
        }),

        Action::Shallow { kind } => Ok(ApplyOutcome {
            summary: queued
                .note
                .clone()
                .unwrap_or_else(|| format!("attempted to {kind}")),
            moved: false,
        }),

        Action::Unknown { raw } => Ok(ApplyOutcome {
            summary: format!("tried something unrecognized: {raw}"),
            moved: false,
        }),

        Action::Noop => Ok(ApplyOutcome {
            summary: "waited".to_string(),
            moved: false,
        }),
    }
}

fn apply_move(
    state: &mut GameState,
    direction: Direction,
    catalogs: &Catalogs,
    now: DateTime<Utc>,
    log: &mut DeltaLog,
) -> Result<ApplyOutcome, ActionError> {
    // Vertical movement crosses layers instead of the grid.
    if direction == Direction::Down {
        if state.world.current_layer == 1 {
            let entered = worldgen::enter_l2_from_l1(state, catalogs, now, log)
                .map(|id| format!("entered {id}"))
                .unwrap_or_else(|_| "found no way down".to_string());
            return Ok(ApplyOutcome {
                summary: entered,
                moved: false,
            });
        }
        return Ok(ApplyOutcome {
            summary: "found no way further down".to_string(),
            moved: false,
        });
    }
    if direction == Direction::Up {
        let summary = match worldgen::exit_layer(state, log) {
            Ok(()) => "climbed back out".to_string(),
            Err(_) => "found no way up".to_string(),
        };
        return Ok(ApplyOutcome {
            summary,
            moved: false,
        });
    }

    let (dx, dy) = direction.offset().unwrap_or((0, 0));

    if state.world.current_layer > 1 {
        // Interior movement shifts the sub-position cursor only.
        let bounds = interior_bounds(state);
        let cursor = state.world.sub_position.unwrap_or(SubPosition { x: 0, y: 0 });
        let next = SubPosition {
            x: (cursor.x + dx).clamp(0, bounds.0 - 1),
            y: (cursor.y + dy).clamp(0, bounds.1 - 1),
        };
        if next != cursor {
            state.world.sub_position = Some(next);
            log.push(Delta::set("/world/sub_position", json!(next)));
        }
        return Ok(ApplyOutcome {
            summary: format!("walked {direction}"),
            moved: false,
        });
    }

    let before = state.world.position;
    let dims = state.world.l1_dims(before.mx, before.my);
    let after = worldgen::step_position(before, dims, dx, dy);

    if after == before {
        return Ok(ApplyOutcome {
            summary: format!("found the way {direction} blocked by the world's edge"),
            moved: false,
        });
    }

    state.world.position = after;
    log.push(Delta::set("/world/position", json!(after)));
    worldgen::world_gen_step(state, catalogs, log);

    Ok(ApplyOutcome {
        summary: format!("moved {direction}"),
        moved: true,
    })
}

fn interior_bounds(state: &GameState) -> (i32, i32) {
    if state.world.current_layer == 2 {
        if let Some(settlement) = state
            .world
            .l2_active
            .as_deref()
            .and_then(|id| state.world.settlements.get(id))
        {
            return (settlement.width, settlement.height);
        }
        if let Some(poi) = state
            .world
            .l2_active
            .as_deref()
            .and_then(|id| state.world.pois.get(id))
        {
            return (poi.width, poi.height);
        }
    }
    // Building interiors are room graphs, not grids; keep the cursor pinned.
    (1, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::player::{Item, ItemProps};
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap()
    }

    fn seeded_state() -> GameState {
        let catalogs = world_content::catalogs();
        let mut state = GameState::new(0);
        let mut log = DeltaLog::new();
        worldgen::init_world(
            &mut state,
            "A windy coast of pine islands.",
            None,
            &catalogs,
            &mut log,
        );
        worldgen::world_gen_step(&mut state, &catalogs, &mut log);
        state
    }

    fn queued(action: Action) -> QueuedAction {
        QueuedAction { action, note: None }
    }

    #[test]
    fn drop_splices_inventory_and_flags_revision() {
        let catalogs = world_content::catalogs();
        let mut state = seeded_state();
        state.player.inventory.push(Item {
            id: "rusty_dagger".into(),
            name: "rusty dagger".into(),
            aliases: vec!["dagger".into()],
            props: ItemProps {
                slot: "hand".into(),
                rarity: "common".into(),
            },
            property_revision: 0,
        });

        let mut log = DeltaLog::new();
        let outcome = apply_action(
            &mut state,
            &queued(Action::Drop { target: "rusty dagger".into() }),
            &catalogs,
            fixed_now(),
            &mut log,
        )
        .unwrap();
        assert_eq!(outcome.summary, "dropped the rusty dagger");
        assert!(state.player.inventory.is_empty());
        assert!(log.inventory_rev);

        let delta = &log.deltas()[0];
        assert_eq!(delta.path, "/player/inventory");
        assert_eq!(delta.value, Some(json!([])));
    }

    #[test]
    fn north_decrements_ly_and_reruns_worldgen() {
        let catalogs = world_content::catalogs();
        let mut state = seeded_state();
        let before = state.world.position;
        let mut log = DeltaLog::new();
        let outcome = apply_action(
            &mut state,
            &queued(Action::Move { dir: "north".into() }),
            &catalogs,
            fixed_now(),
            &mut log,
        )
        .unwrap();
        assert!(outcome.moved);
        assert_eq!(state.world.position.ly, before.ly - 1);
        // Worldgen ran: cells beyond the window were evicted.
        let pos = state.world.position;
        for cell in state.world.cells.values() {
            if cell.mx == pos.mx && cell.my == pos.my {
                let dist = (cell.lx - pos.lx).abs().max((cell.ly - pos.ly).abs());
                assert!(dist <= 3);
            }
        }
    }

    #[test]
    fn moving_off_world_is_a_noop() {
        let catalogs = world_content::catalogs();
        let mut state = seeded_state();
        state.world.position.mx = 0;
        state.world.position.lx = 0;
        let mut log = DeltaLog::new();
        worldgen::world_gen_step(&mut state, &catalogs, &mut log);

        let before = state.world.position;
        let mut log = DeltaLog::new();
        let outcome = apply_action(
            &mut state,
            &queued(Action::Move { dir: "west".into() }),
            &catalogs,
            fixed_now(),
            &mut log,
        )
        .unwrap();
        assert!(!outcome.moved);
        assert_eq!(state.world.position, before);
    }

    #[test]
    fn take_does_not_mutate() {
        let catalogs = world_content::catalogs();
        let mut state = seeded_state();
        let snapshot = state.clone();
        let mut log = DeltaLog::new();
        apply_action(
            &mut state,
            &queued(Action::Take { target: "driftwood".into() }),
            &catalogs,
            fixed_now(),
            &mut log,
        )
        .unwrap();
        assert_eq!(state, snapshot);
        assert!(log.is_empty());
    }
}

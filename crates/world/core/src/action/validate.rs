//! Intent validation against current state.
//!
//! Validation never mutates: quest transitions are dry-run against a
//! throwaway clone, and every failure returns the specific error code with
//! the caller's state untouched.

use crate::action::score::best_match;
use crate::action::{Action, ActionError, Direction, Intent, QueuedAction, QuestActionKind};
use crate::quest;
use crate::state::world::{Cell, Npc};
use crate::state::{DeltaLog, GameState};

/// Threshold for cell item matches on `take`.
const TAKE_THRESHOLD: i32 = 6;

/// NPCs visible from the player's current layer and position.
///
/// At L1 these are NPCs standing on the player's cell; inside a settlement
/// every resident is addressable; inside a building only its occupants are.
pub fn present_npcs(state: &GameState) -> Vec<&Npc> {
    match state.world.current_layer {
        3 => {
            let Some(building_id) = state.world.l3_active.as_deref() else {
                return Vec::new();
            };
            let Some(settlement) = state
                .world
                .l2_active
                .as_deref()
                .and_then(|id| state.world.settlements.get(id))
            else {
                return Vec::new();
            };
            let Some(building) = settlement.buildings.iter().find(|b| b.id == building_id)
            else {
                return Vec::new();
            };
            settlement
                .npcs
                .iter()
                .filter(|n| building.npc_ids.contains(&n.id))
                .collect()
        }
        2 => state
            .world
            .l2_active
            .as_deref()
            .and_then(|id| state.world.settlements.get(id))
            .map(|s| s.npcs.iter().collect())
            .unwrap_or_default(),
        _ => {
            let pos = state.world.position;
            state
                .world
                .settlements
                .values()
                .flat_map(|s| s.npcs.iter())
                .filter(|n| {
                    n.position.mx == pos.mx
                        && n.position.my == pos.my
                        && n.position.lx == pos.lx
                        && n.position.ly == pos.ly
                })
                .collect()
        }
    }
}

/// An NPC matches a spoken target by id or (case-insensitively) by job.
fn npc_matches(npc: &Npc, target: &str) -> bool {
    let t = target.trim().to_lowercase();
    npc.id.to_lowercase() == t
        || npc.job_category.to_lowercase() == t
        || t.ends_with(&npc.job_category.to_lowercase())
}

fn current_cell(state: &GameState) -> Option<&Cell> {
    let pos = state.world.position;
    state
        .world
        .cells
        .get(&Cell::key(pos.mx, pos.my, pos.lx, pos.ly))
}

/// Validates the whole intent, returning the action queue on success.
///
/// The queue is `[primary, ...secondaries]` when the intent is compound,
/// just the primary otherwise. Directions are canonicalized in place.
pub fn validate_intent(
    state: &GameState,
    intent: &Intent,
) -> Result<Vec<QueuedAction>, ActionError> {
    let mut queue = vec![intent.primary.clone()];
    if intent.compound {
        queue.extend(intent.secondary.iter().cloned());
    }

    queue
        .into_iter()
        .map(|action| validate_action(state, action))
        .collect()
}

fn validate_action(state: &GameState, action: Action) -> Result<QueuedAction, ActionError> {
    match action {
        Action::Move { dir } => {
            let canonical = Direction::canonicalize(&dir)
                .ok_or_else(|| ActionError::InvalidDirection(dir.clone()))?;
            Ok(QueuedAction {
                action: Action::Move {
                    dir: canonical.to_string(),
                },
                note: None,
            })
        }

        Action::Take { target } => {
            let in_cell = current_cell(state)
                .map(|cell| best_match(&target, &cell.items, 0, TAKE_THRESHOLD).is_some())
                .unwrap_or(false);
            if !in_cell {
                return Err(ActionError::TargetNotFoundInCell(target));
            }
            Ok(QueuedAction {
                action: Action::Take { target },
                note: None,
            })
        }

        Action::Drop { target } => {
            let query = target.trim();
            let held = state.player.inventory.iter().any(|i| {
                i.name.eq_ignore_ascii_case(query)
                    || i.aliases.iter().any(|a| a.eq_ignore_ascii_case(query))
            });
            if !held {
                return Err(ActionError::TargetNotInInventory(target));
            }
            Ok(QueuedAction {
                action: Action::Drop { target },
                note: None,
            })
        }

        Action::Examine { target } => {
            let in_cell = current_cell(state)
                .map(|cell| best_match(&target, &cell.items, 0, TAKE_THRESHOLD).is_some())
                .unwrap_or(false);
            let in_inventory =
                best_match(&target, &state.player.inventory, 0, TAKE_THRESHOLD).is_some();
            let is_npc = present_npcs(state).iter().any(|n| npc_matches(n, &target));
            if !(in_cell || in_inventory || is_npc) {
                return Err(ActionError::TargetNotVisible(target));
            }
            Ok(QueuedAction {
                action: Action::Examine { target },
                note: None,
            })
        }

        Action::Talk { target } => {
            let present = present_npcs(state).iter().any(|n| npc_matches(n, &target));
            if !present {
                return Err(ActionError::NpcNotPresent(target));
            }
            Ok(QueuedAction {
                action: Action::Talk { target },
                note: None,
            })
        }

        Action::Quest {
            kind,
            quest_id,
            npc_id,
        } => {
            // Dry-run against a clone so validation stays mutation-free.
            let mut probe = state.clone();
            let mut scratch = DeltaLog::new();
            match kind {
                QuestActionKind::AskAboutQuest => {
                    quest::ask_about_quest(state, npc_id.as_deref())?;
                }
                QuestActionKind::AcceptQuest => {
                    quest::accept_quest(&mut probe, quest_id.as_deref(), &mut scratch)?;
                }
                QuestActionKind::CompleteQuest => {
                    quest::complete_quest(
                        &mut probe,
                        quest_id.as_deref(),
                        npc_id.as_deref(),
                        &mut scratch,
                    )?;
                }
            }
            Ok(QueuedAction {
                action: Action::Quest {
                    kind,
                    quest_id,
                    npc_id,
                },
                note: None,
            })
        }

        Action::Trivial { kind } => Ok(QueuedAction {
            action: Action::Trivial { kind },
            note: None,
        }),

        Action::Shallow { kind } => Ok(QueuedAction {
            action: Action::Shallow { kind },
            note: Some(format!("{kind} is acknowledged but not simulated")),
        }),

        Action::Unknown { raw } => Ok(QueuedAction {
            action: Action::Unknown { raw: raw.clone() },
            note: Some(format!("unrecognized action {raw:?} passed through")),
        }),

        Action::Noop => Ok(QueuedAction {
            action: Action::Noop,
            note: None,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::player::{Item, ItemProps};

    fn dagger() -> Item {
        Item {
            id: "rusty_dagger".into(),
            name: "rusty dagger".into(),
            aliases: vec!["dagger".into()],
            props: ItemProps {
                slot: "hand".into(),
                rarity: "common".into(),
            },
            property_revision: 0,
        }
    }

    fn intent(action: Action) -> Intent {
        Intent {
            primary: action,
            secondary: Vec::new(),
            compound: false,
            confidence: 0.9,
        }
    }

    #[test]
    fn bad_direction_fails_with_code() {
        let state = GameState::new(1);
        let err = validate_intent(&state, &intent(Action::Move { dir: "sideways".into() }))
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_DIRECTION");
    }

    #[test]
    fn direction_aliases_are_canonicalized_in_the_queue() {
        let state = GameState::new(1);
        let queue =
            validate_intent(&state, &intent(Action::Move { dir: "N".into() })).unwrap();
        assert_eq!(queue[0].action, Action::Move { dir: "north".into() });
    }

    #[test]
    fn drop_requires_inventory_membership() {
        let mut state = GameState::new(1);
        let err = validate_intent(&state, &intent(Action::Drop { target: "dagger".into() }))
            .unwrap_err();
        assert_eq!(err.code(), "TARGET_NOT_IN_INVENTORY");

        state.player.inventory.push(dagger());
        let queue = validate_intent(
            &state,
            &intent(Action::Drop { target: "Rusty Dagger".into() }),
        )
        .unwrap();
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn take_requires_the_item_in_the_cell() {
        let mut state = GameState::new(1);
        let err = validate_intent(&state, &intent(Action::Take { target: "dagger".into() }))
            .unwrap_err();
        assert_eq!(err.code(), "TARGET_NOT_FOUND_IN_CELL");

        let pos = state.world.position;
        let mut cell = crate::state::world::Cell::new(pos.mx, pos.my, pos.lx, pos.ly);
        cell.items.push(dagger());
        state.world.cells.insert(cell.id.clone(), cell);
        assert!(
            validate_intent(&state, &intent(Action::Take { target: "dagger".into() })).is_ok()
        );
    }

    #[test]
    fn examine_accepts_inventory_targets() {
        let mut state = GameState::new(1);
        state.player.inventory.push(dagger());
        assert!(
            validate_intent(&state, &intent(Action::Examine { target: "dagger".into() }))
                .is_ok()
        );
        let err = validate_intent(
            &state,
            &intent(Action::Examine { target: "ghost".into() }),
        )
        .unwrap_err();
        assert_eq!(err.code(), "TARGET_NOT_VISIBLE");
    }

    #[test]
    fn talk_requires_a_present_npc() {
        let state = GameState::new(1);
        let err = validate_intent(
            &state,
            &intent(Action::Talk { target: "blacksmith".into() }),
        )
        .unwrap_err();
        assert_eq!(err.code(), "NPC_NOT_PRESENT");
    }

    #[test]
    fn compound_intents_queue_secondaries() {
        let state = GameState::new(1);
        let mut intent = intent(Action::Trivial { kind: crate::action::TrivialKind::Look });
        intent.secondary = vec![Action::Trivial { kind: crate::action::TrivialKind::Listen }];
        intent.compound = true;
        assert_eq!(validate_intent(&state, &intent).unwrap().len(), 2);

        intent.compound = false;
        assert_eq!(validate_intent(&state, &intent).unwrap().len(), 1);
    }

    #[test]
    fn shallow_actions_pass_with_a_note() {
        let state = GameState::new(1);
        let queue = validate_intent(
            &state,
            &intent(Action::Shallow { kind: crate::action::ShallowKind::Attack }),
        )
        .unwrap();
        assert!(queue[0].note.is_some());
    }
}

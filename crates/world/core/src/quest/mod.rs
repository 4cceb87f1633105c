//! Quest constraint engine.
//!
//! Quests roll constraint-first: difficulty, reward, enemy set, travel
//! distance, and step structure are all fixed by deterministic draws before
//! any narrative exists. The narrative layer (an external generator with a
//! validated reply, or the deterministic fallback) can only fill text
//! fields inside those constraints.

pub mod narrative;
pub mod transitions;
mod types;

pub use narrative::{
    NarrativeError, NarrativeReply, apply_fallback_narrative, integrate_narrative,
    validate_narrative,
};
pub use transitions::{
    QuestError, accept_quest, ask_about_quest, available_quests, complete_quest, progress_quest,
};
pub use types::{
    Choice, Complexity, Difficulty, FailureTrigger, Quest, QuestConfig, QuestLog, QuestStatus,
    QuestStep,
};

use serde_json::json;

use crate::catalog::{Catalogs, SettlementKind};
use crate::rng::{KeyedRng, weighted_index};
use crate::state::world::Settlement;
use crate::state::{Delta, DeltaLog, GameState};

/// Reward item count weights: 0, 1, or 2 items.
const REWARD_ITEM_WEIGHTS: [f64; 3] = [0.70, 0.25, 0.05];

/// Complexity weights in [`Complexity`] order.
const COMPLEXITY_WEIGHTS: [f64; 4] = [0.30, 0.35, 0.20, 0.15];

/// Failure trigger kinds.
const TRIGGER_KINDS: [&str; 4] = ["observability", "innocence", "destruction", "moral_choice"];
/// Failure consequences with weights 0.4 / 0.3 / 0.3.
const CONSEQUENCES: [&str; 3] = [
    "permanent_failure",
    "escalated_difficulty",
    "redemption_available",
];
const CONSEQUENCE_WEIGHTS: [f64; 3] = [0.4, 0.3, 0.3];

/// Quest availability probability range per settlement kind.
fn availability_range(kind: SettlementKind, catalogs: &Catalogs) -> (f64, f64) {
    catalogs
        .availability
        .iter()
        .find(|a| a.kind == kind)
        .map(|a| a.range)
        .unwrap_or((0.0, 0.0))
}

/// Quest tier implied by the settlement's size class.
pub fn quest_tier(kind: SettlementKind) -> u8 {
    match kind {
        SettlementKind::Outpost | SettlementKind::Hamlet => 1,
        SettlementKind::Village => 2,
        SettlementKind::Town => 3,
        SettlementKind::City | SettlementKind::Metropolis => 4,
    }
}

/// Rolls one fully-constrained quest for a settlement.
///
/// All draws come from a stream keyed by `(seed, "quest", settlement, index)`
/// in a fixed order: difficulty, gold, enemy sample, enemy count, travel,
/// reward items, complexity, then the step structure.
pub fn roll_quest(
    settlement: &Settlement,
    index: usize,
    seed: u32,
    catalogs: &Catalogs,
) -> Quest {
    let mut rng = KeyedRng::new(seed, &["quest", &settlement.id, &index.to_string()]);

    // Difficulty: base weights scaled by the settlement-size modifier.
    let modifiers = catalogs
        .size_modifiers
        .iter()
        .find(|(kind, _)| *kind == settlement.kind)
        .map(|(_, m)| *m)
        .unwrap_or([1.0; 5]);
    let weights: Vec<f64> = catalogs
        .difficulties
        .iter()
        .zip(modifiers)
        .map(|(spec, m)| spec.weight * m)
        .collect();
    let difficulty = catalogs.difficulties[weighted_index(rng.next_f64(), &weights)].difficulty;
    let spec = catalogs.difficulty_spec(difficulty);

    let reward_gold =
        rng.next_range(i64::from(spec.gold.0), i64::from(spec.gold.1)) as u32;

    // Enemy sample: 1..min(3, |allowed|) distinct types, catalog order
    // preserved by index sampling.
    let max_types = spec.allowed_enemies.len().min(3) as i64;
    let type_count = rng.next_range(1, max_types) as usize;
    let mut enemy_indices: Vec<usize> = Vec::with_capacity(type_count);
    while enemy_indices.len() < type_count {
        let idx = crate::rng::choice_index(rng.next_f64(), spec.allowed_enemies.len());
        if !enemy_indices.contains(&idx) {
            enemy_indices.push(idx);
        }
    }
    let enemy_types: Vec<String> = enemy_indices
        .iter()
        .map(|&i| spec.allowed_enemies[i].to_string())
        .collect();

    let enemy_count =
        rng.next_range(i64::from(spec.enemy_count.0), i64::from(spec.enemy_count.1)) as u32;
    let travel_distance =
        rng.next_range(i64::from(spec.travel.0), i64::from(spec.travel.1)) as u32;

    let reward_items = weighted_index(rng.next_f64(), &REWARD_ITEM_WEIGHTS) as u32;

    let complexity = match weighted_index(rng.next_f64(), &COMPLEXITY_WEIGHTS) {
        0 => Complexity::Single,
        1 => Complexity::Short,
        2 => Complexity::Medium,
        _ => Complexity::Dynamic,
    };
    let total_steps = match complexity {
        Complexity::Single => 1,
        Complexity::Short => rng.next_range(2, 3) as u32,
        Complexity::Medium => rng.next_range(4, 6) as u32,
        Complexity::Dynamic => rng.next_range(3, 5) as u32,
    };

    let steps = roll_structure(total_steps, &mut rng);

    let giver_npc_id = settlement
        .npcs
        .iter()
        .find(|n| n.is_quest_giver)
        .map(|n| n.id.clone());

    let constraints = json!({
        "difficulty": difficulty,
        "reward_gold": reward_gold,
        "enemy_types": enemy_types,
        "enemy_count": enemy_count,
        "travel_distance": travel_distance,
        "forbidden_keywords": spec.forbidden_keywords,
        "complexity": complexity,
        "total_steps": total_steps,
    });

    let mut quest = Quest {
        id: format!("quest_{}_{index}", settlement.id),
        tier: quest_tier(settlement.kind),
        status: QuestStatus::Available,
        difficulty,
        reward_gold,
        reward_items,
        enemy_types,
        enemy_count,
        complexity,
        travel_distance,
        forbidden_keywords: spec
            .forbidden_keywords
            .iter()
            .map(|s| s.to_string())
            .collect(),
        settlement_type: settlement.kind.to_string(),
        population: settlement.population,
        constraints,
        steps,
        current_step: 1,
        total_steps,
        giver_npc_id,
        protagonist: String::new(),
        antagonist: String::new(),
        narrative: String::new(),
        objective_description: String::new(),
        reward_description: String::new(),
        narrative_hooks: Vec::new(),
        complications: Vec::new(),
        failure_conditions: Vec::new(),
        is_fallback: false,
    };
    apply_fallback_narrative(&mut quest, &settlement.name, catalogs);
    quest
}

/// Builds the step array: 2–3 forward-pointing choices on every non-final
/// step, and 1–2 failure triggers per step.
fn roll_structure(total_steps: u32, rng: &mut KeyedRng) -> Vec<QuestStep> {
    (1..=total_steps)
        .map(|step| {
            let choices = if step < total_steps {
                let count = rng.next_range(2, 3);
                (0..count)
                    .map(|k| Choice {
                        id: format!("choice_{step}_{k}"),
                        leads_to_step: rng.next_range(i64::from(step + 1), i64::from(total_steps))
                            as u32,
                        consequences: vec![
                            CONSEQUENCES[weighted_index(rng.next_f64(), &CONSEQUENCE_WEIGHTS)]
                                .to_string(),
                        ],
                    })
                    .collect()
            } else {
                Vec::new()
            };

            let trigger_count = rng.next_range(1, 2);
            let failure_triggers = (0..trigger_count)
                .map(|_| FailureTrigger {
                    kind: TRIGGER_KINDS[rng.next_range(0, 3) as usize].to_string(),
                    consequence: CONSEQUENCES
                        [weighted_index(rng.next_f64(), &CONSEQUENCE_WEIGHTS)]
                    .to_string(),
                })
                .collect();

            QuestStep {
                id: step,
                narrative: String::new(),
                objective: String::new(),
                choices,
                failure_triggers,
            }
        })
        .collect()
}

/// Seeds a newly-created settlement's quest list.
///
/// The availability probability is drawn once per settlement from the
/// per-kind range; each of the (at most five) slots then rolls against it.
pub fn seed_settlement_quests(
    state: &mut GameState,
    settlement_id: &str,
    catalogs: &Catalogs,
    log: &mut DeltaLog,
) {
    if state.quests.all_quests_seeded.contains_key(settlement_id) {
        return;
    }
    let Some(settlement) = state.world.settlements.get(settlement_id) else {
        return;
    };

    let (lo, hi) = availability_range(settlement.kind, catalogs);
    let mut rng = KeyedRng::new(state.rng_seed, &["questprob", settlement_id]);
    let p = lo + rng.next_f64() * (hi - lo);

    let mut quests = Vec::new();
    for i in 0..state.quests.config.max_quests_per_settlement {
        if rng.next_f64() < p {
            quests.push(roll_quest(settlement, i, state.rng_seed, catalogs));
        }
    }

    log.push(Delta::set(
        format!("/quests/allQuestsSeeded/{settlement_id}"),
        json!(&quests),
    ));
    state
        .quests
        .all_quests_seeded
        .insert(settlement_id.to_string(), quests);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SettlementKind;
    use crate::worldgen::generate_settlement;
    use chrono::TimeZone;

    fn settlement(kind: SettlementKind) -> Settlement {
        let catalogs = world_content::catalogs();
        let now = chrono::Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let pool = crate::npc::generate_npc_pool(
            "site_0x0_0",
            catalogs.settlement_spec(kind).npc_count,
            50,
            (0, 0),
            crate::state::world::Dims { w: 12, h: 12 },
            now,
            &catalogs,
        );
        generate_settlement("site_0x0_0", kind, 7, pool, &catalogs)
    }

    #[test]
    fn rolls_are_deterministic() {
        let catalogs = world_content::catalogs();
        let s = settlement(SettlementKind::Town);
        let a = roll_quest(&s, 0, 7, &catalogs);
        let b = roll_quest(&s, 0, 7, &catalogs);
        assert_eq!(a, b);
    }

    #[test]
    fn constraints_stay_within_difficulty_tables() {
        let catalogs = world_content::catalogs();
        let s = settlement(SettlementKind::City);
        for i in 0..40 {
            let q = roll_quest(&s, i, 33, &catalogs);
            let spec = catalogs.difficulty_spec(q.difficulty);
            assert!((spec.gold.0..=spec.gold.1).contains(&q.reward_gold));
            assert!((spec.enemy_count.0..=spec.enemy_count.1).contains(&q.enemy_count));
            assert!((spec.travel.0..=spec.travel.1).contains(&q.travel_distance));
            assert!((1..=3).contains(&q.enemy_types.len()));
            for enemy in &q.enemy_types {
                assert!(spec.allowed_enemies.contains(&enemy.as_str()));
            }
            assert!(q.reward_items <= 2);
            assert_eq!(q.steps.len() as u32, q.total_steps);
        }
    }

    #[test]
    fn hamlet_quests_are_never_deadly() {
        let catalogs = world_content::catalogs();
        let s = settlement(SettlementKind::Hamlet);
        for i in 0..60 {
            let q = roll_quest(&s, i, i as u32, &catalogs);
            assert_ne!(q.difficulty, Difficulty::Deadly);
            assert!((5..=750).contains(&q.reward_gold));
        }
    }

    #[test]
    fn choices_only_point_forward() {
        let catalogs = world_content::catalogs();
        let s = settlement(SettlementKind::Town);
        for i in 0..20 {
            let q = roll_quest(&s, i, 99, &catalogs);
            for step in &q.steps {
                let is_last = step.id == q.total_steps;
                assert_eq!(step.choices.is_empty(), is_last);
                for choice in &step.choices {
                    assert!(choice.leads_to_step > step.id);
                    assert!(choice.leads_to_step <= q.total_steps);
                }
                assert!((1..=2).contains(&step.failure_triggers.len()));
            }
        }
    }

    #[test]
    fn seeding_respects_the_per_settlement_cap() {
        let catalogs = world_content::catalogs();
        let mut state = GameState::new(7);
        let s = settlement(SettlementKind::City);
        state.world.settlements.insert(s.id.clone(), s);
        let mut log = DeltaLog::new();
        seed_settlement_quests(&mut state, "site_0x0_0", &catalogs, &mut log);
        let seeded = &state.quests.all_quests_seeded["site_0x0_0"];
        assert!(seeded.len() <= state.quests.config.max_quests_per_settlement);
        // Seeding twice does not re-roll.
        let count = seeded.len();
        let mut log = DeltaLog::new();
        seed_settlement_quests(&mut state, "site_0x0_0", &catalogs, &mut log);
        assert!(log.is_empty());
        assert_eq!(state.quests.all_quests_seeded["site_0x0_0"].len(), count);
    }
}

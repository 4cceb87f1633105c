//! Quest lifecycle transitions: ask, accept, progress, complete.
//!
//! Every failure is a stable string code surfaced to the caller with the
//! session state unchanged.

use serde_json::json;

use crate::quest::{Quest, QuestStatus};
use crate::state::{Delta, DeltaLog, GameState};

/// Quest transition failures, surfaced as stable string codes.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum QuestError {
    #[error("no NPC was targeted")]
    NoNpcTarget,

    #[error("NPC id is not in the expected format")]
    InvalidNpcIdFormat,

    #[error("NPC not found")]
    NpcNotFound,

    #[error("NPC is not a quest giver")]
    NpcNotQuestGiver,

    #[error("no quest is available")]
    NoQuestAvailable,

    #[error("quest is already active")]
    QuestAlreadyActive,

    #[error("quest was already completed")]
    QuestAlreadyCompleted,

    #[error("active quest limit reached")]
    MaxActiveQuestsReached,

    #[error("no quest id was supplied")]
    NoQuestId,

    #[error("quest is not active")]
    QuestNotActive,

    #[error("this NPC did not give that quest")]
    WrongQuestGiver,

    #[error("quest objectives are not finished")]
    IncompleteQuest,
}

impl QuestError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoNpcTarget => "NO_NPC_TARGET",
            Self::InvalidNpcIdFormat => "INVALID_NPC_ID_FORMAT",
            Self::NpcNotFound => "NPC_NOT_FOUND",
            Self::NpcNotQuestGiver => "NPC_NOT_QUEST_GIVER",
            Self::NoQuestAvailable => "NO_QUEST_AVAILABLE",
            Self::QuestAlreadyActive => "QUEST_ALREADY_ACTIVE",
            Self::QuestAlreadyCompleted => "QUEST_ALREADY_COMPLETED",
            Self::MaxActiveQuestsReached => "MAX_ACTIVE_QUESTS_REACHED",
            Self::NoQuestId => "NO_QUEST_ID",
            Self::QuestNotActive => "QUEST_NOT_ACTIVE",
            Self::WrongQuestGiver => "WRONG_QUEST_GIVER",
            Self::IncompleteQuest => "INCOMPLETE_QUEST",
        }
    }
}

/// Quests currently offered by a settlement: seeded, still available, and
/// not already taken or finished.
pub fn available_quests<'a>(state: &'a GameState, settlement_id: &str) -> Vec<&'a Quest> {
    let Some(seeded) = state.quests.all_quests_seeded.get(settlement_id) else {
        return Vec::new();
    };
    seeded
        .iter()
        .filter(|q| {
            q.status == QuestStatus::Available
                && !state.quests.active.iter().any(|a| a.id == q.id)
                && !state.quests.completed.iter().any(|c| c.id == q.id)
        })
        .collect()
}

/// Resolves an NPC id to an offered quest without mutating anything.
pub fn ask_about_quest<'a>(
    state: &'a GameState,
    npc_id: Option<&str>,
) -> Result<&'a Quest, QuestError> {
    let npc_id = npc_id.filter(|s| !s.is_empty()).ok_or(QuestError::NoNpcTarget)?;
    if !npc_id.contains("#npc_") {
        return Err(QuestError::InvalidNpcIdFormat);
    }

    let npc = state
        .world
        .settlements
        .values()
        .flat_map(|s| s.npcs.iter())
        .find(|n| n.id == npc_id)
        .ok_or(QuestError::NpcNotFound)?;
    if !npc.is_quest_giver {
        return Err(QuestError::NpcNotQuestGiver);
    }

    available_quests(state, &npc.site_id)
        .into_iter()
        .find(|q| q.giver_npc_id.as_deref() == Some(npc_id))
        .ok_or(QuestError::NoQuestAvailable)
}

/// Accepts a seeded quest, moving a copy onto the active list.
pub fn accept_quest(
    state: &mut GameState,
    quest_id: Option<&str>,
    log: &mut DeltaLog,
) -> Result<Quest, QuestError> {
    let quest_id = quest_id.filter(|s| !s.is_empty()).ok_or(QuestError::NoQuestId)?;

    if state.quests.active.iter().any(|q| q.id == quest_id) {
        return Err(QuestError::QuestAlreadyActive);
    }
    if state.quests.completed.iter().any(|q| q.id == quest_id) {
        return Err(QuestError::QuestAlreadyCompleted);
    }
    let seeded = state
        .quests
        .seeded(quest_id)
        .ok_or(QuestError::NoQuestAvailable)?;
    if state.quests.active.len() >= state.quests.config.max_active_quests {
        return Err(QuestError::MaxActiveQuestsReached);
    }

    let mut quest = seeded.clone();
    quest.status = QuestStatus::Active;
    quest.current_step = 1;
    log.push(Delta::add(
        format!("/quests/active/{}", quest.id),
        json!(&quest),
    ));
    state.quests.active.push(quest.clone());
    Ok(quest)
}

/// Advances an active quest to `step` (or by one). Reaching the final step
/// marks the quest ready to complete.
pub fn progress_quest(
    state: &mut GameState,
    quest_id: Option<&str>,
    step: Option<u32>,
    log: &mut DeltaLog,
) -> Result<Quest, QuestError> {
    let quest_id = quest_id.filter(|s| !s.is_empty()).ok_or(QuestError::NoQuestId)?;
    let quest = state
        .quests
        .active
        .iter_mut()
        .find(|q| q.id == quest_id)
        .ok_or(QuestError::QuestNotActive)?;

    let next = step.unwrap_or(quest.current_step + 1).min(quest.total_steps);
    quest.current_step = next;
    if next == quest.total_steps {
        quest.status = QuestStatus::ReadyToComplete;
    }
    log.push(Delta::set(
        format!("/quests/active/{quest_id}"),
        json!(&*quest),
    ));
    Ok(quest.clone())
}

/// Completes an active quest: pays the gold reward into the inventory
/// (merging with existing gold), moves the quest to the completed list, and
/// decrements the giver's rank, floor-clamped at zero.
pub fn complete_quest(
    state: &mut GameState,
    quest_id: Option<&str>,
    via_npc: Option<&str>,
    log: &mut DeltaLog,
) -> Result<Quest, QuestError> {
    let quest_id = quest_id.filter(|s| !s.is_empty()).ok_or(QuestError::NoQuestId)?;

    let Some(index) = state.quests.active.iter().position(|q| q.id == quest_id) else {
        if state.quests.completed.iter().any(|q| q.id == quest_id) {
            return Err(QuestError::QuestAlreadyCompleted);
        }
        return Err(QuestError::QuestNotActive);
    };

    {
        let quest = &state.quests.active[index];
        if quest.current_step != quest.total_steps {
            return Err(QuestError::IncompleteQuest);
        }
        if let (Some(via), Some(giver)) = (via_npc, quest.giver_npc_id.as_deref())
            && via != giver
        {
            return Err(QuestError::WrongQuestGiver);
        }
    }

    let mut quest = state.quests.active.remove(index);
    quest.status = QuestStatus::Completed;

    state.player.add_gold(quest.reward_gold);
    log.push(Delta::set(
        "/player/inventory",
        json!(&state.player.inventory),
    ));
    log.inventory_rev = true;

    if let Some(giver_id) = quest.giver_npc_id.clone() {
        for settlement in state.world.settlements.values_mut() {
            if let Some(npc) = settlement.npcs.iter_mut().find(|n| n.id == giver_id) {
                npc.quest_giver_rank = npc.quest_giver_rank.saturating_sub(1);
            }
        }
    }

    log.push(Delta::set("/quests/active", json!(&state.quests.active)));
    log.push(Delta::add(
        format!("/quests/completed/{}", quest.id),
        json!(&quest),
    ));
    state.quests.completed.push(quest.clone());
    Ok(quest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SettlementKind;
    use chrono::TimeZone;

    /// State with one city settlement and three seeded quests.
    fn seeded_state() -> GameState {
        let catalogs = world_content::catalogs();
        let mut state = GameState::new(3);
        let now = chrono::Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let pool = crate::npc::generate_npc_pool(
            "site_0x0_0",
            60,
            20,
            (0, 0),
            crate::state::world::Dims { w: 12, h: 12 },
            now,
            &catalogs,
        );
        let settlement = crate::worldgen::generate_settlement(
            "site_0x0_0",
            SettlementKind::City,
            state.rng_seed,
            pool,
            &catalogs,
        );
        let quests: Vec<Quest> = (0..3)
            .map(|i| crate::quest::roll_quest(&settlement, i, state.rng_seed, &catalogs))
            .collect();
        state.world.settlements.insert(settlement.id.clone(), settlement);
        state
            .quests
            .all_quests_seeded
            .insert("site_0x0_0".to_string(), quests);
        state
    }

    fn first_seeded_id(state: &GameState) -> String {
        state.quests.all_quests_seeded["site_0x0_0"][0].id.clone()
    }

    #[test]
    fn accept_then_double_accept_fails() {
        let mut state = seeded_state();
        let id = first_seeded_id(&state);
        let mut log = DeltaLog::new();
        let quest = accept_quest(&mut state, Some(&id), &mut log).unwrap();
        assert_eq!(quest.status, QuestStatus::Active);
        assert_eq!(
            accept_quest(&mut state, Some(&id), &mut log),
            Err(QuestError::QuestAlreadyActive)
        );
    }

    #[test]
    fn accept_enforces_the_active_limit() {
        let mut state = seeded_state();
        let id = first_seeded_id(&state);
        for i in 0..state.quests.config.max_active_quests {
            state.quests.active.push(Quest {
                id: format!("filler_{i}"),
                ..state.quests.all_quests_seeded["site_0x0_0"][0].clone()
            });
        }
        let mut log = DeltaLog::new();
        assert_eq!(
            accept_quest(&mut state, Some(&id), &mut log),
            Err(QuestError::MaxActiveQuestsReached)
        );
    }

    #[test]
    fn unknown_quest_is_not_available() {
        let mut state = seeded_state();
        let mut log = DeltaLog::new();
        assert_eq!(
            accept_quest(&mut state, Some("quest_nowhere_9"), &mut log),
            Err(QuestError::NoQuestAvailable)
        );
        assert_eq!(
            accept_quest(&mut state, None, &mut log),
            Err(QuestError::NoQuestId)
        );
    }

    #[test]
    fn completion_pays_gold_and_demotes_the_giver() {
        let mut state = seeded_state();
        let id = first_seeded_id(&state);
        let mut log = DeltaLog::new();
        let quest = accept_quest(&mut state, Some(&id), &mut log).unwrap();
        let giver = quest.giver_npc_id.clone().unwrap();

        // Not finished yet.
        assert_eq!(
            complete_quest(&mut state, Some(&id), Some(&giver), &mut log),
            Err(QuestError::IncompleteQuest)
        );

        progress_quest(&mut state, Some(&id), Some(quest.total_steps), &mut log).unwrap();
        let done = complete_quest(&mut state, Some(&id), Some(&giver), &mut log).unwrap();
        assert_eq!(done.status, QuestStatus::Completed);
        assert!(state.quests.active.is_empty());
        assert_eq!(state.quests.completed.len(), 1);

        let gold: u32 = state.player.inventory.iter().map(|i| i.gold_amount()).sum();
        assert_eq!(gold, done.reward_gold);

        let rank = state.world.settlements["site_0x0_0"]
            .npcs
            .iter()
            .find(|n| n.id == giver)
            .unwrap()
            .quest_giver_rank;
        assert_eq!(rank, 2);

        // Completing again is a distinct error.
        assert_eq!(
            complete_quest(&mut state, Some(&id), Some(&giver), &mut log),
            Err(QuestError::QuestAlreadyCompleted)
        );
    }

    #[test]
    fn wrong_giver_is_rejected() {
        let mut state = seeded_state();
        let id = first_seeded_id(&state);
        let mut log = DeltaLog::new();
        let quest = accept_quest(&mut state, Some(&id), &mut log).unwrap();
        progress_quest(&mut state, Some(&id), Some(quest.total_steps), &mut log).unwrap();
        assert_eq!(
            complete_quest(&mut state, Some(&id), Some("site_0x0_0#npc_999"), &mut log),
            Err(QuestError::WrongQuestGiver)
        );
    }

    #[test]
    fn ask_about_quest_checks_the_npc_chain() {
        let state = seeded_state();
        assert_eq!(ask_about_quest(&state, None), Err(QuestError::NoNpcTarget));
        assert_eq!(
            ask_about_quest(&state, Some("gandalf")),
            Err(QuestError::InvalidNpcIdFormat)
        );
        assert_eq!(
            ask_about_quest(&state, Some("elsewhere#npc_1")),
            Err(QuestError::NpcNotFound)
        );
        let non_giver = state.world.settlements["site_0x0_0"]
            .npcs
            .iter()
            .find(|n| !n.is_quest_giver)
            .unwrap();
        assert_eq!(
            ask_about_quest(&state, Some(&non_giver.id)),
            Err(QuestError::NpcNotQuestGiver)
        );

        let giver = state.world.settlements["site_0x0_0"]
            .npcs
            .iter()
            .find(|n| n.is_quest_giver)
            .unwrap();
        match ask_about_quest(&state, Some(&giver.id)) {
            Ok(quest) => assert_eq!(quest.giver_npc_id.as_deref(), Some(giver.id.as_str())),
            Err(err) => assert_eq!(err, QuestError::NoQuestAvailable),
        }
    }
}

//! Quest data model.
//!
//! A quest is rolled constraint-first: reward, enemy set, and travel
//! distance are fully determined before any narrative exists. The narrative
//! layer only fills text fields and may be replaced wholesale by the
//! deterministic fallback without touching the constraints.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Quest difficulty bands, trivial to deadly.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash,
    Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    Trivial,
    Easy,
    Moderate,
    Hard,
    Deadly,
}

/// Structural complexity of the quest's step graph.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Complexity {
    Single,
    Short,
    Medium,
    Dynamic,
}

/// Lifecycle status of a quest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum QuestStatus {
    Available,
    Accepted,
    Active,
    ReadyToComplete,
    Completed,
}

/// A branch choice attached to a quest step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub id: String,
    pub leads_to_step: u32,
    #[serde(default)]
    pub consequences: Vec<String>,
}

/// A condition under which a step can fail, and what failure costs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FailureTrigger {
    /// One of observability, innocence, destruction, moral_choice.
    pub kind: String,
    /// permanent_failure, escalated_difficulty, or redemption_available.
    pub consequence: String,
}

/// One step of a quest's structure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuestStep {
    pub id: u32,
    #[serde(default)]
    pub narrative: String,
    #[serde(default)]
    pub objective: String,
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub failure_triggers: Vec<FailureTrigger>,
}

/// A fully-rolled quest.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quest {
    pub id: String,
    pub tier: u8,
    pub status: QuestStatus,
    pub difficulty: Difficulty,
    pub reward_gold: u32,
    pub reward_items: u32,
    pub enemy_types: Vec<String>,
    pub enemy_count: u32,
    pub complexity: Complexity,
    pub travel_distance: u32,
    pub forbidden_keywords: Vec<String>,
    pub settlement_type: String,
    pub population: u32,
    /// The raw constraint record the narrative was validated against.
    pub constraints: serde_json::Value,
    pub steps: Vec<QuestStep>,
    pub current_step: u32,
    pub total_steps: u32,
    #[serde(default)]
    pub giver_npc_id: Option<String>,
    #[serde(default)]
    pub protagonist: String,
    #[serde(default)]
    pub antagonist: String,
    #[serde(default)]
    pub narrative: String,
    #[serde(default)]
    pub objective_description: String,
    #[serde(default)]
    pub reward_description: String,
    #[serde(default)]
    pub narrative_hooks: Vec<String>,
    #[serde(default)]
    pub complications: Vec<String>,
    #[serde(default)]
    pub failure_conditions: Vec<String>,
    pub is_fallback: bool,
}

/// Quest bookkeeping configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuestConfig {
    #[serde(rename = "maxActiveQuests")]
    pub max_active_quests: usize,
    #[serde(rename = "maxQuestsPerSettlement")]
    pub max_quests_per_settlement: usize,
}

impl Default for QuestConfig {
    fn default() -> Self {
        Self {
            max_active_quests: 10,
            max_quests_per_settlement: 5,
        }
    }
}

/// Session-wide quest lists.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuestLog {
    pub active: Vec<Quest>,
    pub completed: Vec<Quest>,
    /// Quests seeded per settlement, keyed by settlement id.
    #[serde(rename = "allQuestsSeeded")]
    pub all_quests_seeded: BTreeMap<String, Vec<Quest>>,
    pub config: QuestConfig,
}

impl QuestLog {
    pub fn new() -> Self {
        Self {
            active: Vec::new(),
            completed: Vec::new(),
            all_quests_seeded: BTreeMap::new(),
            config: QuestConfig::default(),
        }
    }

    /// Finds a seeded quest by id across all settlements.
    pub fn seeded(&self, quest_id: &str) -> Option<&Quest> {
        self.all_quests_seeded
            .values()
            .flat_map(|quests| quests.iter())
            .find(|q| q.id == quest_id)
    }
}

impl Default for QuestLog {
    fn default() -> Self {
        Self::new()
    }
}

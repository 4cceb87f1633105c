//! Narrative validation and the deterministic fallback.
//!
//! An external generator proposes narrative text for a rolled quest; the
//! reply is accepted only when it honors every constraint the roll fixed.
//! Any violation falls back to the template library, which can always
//! produce a valid (if plain) narrative.

use serde_json::Value;

use crate::catalog::Catalogs;
use crate::quest::Quest;

/// Validated narrative fields extracted from a generator reply.
#[derive(Clone, Debug, PartialEq)]
pub struct NarrativeReply {
    pub narrative: String,
    pub objective_description: String,
    pub reward_description: String,
    pub protagonist: String,
    pub antagonist: String,
    pub step_narratives: Vec<String>,
    pub narrative_hooks: Vec<String>,
    pub complications: Vec<String>,
}

/// Reasons a generator reply is rejected.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum NarrativeError {
    #[error("reply is missing required field {0:?}")]
    MissingField(&'static str),

    #[error("reply mentions forbidden keyword {0:?}")]
    ForbiddenKeyword(String),

    #[error("reward description names a gold amount other than the rolled reward")]
    RewardMismatch,

    #[error("reply mentions enemy type {0:?} outside the allowed set")]
    DisallowedEnemy(String),

    #[error("reply step ids do not match the rolled structure")]
    StepMismatch,
}

fn required_str<'a>(
    reply: &'a Value,
    field: &'static str,
) -> Result<&'a str, NarrativeError> {
    reply
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or(NarrativeError::MissingField(field))
}

fn str_list(reply: &Value, field: &str) -> Vec<String> {
    reply
        .get(field)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Word-boundary containment: `needle` must not run into surrounding
/// letters, so "rat" does not match inside "grateful".
fn contains_word(haystack: &str, needle: &str) -> bool {
    let mut start = 0;
    while let Some(found) = haystack[start..].find(needle) {
        let at = start + found;
        let end = at + needle.len();
        let before_ok = at == 0
            || !haystack[..at]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_alphanumeric());
        let after_ok = end == haystack.len()
            || !haystack[end..].chars().next().is_some_and(|c| c.is_alphanumeric());
        if before_ok && after_ok {
            return true;
        }
        start = at + 1;
    }
    false
}

/// True when `text` names a gold amount different from `reward_gold`.
///
/// Scans for digit runs whose next word starts with "gold"; a matching
/// amount is fine, anything else is a violation.
fn mentions_wrong_gold(text: &str, reward_gold: u32) -> bool {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            let amount: Option<u32> = text[start..i].parse().ok();
            let rest = text[i..].trim_start();
            if rest.to_lowercase().starts_with("gold")
                && amount != Some(reward_gold)
            {
                return true;
            }
        } else {
            i += 1;
        }
    }
    false
}

/// Validates a generator reply against the quest's rolled constraints.
///
/// Checks, in order: required fields, forbidden keywords anywhere in the
/// text, reward-gold consistency, enemy types outside the difficulty's
/// allowed set, and step-id agreement with the rolled structure.
pub fn validate_narrative(
    reply: &Value,
    quest: &Quest,
    catalogs: &Catalogs,
) -> Result<NarrativeReply, NarrativeError> {
    let narrative = required_str(reply, "narrative")?.to_string();
    let objective_description = required_str(reply, "objective_description")?.to_string();
    let reward_description = required_str(reply, "reward_description")?.to_string();
    let protagonist = required_str(reply, "protagonist")?.to_string();
    let antagonist = required_str(reply, "antagonist")?.to_string();

    let steps = reply
        .get("steps")
        .and_then(Value::as_array)
        .ok_or(NarrativeError::MissingField("steps"))?;
    if steps.len() != quest.steps.len() {
        return Err(NarrativeError::StepMismatch);
    }
    let mut step_narratives = Vec::with_capacity(steps.len());
    for (expected, step) in quest.steps.iter().zip(steps) {
        let id = step.get("id").and_then(Value::as_u64);
        if id != Some(u64::from(expected.id)) {
            return Err(NarrativeError::StepMismatch);
        }
        step_narratives.push(required_str(step, "narrative")?.to_string());
    }

    let narrative_hooks = str_list(reply, "narrative_hooks");
    let complications = str_list(reply, "complications");

    let mut all_text: Vec<&str> = vec![
        &narrative,
        &objective_description,
        &reward_description,
        &protagonist,
        &antagonist,
    ];
    all_text.extend(step_narratives.iter().map(String::as_str));
    all_text.extend(narrative_hooks.iter().map(String::as_str));
    all_text.extend(complications.iter().map(String::as_str));

    let lowered: Vec<String> = all_text.iter().map(|t| t.to_lowercase()).collect();
    for keyword in &quest.forbidden_keywords {
        if lowered.iter().any(|t| contains_word(t, keyword)) {
            return Err(NarrativeError::ForbiddenKeyword(keyword.clone()));
        }
    }

    if mentions_wrong_gold(&reward_description, quest.reward_gold) {
        return Err(NarrativeError::RewardMismatch);
    }

    let allowed = catalogs.difficulty_spec(quest.difficulty).allowed_enemies;
    for spec in catalogs.difficulties {
        for enemy in spec.allowed_enemies {
            if !allowed.contains(enemy) && lowered.iter().any(|t| contains_word(t, enemy)) {
                return Err(NarrativeError::DisallowedEnemy(enemy.to_string()));
            }
        }
    }

    Ok(NarrativeReply {
        narrative,
        objective_description,
        reward_description,
        protagonist,
        antagonist,
        step_narratives,
        narrative_hooks,
        complications,
    })
}

/// Copies validated narrative fields into the quest.
pub fn integrate_narrative(quest: &mut Quest, reply: NarrativeReply) {
    quest.narrative = reply.narrative;
    quest.objective_description = reply.objective_description;
    quest.reward_description = reply.reward_description;
    quest.protagonist = reply.protagonist;
    quest.antagonist = reply.antagonist;
    for (step, text) in quest.steps.iter_mut().zip(reply.step_narratives) {
        step.narrative = text;
    }
    quest.narrative_hooks = reply.narrative_hooks;
    quest.complications = reply.complications;
    quest.is_fallback = false;
}

/// Fills the quest with the deterministic template narrative.
///
/// The per-difficulty template reuses the constraint's first enemy as the
/// antagonist type and substitutes `${settlement}`, `${reward_gold}`, and
/// `${enemy}` placeholders.
pub fn apply_fallback_narrative(quest: &mut Quest, settlement_name: &str, catalogs: &Catalogs) {
    let spec = catalogs.difficulty_spec(quest.difficulty);
    let enemy = quest
        .enemy_types
        .first()
        .cloned()
        .unwrap_or_else(|| "trouble".to_string());

    let fill = |template: &str| {
        template
            .replace("${settlement}", settlement_name)
            .replace("${reward_gold}", &quest.reward_gold.to_string())
            .replace("${enemy}", &enemy)
    };

    quest.narrative = fill(spec.fallback_template);
    quest.protagonist = "a worried petitioner".to_string();
    quest.antagonist = enemy.clone();
    quest.objective_description = fill(
        "Settle the ${enemy} trouble plaguing ${settlement} and report back.",
    );
    quest.reward_description = format!("{} gold on completion", quest.reward_gold);
    quest.narrative_hooks.clear();
    quest.complications.clear();
    quest.failure_conditions = quest
        .steps
        .iter()
        .flat_map(|s| s.failure_triggers.iter().map(|t| t.kind.clone()))
        .collect();
    for step in &mut quest.steps {
        step.objective = if step.id == quest.total_steps {
            fill("Finish the matter of the ${enemy} for good.")
        } else {
            fill("Follow the trail of the ${enemy}.")
        };
        step.narrative = format!("Step {}: {}", step.id, step.objective);
    }
    quest.is_fallback = true;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rolled_quest() -> Quest {
        use chrono::TimeZone;
        let catalogs = world_content::catalogs();
        let now = chrono::Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let pool = crate::npc::generate_npc_pool(
            "s",
            8,
            10,
            (0, 0),
            crate::state::world::Dims { w: 12, h: 12 },
            now,
            &catalogs,
        );
        let settlement = crate::worldgen::generate_settlement(
            "s",
            crate::catalog::SettlementKind::Town,
            3,
            pool,
            &catalogs,
        );
        crate::quest::roll_quest(&settlement, 0, 3, &catalogs)
    }

    fn valid_reply(quest: &Quest) -> Value {
        let steps: Vec<Value> = quest
            .steps
            .iter()
            .map(|s| json!({ "id": s.id, "narrative": format!("You press on ({}).", s.id) }))
            .collect();
        json!({
            "narrative": "A quiet plea reaches you in the market square.",
            "objective_description": "Root out the raiders' camp.",
            "reward_description": format!("{} gold, paid on return", quest.reward_gold),
            "protagonist": "the miller's daughter",
            "antagonist": "the raider captain",
            "steps": steps,
        })
    }

    #[test]
    fn valid_reply_integrates() {
        let catalogs = world_content::catalogs();
        let mut quest = rolled_quest();
        let reply = valid_reply(&quest);
        let validated = validate_narrative(&reply, &quest, &catalogs).unwrap();
        integrate_narrative(&mut quest, validated);
        assert!(!quest.is_fallback);
        assert_eq!(quest.protagonist, "the miller's daughter");
        assert!(quest.steps.iter().all(|s| !s.narrative.is_empty()));
    }

    #[test]
    fn missing_field_is_rejected() {
        let catalogs = world_content::catalogs();
        let quest = rolled_quest();
        let mut reply = valid_reply(&quest);
        reply.as_object_mut().unwrap().remove("protagonist");
        assert_eq!(
            validate_narrative(&reply, &quest, &catalogs),
            Err(NarrativeError::MissingField("protagonist"))
        );
    }

    #[test]
    fn forbidden_keyword_is_rejected() {
        let catalogs = world_content::catalogs();
        let quest = rolled_quest();
        let keyword = quest.forbidden_keywords[0].clone();
        let mut reply = valid_reply(&quest);
        reply["narrative"] = json!(format!("Beware the {keyword} of the hills."));
        assert_eq!(
            validate_narrative(&reply, &quest, &catalogs),
            Err(NarrativeError::ForbiddenKeyword(keyword))
        );
    }

    #[test]
    fn wrong_gold_amount_is_rejected() {
        let catalogs = world_content::catalogs();
        let quest = rolled_quest();
        let mut reply = valid_reply(&quest);
        reply["reward_description"] = json!(format!("{} gold", quest.reward_gold + 1));
        assert_eq!(
            validate_narrative(&reply, &quest, &catalogs),
            Err(NarrativeError::RewardMismatch)
        );
    }

    #[test]
    fn mismatched_step_ids_are_rejected() {
        let catalogs = world_content::catalogs();
        let quest = rolled_quest();
        let mut reply = valid_reply(&quest);
        reply["steps"][0]["id"] = json!(99);
        assert_eq!(
            validate_narrative(&reply, &quest, &catalogs),
            Err(NarrativeError::StepMismatch)
        );
    }

    #[test]
    fn fallback_fills_placeholders_and_stays_clean() {
        let catalogs = world_content::catalogs();
        let mut quest = rolled_quest();
        apply_fallback_narrative(&mut quest, "Thornfield", &catalogs);
        assert!(quest.is_fallback);
        assert!(!quest.narrative.contains("${"));
        assert!(quest.narrative.contains("Thornfield") || quest.objective_description.contains("Thornfield"));
        for keyword in &quest.forbidden_keywords {
            assert!(!quest.narrative.to_lowercase().contains(keyword.as_str()));
        }
    }
}

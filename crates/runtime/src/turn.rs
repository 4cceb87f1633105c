//! Per-turn sequencer.
//!
//! A turn runs entirely on a clone of the session state: timestamp and turn
//! id, intent normalization (cached, with the legacy fallback), validation,
//! action application with worldgen stepping, digest and fingerprint
//! recomputation, history append, and response assembly. The caller swaps
//! the returned state in atomically; a failed turn leaves the session
//! untouched.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Value, json};
use tracing::{debug, warn};

use world_core::catalog::Catalogs;
use world_core::quest::{integrate_narrative, validate_narrative};
use world_core::state::world::Cell;
use world_core::{
    Action, ActionError, Delta, DeltaLog, GameState, HistoryEntry, Intent, TrivialKind,
    apply_action, present_npcs, validate_intent,
};

use crate::providers::{
    CONFIDENCE_FLOOR, DeepSeekClient, FallbackNarrator, GameContext, IntentParser, LegacyParser,
    Narrator, ParseCache, QuestNarrativeProvider,
};

/// Input to one turn.
#[derive(Clone, Debug, Default)]
pub struct TurnInput {
    pub text: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub turn_id: Option<String>,
}

/// Everything a turn produces besides the new state.
#[derive(Clone, Debug)]
pub struct TurnOutput {
    pub turn_id: String,
    pub narrative: String,
    /// The two `[STATE-DELTA]` blocks plus `post_state_facts`.
    pub engine_output: String,
    pub scene: Value,
    pub deltas: Vec<Delta>,
    pub summaries: Vec<String>,
}

/// A rejected turn: stable code plus a human-readable reason. The session
/// state is unchanged.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct TurnError {
    pub code: String,
    pub message: String,
}

impl From<ActionError> for TurnError {
    fn from(err: ActionError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

/// The per-session turn sequencer, shared across sessions.
pub struct Orchestrator {
    catalogs: Arc<Catalogs>,
    parser: Option<Arc<dyn IntentParser>>,
    narrator: Option<Arc<dyn Narrator>>,
    quest_narrative: Option<Arc<dyn QuestNarrativeProvider>>,
    cache: ParseCache,
    seq: AtomicU64,
}

impl Orchestrator {
    /// Fallback-only orchestrator: legacy parser, template narrator.
    pub fn new(catalogs: Arc<Catalogs>) -> Self {
        Self {
            catalogs,
            parser: None,
            narrator: None,
            quest_narrative: None,
            cache: ParseCache::new(),
            seq: AtomicU64::new(0),
        }
    }

    /// Wires all three provider ports to a language-model client.
    pub fn with_llm(mut self, client: DeepSeekClient) -> Self {
        let client = Arc::new(client);
        self.parser = Some(client.clone());
        self.narrator = Some(client.clone());
        self.quest_narrative = Some(client);
        self
    }

    /// Overrides just the intent parser (scripted fixtures, tests).
    pub fn with_parser(mut self, parser: Arc<dyn IntentParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Overrides just the narrator.
    pub fn with_narrator(mut self, narrator: Arc<dyn Narrator>) -> Self {
        self.narrator = Some(narrator);
        self
    }

    pub fn catalogs(&self) -> &Catalogs {
        &self.catalogs
    }

    fn next_turn_id(&self, now: DateTime<Utc>) -> String {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let rnd: u16 = rand::random();
        format!(
            "t{}_{}_{}_{:04x}",
            now.timestamp_millis(),
            std::process::id(),
            seq,
            rnd
        )
    }

    /// Runs one turn against a snapshot, returning the successor state and
    /// the response payload.
    pub async fn run_turn(
        &self,
        state: &GameState,
        input: TurnInput,
    ) -> Result<(GameState, TurnOutput), TurnError> {
        // 1. Clone, stamp time and turn id.
        let mut next = state.clone();
        let now = input.timestamp.unwrap_or_else(Utc::now);
        let turn_id = input
            .turn_id
            .clone()
            .unwrap_or_else(|| self.next_turn_id(now));
        let mut log = DeltaLog::new();

        // 2. Advance world time.
        let stamp = now.to_rfc3339_opts(SecondsFormat::Secs, true);
        if next.world.time_utc != stamp {
            next.world.time_utc = stamp.clone();
            log.push(Delta::set("/world/time_utc", json!(stamp)));
        }

        // 3. Intent. The first utterance of a session is the world prompt.
        let intent = if !next.world.is_initialized() {
            let user_seed = (next.rng_seed != 0).then_some(next.rng_seed);
            world_core::init_world(&mut next, &input.text, user_seed, &self.catalogs, &mut log);
            world_core::world_gen_step(&mut next, &self.catalogs, &mut log);
            Intent {
                primary: Action::Trivial {
                    kind: TrivialKind::Look,
                },
                secondary: Vec::new(),
                compound: false,
                confidence: 1.0,
            }
        } else {
            self.normalize(&input.text, &next).await
        };

        // Validation failures surface to the caller; nothing is applied.
        let queue = validate_intent(&next, &intent)?;

        // 4. Apply the queue.
        let seeded_before: Vec<String> =
            next.quests.all_quests_seeded.keys().cloned().collect();
        let mut summaries = Vec::new();
        for queued in &queue {
            let outcome = apply_action(&mut next, queued, &self.catalogs, now, &mut log)?;
            summaries.push(outcome.summary);
        }
        self.upgrade_new_quest_narratives(&mut next, &seeded_before, &mut log)
            .await;

        // 5. Digests.
        next.digests.inventory_digest = world_core::inventory_digest(&next.player);

        // 6. Turn counter; merchants regenerate on every tenth turn.
        next.turn_counter += 1;
        if next.turn_counter % 10 == 0 {
            self.regenerate_merchants(&mut next, now, &mut log);
        }

        // 7-8. Revision counters, ledger, fingerprints.
        let raised = [
            (log.cell_rev, "cell_rev"),
            (log.site_rev, "site_rev"),
            (log.inventory_rev, "inventory_rev"),
            (log.merchant_state_rev, "merchant_state_rev"),
            (log.faction_rev, "faction_rev"),
        ];
        next.bump_revisions(&log);
        for (flag, counter) in raised {
            if flag {
                log.push(Delta::inc(format!("/counters/{counter}")));
            }
        }
        next.ledger_len += log.len() as u64;
        world_core::update_fingerprints(&mut next);

        // 9. History and response assembly.
        let entry = HistoryEntry {
            turn_id: turn_id.clone(),
            timestamp_utc: stamp,
            intent: intent.primary.name(),
            summary: summaries.join("; "),
        };
        next.history.push(entry.clone());

        let scene = build_scene(&next, &summaries);
        let engine_output = render_engine_output(&next, &entry, log.deltas());
        let narrative = self.narrate(&scene).await;

        debug!(
            %turn_id,
            turn = next.turn_counter,
            deltas = log.len(),
            "turn applied"
        );

        Ok((
            next,
            TurnOutput {
                turn_id,
                narrative,
                engine_output,
                scene,
                deltas: log.into_deltas(),
                summaries,
            },
        ))
    }

    /// Normalizes text through the cache, the semantic parser, and the
    /// legacy fallback, in that order. Empty text is a noop turn.
    async fn normalize(&self, text: &str, state: &GameState) -> Intent {
        if text.trim().is_empty() {
            return Intent::noop();
        }
        let ctx = build_context(state);
        let key = ParseCache::key(text, &ctx);
        if let Some(hit) = self.cache.get(&key) {
            return hit;
        }

        let parsed = match &self.parser {
            Some(parser) => match parser.normalize(text, &ctx).await {
                Ok(intent) if intent.confidence >= CONFIDENCE_FLOOR => Some(intent),
                Ok(intent) => {
                    warn!(confidence = intent.confidence, "parse below confidence floor");
                    None
                }
                Err(err) => {
                    warn!(code = err.code(), "semantic parse degraded");
                    None
                }
            },
            None => None,
        };

        let intent = parsed.unwrap_or_else(|| LegacyParser::parse(text));
        self.cache.insert(key, intent.clone());
        intent
    }

    /// Attempts a narrative upgrade for quests seeded this turn. Failures
    /// keep the deterministic fallback narrative already in place.
    async fn upgrade_new_quest_narratives(
        &self,
        state: &mut GameState,
        seeded_before: &[String],
        log: &mut DeltaLog,
    ) {
        let Some(provider) = &self.quest_narrative else {
            return;
        };
        let new_ids: Vec<String> = state
            .quests
            .all_quests_seeded
            .keys()
            .filter(|id| !seeded_before.contains(id))
            .cloned()
            .collect();

        for settlement_id in new_ids {
            let settlement_name = state
                .world
                .settlements
                .get(&settlement_id)
                .map(|s| s.name.clone())
                .unwrap_or_default();
            let Some(quests) = state.quests.all_quests_seeded.get_mut(&settlement_id) else {
                continue;
            };
            let mut changed = false;
            for quest in quests.iter_mut() {
                let request = json!({
                    "settlement": settlement_name,
                    "constraints": quest.constraints,
                    "steps": quest.steps.iter().map(|s| json!({ "id": s.id })).collect::<Vec<_>>(),
                });
                match provider.generate(&request).await {
                    Ok(reply) => match validate_narrative(&reply, quest, &self.catalogs) {
                        Ok(validated) => {
                            integrate_narrative(quest, validated);
                            changed = true;
                        }
                        Err(err) => {
                            warn!(quest = %quest.id, %err, "narrative rejected, keeping fallback");
                        }
                    },
                    Err(err) => {
                        warn!(quest = %quest.id, %err, "narrative generation degraded");
                    }
                }
            }
            if changed {
                log.push(Delta::set(
                    format!("/quests/allQuestsSeeded/{settlement_id}"),
                    json!(&state.quests.all_quests_seeded[&settlement_id]),
                ));
            }
        }
    }

    /// Tenth-turn merchant pass: traders restock; expiry is computed but
    /// expired merchants are not removed (pending behavior).
    fn regenerate_merchants(
        &self,
        state: &mut GameState,
        now: DateTime<Utc>,
        log: &mut DeltaLog,
    ) {
        let mut restocked = 0usize;
        let mut expired = 0usize;
        for settlement in state.world.settlements.values() {
            for npc in &settlement.npcs {
                if npc.job_category == "trader" {
                    restocked += 1;
                    let is_expired = npc
                        .expires_at_utc
                        .parse::<DateTime<Utc>>()
                        .map(|at| at < now)
                        .unwrap_or(false);
                    if is_expired {
                        expired += 1;
                    }
                }
            }
        }
        if restocked > 0 {
            log.merchant_state_rev = true;
            debug!(restocked, expired, "merchant stock refreshed");
        }
    }

    async fn narrate(&self, scene: &Value) -> String {
        if let Some(narrator) = &self.narrator {
            match narrator.narrate(scene).await {
                Ok(text) => return text,
                Err(err) => warn!(%err, "narration degraded to fallback"),
            }
        }
        FallbackNarrator::render(scene)
    }
}

/// Parser context from the player's surroundings.
fn build_context(state: &GameState) -> GameContext {
    let pos = state.world.position;
    let cell = state
        .world
        .cells
        .get(&Cell::key(pos.mx, pos.my, pos.lx, pos.ly));
    GameContext {
        layer: state.world.current_layer,
        location: state.world.l0_label(),
        biome: state.world.macro_biome.map(|b| b.to_string()),
        visible_items: cell
            .map(|c| c.items.iter().map(|i| i.name.clone()).collect())
            .unwrap_or_default(),
        present_npcs: present_npcs(state)
            .iter()
            .map(|n| n.job_category.clone())
            .collect(),
    }
}

/// Compact scene payload handed to the narrator.
fn build_scene(state: &GameState, summaries: &[String]) -> Value {
    let pos = state.world.position;
    let cell = state
        .world
        .cells
        .get(&Cell::key(pos.mx, pos.my, pos.lx, pos.ly));
    let history: Vec<&str> = state
        .history
        .iter()
        .rev()
        .take(20)
        .map(|h| h.summary.as_str())
        .collect();

    json!({
        "location": state.world.l0_label(),
        "layer": state.world.current_layer,
        "biome": state.world.macro_biome,
        "description": cell.and_then(|c| c.description.clone()),
        "visible_items": cell
            .map(|c| c.items.iter().map(|i| i.name.clone()).collect::<Vec<_>>())
            .unwrap_or_default(),
        "present_npcs": present_npcs(state)
            .iter()
            .map(|n| n.job_category.clone())
            .collect::<Vec<_>>(),
        "active_quests": state
            .quests
            .active
            .iter()
            .map(|q| q.objective_description.clone())
            .collect::<Vec<_>>(),
        "results": summaries,
        "recent_history": history,
    })
}

/// Per-cluster visibility metadata for the current macro.
fn cluster_meta(state: &GameState) -> Vec<Value> {
    let pos = state.world.position;
    let key = world_core::state::world::MacroCell::key(pos.mx, pos.my);
    state
        .world
        .macro_map
        .get(&key)
        .and_then(|m| m.site_plan.as_ref())
        .map(|plan| {
            plan.clusters
                .iter()
                .map(|c| {
                    json!({
                        "cluster_id": c.cluster_id,
                        "tier": c.tier,
                        "revealed": state
                            .world
                            .sites
                            .contains_key(&format!("site_{}", c.cluster_id)),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Renders the two-block engine output with trailing `post_state_facts`.
fn render_engine_output(state: &GameState, entry: &HistoryEntry, deltas: &[Delta]) -> String {
    let pos = state.world.position;
    let dims = state.world.l1_dims(pos.mx, pos.my);
    let facts = json!({
        "position": pos,
        "l0_id": state.world.l0_label(),
        "l1_dims": dims,
        "stream": state.world.stream,
        "clusters": cluster_meta(state),
        "inventory_digest": state.digests.inventory_digest,
    });

    format!(
        "[STATE-DELTA 1/2]\n{}\n[STATE-DELTA 2/2]\n{}\npost_state_facts:\n{}",
        serde_json::to_string_pretty(&json!({ "deltas": deltas })).unwrap_or_default(),
        serde_json::to_string_pretty(&json!({
            "history": entry,
            "fingerprint": state.fingerprint,
        }))
        .unwrap_or_default(),
        serde_json::to_string_pretty(&facts).unwrap_or_default(),
    )
}

//! HTTP routes: sessions, turns, saves, quests, diagnostics.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;
use tracing::info;

use runtime::{SystemCommand, TurnInput};
use world_core::quest::QuestError;
use world_core::{DeltaLog, GameState};

use crate::state::AppState;

const SESSION_HEADER: &str = "x-session-id";
const DEFAULT_PROMPT: &str = "A quiet frontier of fields and woods.";

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/init", post(init))
        .route("/reset", post(init))
        .route("/narrate", post(narrate))
        .route("/api/save", post(save))
        .route("/api/load", post(load))
        .route("/api/newsave", get(newsave))
        .route("/api/saves", get(list_saves))
        .route("/quest/available", get(quest_available))
        .route("/quest/accept", post(quest_accept))
        .route("/quest/progress", post(quest_progress))
        .route("/quest/complete", post(quest_complete))
        .route("/quest/active", get(quest_active))
        .route("/status", get(status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn session_id_from(headers: &HeaderMap) -> Option<String> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// JSON reply that echoes the resolved session id in body and header.
fn reply(session_id: &str, mut body: Value) -> Response {
    if let Some(map) = body.as_object_mut() {
        map.insert("sessionId".to_string(), json!(session_id));
    }
    let mut response = (StatusCode::OK, Json(body)).into_response();
    if let Ok(value) = HeaderValue::from_str(session_id) {
        response.headers_mut().insert(SESSION_HEADER, value);
    }
    response
}

// ---------------------------------------------------------------------------
// Sessions and turns
// ---------------------------------------------------------------------------

#[derive(Deserialize, Default)]
struct InitBody {
    prompt: Option<String>,
    seed: Option<u32>,
}

async fn init(
    State(app): State<Arc<AppState>>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Response {
    // The body is optional; an absent or malformed one means defaults.
    let body: InitBody = serde_json::from_slice(&body).unwrap_or_default();
    let (session_id, slot) = app.sessions.resolve(session_id_from(&headers).as_deref());
    let prompt = body.prompt.unwrap_or_else(|| DEFAULT_PROMPT.to_string());

    let fresh = GameState::new(body.seed.unwrap_or(0) & 0x7FFF_FFFF);
    let mut guard = slot.lock().await;
    *guard = fresh;

    let input = TurnInput {
        text: prompt.clone(),
        ..TurnInput::default()
    };
    match app.orchestrator.run_turn(&guard, input).await {
        Ok((next, _)) => {
            *guard = next;
            info!(%session_id, "world created");
            reply(
                &session_id,
                json!({
                    "status": "world_created",
                    "state": &*guard,
                    "prompt": prompt,
                }),
            )
        }
        Err(err) => reply(
            &session_id,
            json!({ "error": err.code, "message": err.message }),
        ),
    }
}

#[derive(Deserialize)]
struct NarrateBody {
    action: String,
}

async fn narrate(
    State(app): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<NarrateBody>,
) -> Response {
    let (session_id, slot) = app.sessions.resolve(session_id_from(&headers).as_deref());

    if let Some(command) = runtime::detect(&body.action) {
        return system_command(&app, &session_id, command).await;
    }

    let mut guard = slot.lock().await;
    let snapshot = guard.clone();
    let input = TurnInput {
        text: body.action,
        ..TurnInput::default()
    };
    match app.orchestrator.run_turn(&snapshot, input).await {
        Ok((next, output)) => {
            *guard = next;
            reply(
                &session_id,
                json!({
                    "narrative": output.narrative,
                    "state": &*guard,
                    "engine_output": output.engine_output,
                    "scene": output.scene,
                }),
            )
        }
        Err(err) => reply(
            &session_id,
            json!({ "error": err.code, "message": err.message }),
        ),
    }
}

/// Save/load/new-game/list-saves short-circuit the narrator.
async fn system_command(app: &AppState, session_id: &str, command: SystemCommand) -> Response {
    match command {
        SystemCommand::Save { name } => {
            let Some(state) = app.sessions.snapshot(session_id).await else {
                return reply(session_id, json!({ "error": "MISSING_SESSION_ID" }));
            };
            match app
                .saves
                .save(session_id, &name, &state, chrono::Utc::now())
            {
                Ok(final_name) => reply(
                    session_id,
                    json!({
                        "systemCommand": true,
                        "success": true,
                        "saveName": final_name,
                        "narrative": format!("Saved as \"{final_name}\"."),
                    }),
                ),
                Err(err) => reply(
                    session_id,
                    json!({ "systemCommand": true, "success": false, "error": err.code() }),
                ),
            }
        }
        SystemCommand::Load { name } => match app.saves.load(session_id, &name) {
            Ok(file) => {
                app.sessions.replace(session_id, file.game_state).await;
                reply(
                    session_id,
                    json!({
                        "systemCommand": true,
                        "success": true,
                        "narrative": format!("Loaded \"{}\".", file.save_name),
                    }),
                )
            }
            Err(err) => reply(
                session_id,
                json!({ "systemCommand": true, "success": false, "error": err.code() }),
            ),
        },
        SystemCommand::NewGame => {
            app.sessions.replace(session_id, GameState::new(0)).await;
            reply(
                session_id,
                json!({
                    "systemCommand": true,
                    "restart": true,
                    "narrative": "The world fades. Describe the one you want next.",
                }),
            )
        }
        SystemCommand::ListSaves => match app.saves.list(session_id) {
            Ok(saves) => {
                let names: Vec<&str> = saves.iter().map(|s| s.name.as_str()).collect();
                let narrative = if names.is_empty() {
                    "There are no saves yet.".to_string()
                } else {
                    format!("Saves: {}.", names.join(", "))
                };
                reply(
                    session_id,
                    json!({ "systemCommand": true, "success": true, "saves": saves, "narrative": narrative }),
                )
            }
            Err(err) => reply(
                session_id,
                json!({ "systemCommand": true, "success": false, "error": err.code() }),
            ),
        },
    }
}

// ---------------------------------------------------------------------------
// Save files
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct SaveBody {
    #[serde(rename = "saveName")]
    save_name: String,
    #[serde(rename = "gameState")]
    game_state: Option<Value>,
}

async fn save(
    State(app): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<SaveBody>,
) -> Response {
    let Some(session_id) = session_id_from(&headers) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "error": "MISSING_SESSION_ID" })),
        )
            .into_response();
    };

    let state = match body.game_state {
        Some(value) => match serde_json::from_value::<GameState>(value) {
            Ok(state) => state,
            Err(_) => {
                return reply(
                    &session_id,
                    json!({ "success": false, "error": "INVALID_GAME_STATE" }),
                );
            }
        },
        None => match app.sessions.snapshot(&session_id).await {
            Some(state) => state,
            None => {
                return reply(
                    &session_id,
                    json!({ "success": false, "error": "INVALID_GAME_STATE" }),
                );
            }
        },
    };

    match app
        .saves
        .save(&session_id, &body.save_name, &state, chrono::Utc::now())
    {
        Ok(final_name) => reply(
            &session_id,
            json!({
                "success": true,
                "saveName": final_name,
                "message": format!("Saved \"{final_name}\"."),
            }),
        ),
        Err(err) => reply(&session_id, json!({ "success": false, "error": err.code() })),
    }
}

#[derive(Deserialize)]
struct LoadBody {
    #[serde(rename = "saveName")]
    save_name: String,
}

async fn load(
    State(app): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<LoadBody>,
) -> Response {
    let (session_id, _) = app.sessions.resolve(session_id_from(&headers).as_deref());
    match app.saves.load(&session_id, &body.save_name) {
        Ok(file) => {
            let state = file.game_state.clone();
            app.sessions.replace(&session_id, file.game_state).await;
            reply(&session_id, json!({ "success": true, "gameState": state }))
        }
        Err(err) => reply(&session_id, json!({ "success": false, "error": err.code() })),
    }
}

async fn newsave(State(app): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let (session_id, _) = app.sessions.resolve(session_id_from(&headers).as_deref());
    let taken: Vec<String> = app
        .saves
        .list(&session_id)
        .map(|saves| saves.into_iter().map(|s| s.name).collect())
        .unwrap_or_default();
    let mut n = 1;
    while taken.contains(&format!("save {n}")) {
        n += 1;
    }
    reply(
        &session_id,
        json!({ "success": true, "saveName": format!("save {n}") }),
    )
}

async fn list_saves(State(app): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let (session_id, _) = app.sessions.resolve(session_id_from(&headers).as_deref());
    match app.saves.list(&session_id) {
        Ok(saves) => reply(&session_id, json!({ "success": true, "saves": saves })),
        Err(err) => reply(&session_id, json!({ "success": false, "error": err.code() })),
    }
}

// ---------------------------------------------------------------------------
// Quests
// ---------------------------------------------------------------------------

/// Runs a quest mutation on a clone under the session lock, swapping on
/// success so failed transitions leave the state untouched.
async fn quest_mutation<T: serde::Serialize>(
    app: &AppState,
    headers: &HeaderMap,
    mutate: impl FnOnce(&mut GameState, &mut DeltaLog) -> Result<T, QuestError>,
) -> Response {
    let (session_id, slot) = app.sessions.resolve(session_id_from(headers).as_deref());
    let mut guard = slot.lock().await;
    let mut next = guard.clone();
    let mut log = DeltaLog::new();
    match mutate(&mut next, &mut log) {
        Ok(result) => {
            next.bump_revisions(&log);
            next.ledger_len += log.len() as u64;
            world_core::update_fingerprints(&mut next);
            *guard = next;
            reply(
                &session_id,
                json!({ "success": true, "quest": result, "deltas": log.deltas() }),
            )
        }
        Err(err) => reply(&session_id, json!({ "success": false, "error": err.code() })),
    }
}

#[derive(Deserialize)]
struct AvailableQuery {
    #[serde(rename = "settlementId")]
    settlement_id: String,
}

async fn quest_available(
    State(app): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<AvailableQuery>,
) -> Response {
    let (session_id, slot) = app.sessions.resolve(session_id_from(&headers).as_deref());
    let guard = slot.lock().await;
    let quests: Vec<world_core::Quest> =
        world_core::quest::available_quests(&guard, &query.settlement_id)
            .into_iter()
            .cloned()
            .collect();
    reply(&session_id, json!({ "success": true, "quests": quests }))
}

#[derive(Deserialize)]
struct QuestBody {
    #[serde(rename = "questId")]
    quest_id: Option<String>,
    step: Option<u32>,
    #[serde(rename = "npcId")]
    npc_id: Option<String>,
}

async fn quest_accept(
    State(app): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<QuestBody>,
) -> Response {
    quest_mutation(&app, &headers, |state, log| {
        world_core::quest::accept_quest(state, body.quest_id.as_deref(), log)
    })
    .await
}

async fn quest_progress(
    State(app): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<QuestBody>,
) -> Response {
    quest_mutation(&app, &headers, |state, log| {
        world_core::quest::progress_quest(state, body.quest_id.as_deref(), body.step, log)
    })
    .await
}

async fn quest_complete(
    State(app): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<QuestBody>,
) -> Response {
    quest_mutation(&app, &headers, |state, log| {
        world_core::quest::complete_quest(
            state,
            body.quest_id.as_deref(),
            body.npc_id.as_deref(),
            log,
        )
    })
    .await
}

async fn quest_active(State(app): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let (session_id, slot) = app.sessions.resolve(session_id_from(&headers).as_deref());
    let guard = slot.lock().await;
    reply(&session_id, json!({ "success": true, "quests": guard.quests.active }))
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

async fn status(State(app): State<Arc<AppState>>) -> Json<Value> {
    let catalogs = app.orchestrator.catalogs();
    Json(json!({
        "status": "ok",
        "sessions": app.sessions.count(),
        "uptime_secs": app.started_at.elapsed().as_secs(),
        "llm_configured": app.llm_configured,
        "catalogs": {
            "traits": catalogs.traits.len(),
            "jobs": catalogs.jobs.len(),
            "biomes": catalogs.biomes.len(),
        },
    }))
}

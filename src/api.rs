//! Ops/debug HTTP surface and the chat-command boundary endpoint.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use tower_http::cors::CorsLayer;

use crate::calendar::providers::trading_economics::parse_release_time;
use crate::calendar::MacroEvent;
use crate::command::{self, Command};
use crate::config::Config;
use crate::interpret::{self, Interpretation};
use crate::store::{ProcessedStore, SubscriberStore};

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub subscribers: Arc<SubscriberStore>,
    pub processed: Arc<ProcessedStore>,
    pub last_poll_ts: Arc<AtomicU64>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/status", get(status))
        .route("/interpret", post(interpret_adhoc))
        .route("/command", post(run_command))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Serialize)]
struct StatusResp {
    subscribers: usize,
    processed_releases: usize,
    country: String,
    high_impact_only: bool,
    poll_interval_secs: u64,
    window_minutes: i64,
    last_poll_unix: u64,
}

async fn status(State(state): State<AppState>) -> Json<StatusResp> {
    Json(StatusResp {
        subscribers: state.subscribers.len(),
        processed_releases: state.processed.len(),
        country: state.cfg.country.clone(),
        high_impact_only: state.cfg.high_impact_only,
        poll_interval_secs: state.cfg.poll_interval_secs,
        window_minutes: state.cfg.window_minutes,
        last_poll_unix: state.last_poll_ts.load(Ordering::Relaxed),
    })
}

/// Ad-hoc classification of a raw row, for manual inspection.
#[derive(serde::Deserialize)]
struct InterpretReq {
    country: Option<String>,
    name: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    actual: Option<String>,
    #[serde(default)]
    forecast: Option<String>,
    #[serde(default)]
    previous: Option<String>,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default)]
    importance: Option<u8>,
    /// Provider-style datetime string; "now" when absent or unparseable.
    #[serde(default)]
    date: Option<String>,
}

async fn interpret_adhoc(
    State(state): State<AppState>,
    Json(body): Json<InterpretReq>,
) -> Json<Interpretation> {
    let raw_date = body.date.unwrap_or_default();
    let release_time_utc = parse_release_time(&raw_date).unwrap_or_else(Utc::now);
    let ev = MacroEvent {
        country: body.country.unwrap_or_else(|| state.cfg.country.clone()),
        name: body.name,
        category: body.category,
        actual: body.actual,
        forecast: body.forecast,
        previous: body.previous,
        unit: body.unit,
        importance: body.importance,
        release_time_utc,
        raw_date,
        source: None,
        source_url: None,
    };
    Json(interpret::interpret_event(&ev))
}

/// The transport black box delivers chat commands through here.
#[derive(serde::Deserialize)]
struct CommandReq {
    chat_id: i64,
    text: String,
}

#[derive(serde::Serialize)]
struct CommandResp {
    /// `null` when the text is not a recognized command.
    reply: Option<String>,
}

async fn run_command(
    State(state): State<AppState>,
    Json(body): Json<CommandReq>,
) -> Result<Json<CommandResp>, StatusCode> {
    let Some(cmd) = Command::parse(&body.text) else {
        return Ok(Json(CommandResp { reply: None }));
    };
    match command::execute(cmd, body.chat_id, &state.subscribers, &state.cfg).await {
        Ok(reply) => Ok(Json(CommandResp { reply: Some(reply) })),
        Err(e) => {
            tracing::error!(error = ?e, chat_id = body.chat_id, "command failed");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

//! HTTP API.
//!
//! Routes:
//! - `GET /health`: liveness plus session counters
//! - `POST /generate-word`: render the template and return a `.docx`
//! - `POST /status/generating`, `POST /status/completed`: poem status updates
//! - `GET /stream/:session_id`: server-sent events for one session

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::{Stream, StreamExt};
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::config::Config;
use crate::constants::{DOCX_MIME, DOWNLOAD_PREFIX, HEALTH_MESSAGE, KEY_FIRST_NAME, KEY_RHYME};
use crate::docx::{self, Context};
use crate::error::{Error, Result};
use crate::session::SessionHub;

/// State shared by all handlers.
pub struct AppState {
    /// Loaded configuration
    pub config: Config,
    /// Poem status relay
    pub sessions: SessionHub,
}

impl AppState {
    /// Fresh state for `config`.
    pub fn new(config: Config) -> Self {
        Self { config, sessions: SessionHub::new() }
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/generate-word", post(generate_word))
        .route("/status/generating", post(status_generating))
        .route("/status/completed", post(status_completed))
        .route("/stream/:session_id", get(stream_status))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind the configured host and port. `HOST` may be an IP address or a name
/// such as `localhost`.
pub async fn bind(config: &Config) -> Result<TcpListener> {
    TcpListener::bind((config.host.as_str(), config.port)).await.map_err(|e| {
        Error::config(
            format!("Cannot listen on {}:{}: {e}", config.host, config.port),
            "Check that HOST resolves to a local interface and PORT is free",
        )
    })
}

/// Bind and serve until the process stops.
pub async fn serve(config: Config) -> Result<()> {
    let listener = bind(&config).await?;
    let state = Arc::new(AppState::new(config));

    tracing::info!("Sinterklaas Word Generator listening on {}", listener.local_addr()?);
    tracing::info!("SSE endpoint: /stream/:session_id");
    tracing::info!("POST endpoints: /generate-word, /status/generating, /status/completed");

    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Parse a request body as a JSON object; anything else reads as `{}`.
fn json_object(body: &[u8]) -> Map<String, Value> {
    serde_json::from_slice(body).unwrap_or_default()
}

/// JSON truthiness: `null`, `false`, `0`, `""`, `[]` and `{}` are falsy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Truthy field value, if present.
fn required<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    fields.get(key).filter(|value| is_truthy(value))
}

/// Text of a field value: strings as-is, anything else as JSON.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Download file name for a session; only `[A-Za-z0-9_-]` survive.
fn download_name(session_id: &str) -> String {
    let safe: String = session_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
        .collect();
    format!("{DOWNLOAD_PREFIX}{safe}.docx")
}

async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": HEALTH_MESSAGE,
        "connections": state.sessions.connection_count(),
        "poems": state.sessions.poem_count(),
    }))
}

async fn generate_word(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Response> {
    let fields = json_object(&body);

    let (Some(name), Some(rhyme)) = (required(&fields, KEY_FIRST_NAME), required(&fields, KEY_RHYME))
    else {
        return Err(Error::BadRequest("voornaam and rijm are required"));
    };

    let mut context = Context::new();
    context.insert(KEY_FIRST_NAME, name.clone()).insert(KEY_RHYME, rhyme.clone());
    let session_id = fields.get("session_id").map(value_text).unwrap_or_default();

    let path = state.config.template_path.clone();
    let style = state.config.paragraph_style.clone();
    let document = tokio::task::spawn_blocking(move || docx::render_file(&path, &context, style.as_ref()))
        .await
        .map_err(|e| Error::Msg(format!("render task failed: {e}")))?
        .inspect_err(|e| tracing::error!("Error generating Word document: {e}"))?;

    tracing::info!("Generated document for session {session_id:?} ({} bytes)", document.len());

    let disposition = format!("attachment; filename=\"{}\"", download_name(&session_id));
    Ok((
        [
            (header::CONTENT_TYPE, DOCX_MIME.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document,
    )
        .into_response())
}

async fn status_generating(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Json<Value>> {
    let fields = json_object(&body);
    let Some(session_id) = required(&fields, "session_id").map(value_text) else {
        return Err(Error::BadRequest("session_id is required"));
    };

    state.sessions.mark_generating(&session_id);
    Ok(Json(json!({ "success": true, "message": "Status updated to generating" })))
}

async fn status_completed(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Json<Value>> {
    let fields = json_object(&body);
    let (Some(session_id), Some(poem)) = (required(&fields, "session_id"), required(&fields, "poem"))
    else {
        return Err(Error::BadRequest("session_id and poem are required"));
    };

    state.sessions.mark_completed(&value_text(session_id), &value_text(poem));
    Ok(Json(json!({ "success": true, "message": "Poem completed and sent" })))
}

async fn stream_status(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Sse<impl Stream<Item = std::result::Result<Event, axum::Error>>> {
    let events = state
        .sessions
        .subscribe(&session_id)
        .map(|status| Event::default().json_data(status));
    Sse::new(events).keep_alive(KeepAlive::default())
}

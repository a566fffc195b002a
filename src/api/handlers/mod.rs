use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::{Html, IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use super::AppState;
use crate::chat::PROMPT_FOR_INPUT;
use crate::models::{ChatReply, ChatRequest, Session};

/// Cookie carrying the session id. The session itself stays server-side.
pub const SESSION_COOKIE: &str = "almostme_sid";

const INDEX_HTML: &str = include_str!("../static/index.html");
const SCRIPT_JS: &str = include_str!("../static/script.js");

// ============================================================
// Session plumbing
// ============================================================

/// Read the session id from the `Cookie` header, if any.
pub fn session_id_from(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

fn session_cookie(id: Uuid) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id)
}

fn expired_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

fn with_cookie(mut response: Response, cookie: String) -> Response {
    match HeaderValue::from_str(&cookie) {
        Ok(value) => {
            response.headers_mut().insert(header::SET_COOKIE, value);
        }
        Err(e) => tracing::error!("Invalid session cookie: {}", e),
    }
    response
}

/// Load the caller's session, or start a new one. Store failures degrade to
/// a fresh, unsaved session so the turn still completes.
fn resolve_session(state: &AppState, headers: &HeaderMap) -> (Session, bool) {
    if let Some(id) = session_id_from(headers) {
        match state.sessions.load(id) {
            Ok(Some(session)) => return (session, false),
            Ok(None) => tracing::debug!("Session {} not found or expired", id),
            Err(e) => tracing::error!("Failed to load session {}: {:#}", id, e),
        }
    }
    (Session::new(Uuid::new_v4()), true)
}

fn persist(state: &AppState, session: &Session) {
    if let Err(e) = state.sessions.save(session) {
        tracing::error!("Failed to save session {}: {:#}", session.id, e);
    }
}

// ============================================================
// Health
// ============================================================

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let knowledge = state.chat.knowledge();
    Json(serde_json::json!({
        "status": "ok",
        "manuals": knowledge.catalog().len(),
        "domains": knowledge.domains().len(),
        "model_configured": state.model_configured,
    }))
}

// ============================================================
// UI
// ============================================================

/// Chat UI shell. Every page load starts a fresh conversation.
pub async fn index(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(old) = session_id_from(&headers) {
        if let Err(e) = state.sessions.remove(old) {
            tracing::warn!("Failed to drop previous session {}: {:#}", old, e);
        }
    }

    let session = Session::new(Uuid::new_v4());
    persist(&state, &session);

    with_cookie(Html(INDEX_HTML).into_response(), session_cookie(session.id))
}

pub async fn script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        SCRIPT_JS,
    )
}

// ============================================================
// Chat
// ============================================================

/// `POST /chat`. Always answers 200 with a [`ChatReply`]; unreadable bodies
/// count as an empty message.
pub async fn chat(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let request: ChatRequest = serde_json::from_slice(&body).unwrap_or_else(|e| {
        tracing::debug!("Unreadable chat body: {}", e);
        ChatRequest::default()
    });

    if request.message.trim().is_empty() {
        return Json(ChatReply::text(PROMPT_FOR_INPUT)).into_response();
    }

    let (mut session, is_new) = resolve_session(&state, &headers);
    let reply = state.chat.handle(&mut session, &request.message).await;
    persist(&state, &session);

    let response = Json(reply).into_response();
    if is_new {
        with_cookie(response, session_cookie(session.id))
    } else {
        response
    }
}

/// `POST /reset`. Forget the caller's conversation.
pub async fn reset(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(id) = session_id_from(&headers) {
        match state.sessions.remove(id) {
            Ok(existed) => tracing::debug!("Reset session {} (existed: {})", id, existed),
            Err(e) => tracing::error!("Failed to reset session {}: {:#}", id, e),
        }
    }

    with_cookie(
        Json(serde_json::json!({ "status": "reset" })).into_response(),
        expired_cookie(),
    )
}

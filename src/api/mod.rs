mod handlers;
mod middleware;

pub use handlers::{session_id_from, SESSION_COOKIE};
pub use middleware::{RateLimiter, SecurityConfig};

use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::chat::ChatService;
use crate::session::SessionStore;

/// Shared request state: immutable chat pipeline plus the session store.
#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatService>,
    pub sessions: Arc<dyn SessionStore>,
    pub model_configured: bool,
}

impl AppState {
    pub fn new(chat: ChatService, sessions: Arc<dyn SessionStore>, model_configured: bool) -> Self {
        Self {
            chat: Arc::new(chat),
            sessions,
            model_configured,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    create_router_with_config(state, SecurityConfig::disabled())
}

pub fn create_router_with_config(state: AppState, config: SecurityConfig) -> Router {
    let mut chat = Router::new().route("/chat", post(handlers::chat));
    if let Some(limiter) = config.rate_limiter.clone() {
        chat = chat.route_layer(from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    Router::new()
        .route("/", get(handlers::index))
        .route("/static/script.js", get(handlers::script))
        .route("/reset", post(handlers::reset))
        .route("/health", get(handlers::health))
        .merge(chat)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(config.cors_layer()),
        )
        .with_state(state)
}

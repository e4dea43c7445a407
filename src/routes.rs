use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::*,
};
use log::warn;
use serde_json::{Value, json};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{api, middleware, state::AppState};

pub fn build_router(shared_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/auth/signup", post(api::account::sign_up))
        .route("/auth/signin", post(api::account::sign_in))
        .nest(
            "/api",
            Router::new()
                .route("/auth/signout", post(api::account::sign_out))
                .route("/account", get(api::account::get_account))
                .route(
                    "/tasks",
                    get(api::tasks::list_tasks)
                        .post(api::tasks::create_task)
                        .delete(api::tasks::delete_all_tasks),
                )
                .route("/tasks/agenda", get(api::tasks::get_agenda))
                .route(
                    "/tasks/{id}",
                    patch(api::tasks::update_task).delete(api::tasks::delete_task),
                )
                .route("/analytics", get(api::analytics::get_analytics))
                .layer(from_fn_with_state(
                    shared_state.clone(),
                    middleware::jwt_auth_middleware_user,
                ))
                // Added after the layer: a browser socket cannot send headers,
                // so this route checks the token in its query string instead
                .route("/tasks/live", get(api::tasks::live_tasks_handler)),
        )
        .with_state(shared_state.clone())
        .layer(cors_layer(&shared_state.config.cors_origins))
        .layer(TraceLayer::new_for_http())
}

/// An empty origin list allows any origin, which is what a UI served from a
/// dev server or a local file needs.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return base.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin {:?}: {}", origin, e);
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(parsed))
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let (cached_users, revoked_tokens) = state.storage.get_cache_stats();
    Json(json!({
        "status": "healthy",
        "users": state.storage.users.count(),
        "cachedUsers": cached_users,
        "revokedTokens": revoked_tokens,
        "liveSubscribers": state.feed.subscriber_count(),
        "timestamp": chrono::Utc::now()
    }))
}

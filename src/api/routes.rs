//! API route definitions.

use axum::{
    Router, middleware,
    routing::{get, patch, post, put},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::auth::auth_gate;

use super::handlers;
use super::state::AppState;

/// Create the application router.
///
/// Every route sits behind the authentication gate; the gate itself lets
/// anonymous requests through, and per-handler extractors decide what each
/// endpoint actually requires.
pub fn create_router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let gate = state.gate.clone();

    Router::new()
        .route("/auth/access-token", post(handlers::get_access_token))
        .route("/auth/refresh-token", post(handlers::get_refresh_token))
        .route("/users", get(handlers::list_users))
        .route(
            "/users/{id}",
            get(handlers::get_user).delete(handlers::delete_user),
        )
        .route("/users/add", post(handlers::create_user))
        .route("/users/upd", put(handlers::update_user))
        .route("/users/change-pwd", patch(handlers::change_password))
        .route("/health", get(handlers::health))
        .layer(middleware::from_fn_with_state(gate, auth_gate))
        .layer(cors)
        .layer(trace_layer)
        .with_state(state)
}

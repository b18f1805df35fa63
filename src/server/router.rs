//! Route table for the HTTP API.

use axum::{
    Router,
    routing::{get, post},
};
use tracing::instrument;

use super::handlers;
use super::state::AppState;

/// Builds the application router.
#[instrument(skip(state))]
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/profiles/{id}",
            get(handlers::get_profile).put(handlers::update_profile),
        )
        .route("/profiles/{id}/games", get(handlers::list_games))
        .route("/profiles/{id}/statistics", get(handlers::get_statistics))
        .route(
            "/profiles/{id}/settings",
            get(handlers::get_settings).put(handlers::update_settings),
        )
        .route("/games", post(handlers::submit_game))
        .route("/rankings/{partition}", get(handlers::get_rankings))
        .fallback(handlers::not_found);

    Router::new()
        .route("/auth/callback", get(handlers::auth_callback))
        .nest("/api", api)
        .with_state(state)
}

//! HTTP handlers. Each delegates to [`ProfileService`](crate::ProfileService).

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::Redirect,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use super::error::AppError;
use super::extract::{ApiJson, ApiPath};
use super::state::AppState;
use crate::auth::{CallbackRedirect, resolve_callback};
use crate::db::{GameRecord, GameSummary, Profile, ProfileChanges, Ranking};
use crate::profile_service::{ProfileService, ServiceError, StatisticsReport};
use crate::ranking::RankingPartition;
use crate::settings::UserSettings;

/// Result type for JSON handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// Runs a service call on the blocking pool; SQLite I/O is synchronous.
async fn with_service<T, F>(state: &AppState, f: F) -> Result<T, AppError>
where
    F: FnOnce(&ProfileService) -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    let service = Arc::clone(&state.service);
    let value = tokio::task::spawn_blocking(move || f(&service))
        .await
        .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))??;
    Ok(value)
}

/// Query string of `/auth/callback`.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    /// One-time code issued by the provider.
    pub code: Option<String>,
}

/// Body of `POST /api/games`.
#[derive(Debug, Deserialize)]
pub struct SubmitGameRequest {
    /// Owner; absent for guest games.
    #[serde(default)]
    pub user_id: Option<i32>,
    /// Client play session.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Final numbers.
    #[serde(flatten)]
    pub summary: GameSummary,
}

/// GET /auth/callback
#[instrument(skip(state, query))]
pub async fn auth_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Redirect {
    let outcome = resolve_callback(state.auth.as_ref(), query.code.as_deref()).await;

    let redirect = match outcome.session {
        Some(session) => {
            let user = session.user().clone();
            match with_service(&state, move |s| s.get_or_create_profile(&user, None)).await {
                Ok(profile) => {
                    info!(user_id = profile.id(), "Signed in");
                    outcome.redirect
                }
                Err(e) => {
                    warn!(error = ?e, "Profile setup failed after sign in");
                    CallbackRedirect::UnknownError
                }
            }
        }
        None => outcome.redirect,
    };
    Redirect::to(&redirect.location())
}

/// GET /api/profiles/{id}
pub async fn get_profile(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> HandlerResult<Profile> {
    Ok(Json(with_service(&state, move |s| s.get_profile(id)).await?))
}

/// PUT /api/profiles/{id}
pub async fn update_profile(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(changes): ApiJson<ProfileChanges>,
) -> HandlerResult<Profile> {
    Ok(Json(
        with_service(&state, move |s| s.update_profile(id, changes)).await?,
    ))
}

/// POST /api/games
#[instrument(skip(state, request), fields(user_id = ?request.user_id))]
pub async fn submit_game(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SubmitGameRequest>,
) -> Result<(StatusCode, Json<GameRecord>), AppError> {
    let played_at = Utc::now().naive_utc();
    let record = with_service(&state, move |s| {
        s.record_summary(
            &request.summary,
            request.user_id,
            request.session_id,
            played_at,
        )
    })
    .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/profiles/{id}/games
pub async fn list_games(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> HandlerResult<Vec<GameRecord>> {
    Ok(Json(with_service(&state, move |s| s.get_history(id)).await?))
}

/// GET /api/profiles/{id}/statistics
pub async fn get_statistics(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> HandlerResult<StatisticsReport> {
    Ok(Json(
        with_service(&state, move |s| s.get_statistics(id)).await?,
    ))
}

/// GET /api/rankings/{partition}
pub async fn get_rankings(
    State(state): State<AppState>,
    ApiPath(partition): ApiPath<String>,
) -> HandlerResult<Vec<Ranking>> {
    let partition: RankingPartition = partition
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Unknown ranking partition: '{}'", partition)))?;
    Ok(Json(
        with_service(&state, move |s| s.get_rankings(partition)).await?,
    ))
}

/// GET /api/profiles/{id}/settings
pub async fn get_settings(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> HandlerResult<UserSettings> {
    Ok(Json(with_service(&state, move |s| s.get_settings(id)).await?))
}

/// PUT /api/profiles/{id}/settings
pub async fn update_settings(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(settings): ApiJson<UserSettings>,
) -> HandlerResult<UserSettings> {
    Ok(Json(
        with_service(&state, move |s| s.update_settings(id, settings)).await?,
    ))
}

/// Fallback for unknown API paths.
pub async fn not_found() -> AppError {
    AppError::NotFound("No such endpoint".to_string())
}

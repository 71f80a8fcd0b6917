use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use std::sync::Arc;

use crate::auth::AuthUser;
use crate::models::{Habit, SaveHabitRequest, ToggleRequest, ToggleResponse};
use crate::AppState;

use super::{created, ApiError, MessageResponse};

/// POST /habits
pub async fn create_habit(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<SaveHabitRequest>,
) -> Result<(StatusCode, Json<Habit>), ApiError> {
    let fields = req.validate().map_err(ApiError::bad_request)?;
    let habit = state.store.create_habit(auth.claims.sub, &fields).await?;
    Ok(created(habit))
}

/// GET /habits
pub async fn list_habits(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Habit>>, ApiError> {
    let habits = state.store.list_habits(auth.claims.sub).await?;
    Ok(Json(habits))
}

/// PUT /habits/:id
pub async fn update_habit(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<SaveHabitRequest>,
) -> Result<Json<Habit>, ApiError> {
    let fields = req.validate().map_err(ApiError::bad_request)?;
    let habit = state
        .store
        .update_habit(auth.claims.sub, id, &fields)
        .await?;
    Ok(Json(habit))
}

/// DELETE /habits/:id
pub async fn delete_habit(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.store.delete_habit(auth.claims.sub, id).await?;
    Ok(MessageResponse::new("habit deleted"))
}

/// POST /habits/:id/toggle
pub async fn toggle_habit(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<ToggleRequest>,
) -> Result<Json<ToggleResponse>, ApiError> {
    let date = match req.date.as_deref().filter(|d| !d.is_empty()) {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| ApiError::bad_request("date must be a YYYY-MM-DD date"))?,
        None => Utc::now().date_naive(),
    };

    let outcome = state.store.toggle_habit(auth.claims.sub, id, date).await?;

    Ok(Json(ToggleResponse {
        success: true,
        completed_dates: outcome.completed_dates,
        // The transition just performed, not the habit's stored flag
        is_completed: outcome.marked,
    }))
}

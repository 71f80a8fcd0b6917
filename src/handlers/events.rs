use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::auth::AuthUser;
use crate::models::{Event, EventsQuery, SaveEventRequest};
use crate::AppState;

use super::{created, ApiError, MessageResponse};

/// POST /events
pub async fn create_event(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<SaveEventRequest>,
) -> Result<(StatusCode, Json<Event>), ApiError> {
    let fields = req.validate().map_err(ApiError::bad_request)?;
    let event = state.store.create_event(auth.claims.sub, &fields).await?;
    Ok(created(event))
}

/// GET /events?month&year
pub async fn list_events(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<Vec<Event>>, ApiError> {
    let range = query.month_range().map_err(ApiError::bad_request)?;
    let events = state.store.list_events(auth.claims.sub, range).await?;
    Ok(Json(events))
}

/// PUT /events/:id
pub async fn update_event(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<SaveEventRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let fields = req.validate().map_err(ApiError::bad_request)?;
    state
        .store
        .update_event(auth.claims.sub, id, &fields)
        .await?;
    Ok(MessageResponse::new("event updated"))
}

/// DELETE /events/:id
pub async fn delete_event(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.store.delete_event(auth.claims.sub, id).await?;
    Ok(MessageResponse::new("event deleted"))
}

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::auth::{self, AuthUser};
use crate::models::{LoginRequest, LoginResponse, RegisterRequest, VerifyTokenResponse};
use crate::AppState;

use super::{ApiError, MessageResponse};

/// POST /register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    if req.username.is_empty() || req.password.is_empty() {
        return Err(ApiError::bad_request("username and password are required"));
    }

    if state
        .store
        .get_user_by_username(&req.username)
        .await?
        .is_some()
    {
        return Err(ApiError::conflict("A user with this username already exists"));
    }

    let password_hash = bcrypt::hash(&req.password, bcrypt::DEFAULT_COST)
        .map_err(|_| ApiError::internal("password hashing error"))?;

    state.store.create_user(&req.username, &password_hash).await?;

    Ok((StatusCode::CREATED, MessageResponse::new("user registered")))
}

/// POST /login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    // Unknown username and wrong password must be indistinguishable
    let user = state
        .store
        .get_user_by_username(&req.username)
        .await
        .map_err(|_| ApiError::internal("database error"))?
        .ok_or_else(|| ApiError::unauthorized("invalid username or password"))?;

    let valid = bcrypt::verify(&req.password, &user.password_hash)
        .map_err(|_| ApiError::internal("password verification error"))?;

    if !valid {
        return Err(ApiError::unauthorized("invalid username or password"));
    }

    let token = auth::issue_token(
        &state.config.jwt_secret,
        state.config.token_ttl_secs,
        user.id,
        &user.username,
    )
    .map_err(|e| ApiError::internal(format!("token generation error: {}", e)))?;

    Ok(Json(LoginResponse {
        token,
        username: user.username,
    }))
}

/// GET /verify-token
pub async fn verify_token(auth: AuthUser) -> Json<VerifyTokenResponse> {
    Json(VerifyTokenResponse {
        valid: true,
        username: auth.claims.username,
    })
}

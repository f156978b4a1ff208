//! Auth handlers

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::{hash_password, verify_password};
use crate::core::ServerState;
use crate::db::models::{User, UserView};
use crate::db::StoreError;
use crate::utils::{ok, AppError, AppResponse, AppResult};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserView,
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<ServerState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Json<AppResponse<AuthResponse>>> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let password_hash = hash_password(&req.password)?;
    let user = User::new(req.name, req.email, password_hash);

    match state.store.insert_user(&user) {
        Ok(()) => {}
        Err(StoreError::EmailTaken(email)) => {
            return Err(AppError::Conflict(format!("Email already registered: {}", email)));
        }
        Err(e) => return Err(e.into()),
    }

    let token = state
        .jwt_service
        .generate_token(&user)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    tracing::info!(user_id = %user.id, "User registered");
    Ok(ok(AuthResponse {
        token,
        user: UserView::from(&user),
    }))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<AppResponse<AuthResponse>>> {
    let user = state
        .store
        .get_user_by_email(&req.email)?
        .ok_or_else(AppError::invalid_credentials)?;

    if !verify_password(&req.password, &user.password_hash) {
        return Err(AppError::invalid_credentials());
    }

    let token = state
        .jwt_service
        .generate_token(&user)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(ok(AuthResponse {
        token,
        user: UserView::from(&user),
    }))
}

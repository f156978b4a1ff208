//! Request extractors
//!
//! [`CurrentUser`] validates the JWT and rejects anonymous requests.
//! [`Identity`] accepts either a JWT or an `X-Guest-Id` header, so cart
//! endpoints work for guests too.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::auth::{Claims, JwtError, JwtService};
use crate::core::ServerState;
use crate::db::models::CartIdentity;
use crate::utils::AppError;

/// Header carrying the client-generated guest id
pub const GUEST_ID_HEADER: &str = "x-guest-id";

/// The authenticated user behind a request
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub is_vip: bool,
    pub is_admin: bool,
}

impl From<Claims> for CurrentUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            name: claims.name,
            email: claims.email,
            is_vip: claims.is_vip,
            is_admin: claims.is_admin,
        }
    }
}

impl CurrentUser {
    /// Reject non-admin users
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin access required".to_string()))
        }
    }
}

fn validate_bearer(parts: &mut Parts, state: &ServerState) -> Result<Option<CurrentUser>, AppError> {
    // Already extracted earlier in the request?
    if let Some(user) = parts.extensions.get::<CurrentUser>() {
        return Ok(Some(user.clone()));
    }

    let auth_header = parts
        .headers
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let Some(header) = auth_header else {
        return Ok(None);
    };
    let token = JwtService::extract_from_header(header)
        .ok_or_else(|| AppError::InvalidToken)?;

    match state.jwt_service.validate_token(token) {
        Ok(claims) => {
            let user = CurrentUser::from(claims);
            parts.extensions.insert(user.clone());
            Ok(Some(user))
        }
        Err(JwtError::ExpiredToken) => Err(AppError::TokenExpired),
        Err(e) => {
            tracing::warn!(error = %e, uri = %parts.uri, "Token validation failed");
            Err(AppError::InvalidToken)
        }
    }
}

impl FromRequestParts<ServerState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        validate_bearer(parts, state)?.ok_or(AppError::Unauthorized)
    }
}

/// Who is shopping: a logged-in user or a guest
///
/// A valid `Authorization` header wins over `X-Guest-Id` when both are
/// present. Requests carrying neither are rejected.
#[derive(Debug, Clone)]
pub enum Identity {
    User(CurrentUser),
    Guest(String),
}

impl Identity {
    pub fn cart_identity(&self) -> CartIdentity {
        match self {
            Identity::User(user) => CartIdentity::User(user.id.clone()),
            Identity::Guest(id) => CartIdentity::Guest(id.clone()),
        }
    }

    pub fn user(&self) -> Option<&CurrentUser> {
        match self {
            Identity::User(user) => Some(user),
            Identity::Guest(_) => None,
        }
    }
}

impl FromRequestParts<ServerState> for Identity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = validate_bearer(parts, state)? {
            return Ok(Identity::User(user));
        }

        let guest_id = parts
            .headers
            .get(GUEST_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty());

        match guest_id {
            Some(id) => Ok(Identity::Guest(id.to_string())),
            None => Err(AppError::Validation(
                "Missing identity: login or supply an X-Guest-Id header".to_string(),
            )),
        }
    }
}

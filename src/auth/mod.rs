use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::{header::AUTHORIZATION, request::Parts},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::models::UserRole;
use crate::state::AppState;
use crate::utils::AppError;

pub mod jwt;
pub mod password;

pub use jwt::{Claims, JwtService};
pub use password::PasswordService;

/// The authenticated caller, resolved from a bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Administrator access required".to_string()))
        }
    }

    pub fn require_organizer(&self) -> Result<(), AppError> {
        if self.role.can_organize() {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Only organizers can perform this action".to_string(),
            ))
        }
    }

    /// Ownership check for resources that belong to a user; admins pass.
    pub fn ensure_owner(&self, owner_id: Uuid, what: &str) -> Result<(), AppError> {
        if self.id == owner_id || self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!("You do not own this {}", what)))
        }
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            role: claims.role,
        }
    }
}

#[derive(Deserialize)]
struct TokenQuery {
    access_token: Option<String>,
}

/// Bearer header first; `?access_token=` for clients such as `EventSource`
/// that cannot set headers.
fn bearer_token(parts: &Parts) -> Result<Option<String>, AppError> {
    if let Some(value) = parts.headers.get(AUTHORIZATION) {
        let value = value
            .to_str()
            .map_err(|_| AppError::AuthError("Invalid authorization header".to_string()))?;
        let token = value.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::AuthError("Invalid authorization header format".to_string())
        })?;
        return Ok(Some(token.trim().to_string()));
    }

    Ok(Query::<TokenQuery>::try_from_uri(&parts.uri)
        .ok()
        .and_then(|Query(q)| q.access_token)
        .filter(|t| !t.is_empty()))
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?
            .ok_or_else(|| AppError::AuthError("Missing authorization header".to_string()))?;
        let claims = state.jwt_service().verify_token(&token)?;
        Ok(claims.into())
    }
}

/// Like [`AuthUser`] but anonymous callers are allowed. A token that is
/// present but invalid is still rejected.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match bearer_token(parts)? {
            Some(token) => {
                let claims = state.jwt_service().verify_token(&token)?;
                Ok(MaybeAuthUser(Some(claims.into())))
            }
            None => Ok(MaybeAuthUser(None)),
        }
    }
}

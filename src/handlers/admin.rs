use axum::extract::State;
use axum::response::IntoResponse;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::models::ReviewStatus;
use crate::repos::RoleRequestRepo;
use crate::state::AppState;
use crate::utils::response::success;
use crate::utils::{AppError, AppJson, AppPath};

#[derive(Debug, Deserialize)]
pub struct ReviewRoleRequest {
    pub status: ReviewStatus,
}

pub async fn list_role_requests(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    auth.require_admin()?;

    let requests = RoleRequestRepo::new(state.db.clone()).list_pending().await?;
    Ok(success(requests, "Pending role requests retrieved"))
}

pub async fn review_role_request(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<ReviewRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth.require_admin()?;

    if !req.status.is_decision() {
        return Err(AppError::ValidationError(
            "status must be APPROVED or REJECTED".to_string(),
        ));
    }

    let repo = RoleRequestRepo::new(state.db.clone());
    let Some(reviewed) = repo.review(id, req.status, auth.id).await? else {
        return match repo.get_by_id(id).await? {
            Some(_) => Err(AppError::Conflict(
                "Role request has already been reviewed".to_string(),
            )),
            None => Err(AppError::NotFound("Role request not found".to_string())),
        };
    };

    tracing::info!(
        request_id = %reviewed.id,
        user_id = %reviewed.user_id,
        status = ?reviewed.status,
        "Role request reviewed"
    );
    Ok(success(reviewed, "Role request reviewed"))
}

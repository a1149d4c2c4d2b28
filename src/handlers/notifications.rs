use axum::extract::State;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::realtime::{sse_response, PushKind};
use crate::repos::NotificationRepo;
use crate::state::AppState;
use crate::utils::response::success;
use crate::utils::{AppError, AppJson};

#[derive(Debug, Deserialize)]
pub struct MarkReadRequest {
    pub notification_id: Uuid,
}

#[derive(Serialize)]
pub struct MarkAllReadPayload {
    pub updated: u64,
}

pub async fn list_notifications(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let notifications = NotificationRepo::new(state.db.clone())
        .list_for(auth.id)
        .await?;

    Ok(success(notifications, "Notifications retrieved"))
}

pub async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(req): AppJson<MarkReadRequest>,
) -> Result<impl IntoResponse, AppError> {
    let repo = NotificationRepo::new(state.db.clone());
    let Some(notification) = repo.mark_read(req.notification_id, auth.id).await? else {
        return match repo.get_by_id(req.notification_id).await? {
            Some(_) => Err(AppError::Forbidden(
                "You do not own this notification".to_string(),
            )),
            None => Err(AppError::NotFound("Notification not found".to_string())),
        };
    };

    Ok(success(notification, "Notification marked as read"))
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let updated = NotificationRepo::new(state.db.clone())
        .mark_all_read(auth.id)
        .await?;

    Ok(success(MarkAllReadPayload { updated }, "All notifications marked as read"))
}

pub async fn stream_notifications(
    State(state): State<AppState>,
    auth: AuthUser,
) -> impl IntoResponse {
    tracing::debug!(user_id = %auth.id, "Notification stream opened");
    sse_response(state.hub().subscribe(auth.id), PushKind::Notification)
}

use axum::extract::State;
use axum::response::IntoResponse;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::models::{Friendship, FriendshipStatus};
use crate::repos::{FriendRepo, RequestOutcome, UserRepo};
use crate::state::AppState;
use crate::utils::response::{created, success};
use crate::utils::{AppError, AppJson};

#[derive(Debug, Deserialize)]
pub struct FriendRequest {
    pub friend_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub friendship_id: Uuid,
    pub status: FriendshipStatus,
}

/// Why a response to `friendship` by `responder` was not applied.
fn diagnose_response(friendship: Option<&Friendship>, responder: Uuid) -> AppError {
    match friendship {
        None => AppError::NotFound("Friend request not found".to_string()),
        Some(f) if !f.involves(responder) => {
            AppError::NotFound("Friend request not found".to_string())
        }
        Some(f) if !f.is_incoming_for(responder) => AppError::Forbidden(
            "Only the recipient can respond to a friend request".to_string(),
        ),
        Some(f) => AppError::Conflict(format!(
            "Friend request is already {:?}",
            f.status
        )),
    }
}

pub async fn list_friends(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let friends = FriendRepo::new(state.db.clone()).list_for(auth.id).await?;
    Ok(success(friends, "Friends retrieved"))
}

pub async fn send_request(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(req): AppJson<FriendRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.friend_id == auth.id {
        return Err(AppError::ValidationError(
            "You cannot send a friend request to yourself".to_string(),
        ));
    }

    UserRepo::new(state.db.clone())
        .get_by_id(req.friend_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let outcome = FriendRepo::new(state.db.clone())
        .request(auth.id, req.friend_id)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => {
                AppError::Conflict("A friend request already exists".to_string())
            }
            other => other,
        })?;

    match outcome {
        RequestOutcome::Created(friendship) => {
            tracing::info!(friendship_id = %friendship.id, "Friend request sent");
            Ok(created(friendship, "Friend request sent"))
        }
        RequestOutcome::AlreadyLinked(existing) => Err(AppError::Conflict(match existing.status {
            FriendshipStatus::Accepted => "You are already friends".to_string(),
            _ => "A friend request already exists".to_string(),
        })),
    }
}

pub async fn respond_request(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(req): AppJson<RespondRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !FriendshipStatus::Pending.can_transition_to(req.status) {
        return Err(AppError::ValidationError(
            "status must be ACCEPTED or REJECTED".to_string(),
        ));
    }

    let repo = FriendRepo::new(state.db.clone());
    let Some(friendship) = repo.respond(req.friendship_id, auth.id, req.status).await? else {
        let current = repo.get_by_id(req.friendship_id).await?;
        return Err(diagnose_response(current.as_ref(), auth.id));
    };

    tracing::info!(
        friendship_id = %friendship.id,
        status = ?friendship.status,
        "Friend request answered"
    );
    Ok(success(friendship, "Friend request updated"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use chrono::Utc;

    fn friendship(from: Uuid, to: Uuid, status: FriendshipStatus) -> Friendship {
        Friendship {
            id: Uuid::new_v4(),
            user_id: from,
            friend_id: to,
            status,
            created_at: Utc::now(),
            responded_at: None,
        }
    }

    #[test]
    fn test_sender_cannot_answer_own_request() {
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let row = friendship(alice, bob, FriendshipStatus::Pending);
        assert_eq!(
            diagnose_response(Some(&row), alice).status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_answered_request_conflicts() {
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let row = friendship(alice, bob, FriendshipStatus::Accepted);
        assert_eq!(
            diagnose_response(Some(&row), bob).status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_outsiders_see_not_found() {
        let row = friendship(Uuid::new_v4(), Uuid::new_v4(), FriendshipStatus::Pending);
        assert_eq!(
            diagnose_response(Some(&row), Uuid::new_v4()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            diagnose_response(None, Uuid::new_v4()).status_code(),
            StatusCode::NOT_FOUND
        );
    }
}

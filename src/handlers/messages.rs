use axum::extract::State;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthUser;
use crate::models::NotificationType;
use crate::realtime::{sse_response, Push, PushKind};
use crate::repos::{FriendRepo, MessageRepo, UserRepo};
use crate::state::AppState;
use crate::utils::response::{created, success};
use crate::utils::validation::not_blank;
use crate::utils::{AppError, AppJson, AppQuery};

#[derive(Debug, Deserialize)]
pub struct ConversationQuery {
    pub friend_id: Uuid,
    pub after: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    pub receiver_id: Uuid,
    #[validate(
        length(min = 1, max = 4000, message = "must be between 1 and 4000 characters"),
        custom = "not_blank"
    )]
    pub content: String,
}

fn message_preview(sender_name: Option<&str>) -> String {
    match sender_name.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => format!("New message from {}", name),
        None => "You have a new message".to_string(),
    }
}

pub async fn list_messages(
    State(state): State<AppState>,
    auth: AuthUser,
    AppQuery(query): AppQuery<ConversationQuery>,
) -> Result<impl IntoResponse, AppError> {
    let messages = MessageRepo::new(state.db.clone())
        .conversation(auth.id, query.friend_id, query.after)
        .await?;

    Ok(success(messages, "Messages retrieved"))
}

pub async fn send_message(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(req): AppJson<SendMessageRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let content = req.content.trim();

    if !FriendRepo::new(state.db.clone())
        .are_friends(auth.id, req.receiver_id)
        .await?
    {
        return Err(AppError::Forbidden(
            "You can only message accepted friends".to_string(),
        ));
    }

    let message = MessageRepo::new(state.db.clone())
        .create(auth.id, req.receiver_id, content)
        .await?;

    // Both sides so the sender's other tabs stay in sync
    state
        .hub()
        .publish(message.receiver_id, Push::Message(message.clone()));
    state
        .hub()
        .publish(message.sender_id, Push::Message(message.clone()));

    let sender = match UserRepo::new(state.db.clone()).get_by_id(auth.id).await {
        Ok(sender) => sender,
        Err(e) => {
            tracing::warn!(user_id = %auth.id, error = %e, "Failed to load message sender");
            None
        }
    };
    let preview = message_preview(sender.as_ref().map(|user| user.name.as_str()));
    if let Err(e) = state
        .notify(message.receiver_id, NotificationType::Message, &preview)
        .await
    {
        tracing::warn!(message_id = %message.id, error = %e, "Failed to store message notification");
    }

    Ok(created(message, "Message sent"))
}

pub async fn stream_messages(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    tracing::debug!(user_id = %auth.id, "Message stream opened");
    sse_response(state.hub().subscribe(auth.id), PushKind::Message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_names_the_sender_not_their_email() {
        assert_eq!(message_preview(Some("Ada Lovelace")), "New message from Ada Lovelace");
        assert!(!message_preview(Some("Ada Lovelace")).contains('@'));
    }

    #[test]
    fn test_preview_without_a_usable_name() {
        assert_eq!(message_preview(None), "You have a new message");
        assert_eq!(message_preview(Some("   ")), "You have a new message");
    }

    #[test]
    fn test_blank_content_is_invalid() {
        let req = SendMessageRequest {
            receiver_id: Uuid::new_v4(),
            content: " \n ".to_string(),
        };
        assert!(req.validate().is_err());
    }
}

use axum::extract::{Multipart, State};
use axum::response::IntoResponse;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{AuthUser, MaybeAuthUser};
use crate::handlers::tickets::EventScopedQuery;
use crate::models::post::assemble_feed;
use crate::repos::{EventRepo, PostRepo};
use crate::state::AppState;
use crate::uploads::MultipartForm;
use crate::utils::response::{created, success};
use crate::utils::validation::not_blank;
use crate::utils::{AppError, AppJson, AppQuery};

const MAX_CONTENT_CHARS: usize = 5000;

#[derive(Debug, Deserialize)]
pub struct LikeRequest {
    pub post_id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CommentRequest {
    pub post_id: Uuid,
    #[validate(
        length(min = 1, max = 2000, message = "must be between 1 and 2000 characters"),
        custom = "not_blank"
    )]
    pub content: String,
    pub parent_id: Option<Uuid>,
}

pub async fn list_posts(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    AppQuery(query): AppQuery<EventScopedQuery>,
) -> Result<impl IntoResponse, AppError> {
    let repo = PostRepo::new(state.db.clone());
    let posts = repo
        .list_for_event(query.event_id, viewer.map(|v| v.id))
        .await?;
    let post_ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();
    let comments = repo.comments_for_posts(&post_ids).await?;

    Ok(success(assemble_feed(posts, comments), "Posts retrieved"))
}

pub async fn create_post(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut form = MultipartForm::read(multipart).await?;

    let event_id: Uuid = form
        .parse("event_id")?
        .ok_or_else(|| AppError::ValidationError("event_id is required".to_string()))?;
    let content = form.require_text("content")?;
    if content.chars().count() > MAX_CONTENT_CHARS {
        return Err(AppError::ValidationError(format!(
            "content must be at most {} characters",
            MAX_CONTENT_CHARS
        )));
    }

    let event = EventRepo::new(state.db.clone())
        .get_by_id(event_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;
    auth.ensure_owner(event.organizer_id, "event")?;

    let uploads = state.uploads();
    let image_url = uploads.save_optional(form.take_file("image")).await?;
    let saved: Vec<String> = image_url.iter().cloned().collect();

    let result = PostRepo::new(state.db.clone())
        .create(event.id, auth.id, &content, image_url)
        .await;
    let post = uploads.discard_on_error(&saved, result).await?;

    tracing::info!(post_id = %post.id, event_id = %event.id, "Post created");
    Ok(created(post, "Post created"))
}

pub async fn toggle_like(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(req): AppJson<LikeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let repo = PostRepo::new(state.db.clone());
    repo.get_by_id(req.post_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    let status = repo.toggle_like(req.post_id, auth.id).await?;
    let message = if status.liked { "Post liked" } else { "Post unliked" };

    Ok(success(status, message))
}

pub async fn add_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(req): AppJson<CommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let repo = PostRepo::new(state.db.clone());
    repo.get_by_id(req.post_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    if let Some(parent_id) = req.parent_id {
        let parent = repo
            .get_comment(parent_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Parent comment not found".to_string()))?;
        if parent.post_id != req.post_id {
            return Err(AppError::ValidationError(
                "Parent comment belongs to a different post".to_string(),
            ));
        }
    }

    let comment = repo
        .add_comment(req.post_id, auth.id, req.parent_id, req.content.trim())
        .await?;

    Ok(created(comment, "Comment added"))
}

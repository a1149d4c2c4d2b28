use axum::extract::State;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{AuthUser, MaybeAuthUser};
use crate::models::event::schedule_is_valid;
use crate::models::{Event, EventChanges, EventFilter, EventStatus, NewEvent, NotificationType};
use crate::repos::{EventRepo, FriendRepo};
use crate::state::AppState;
use crate::utils::response::{created, empty_success, success};
use crate::utils::validation::not_blank;
use crate::utils::{AppError, AppJson, AppPath, AppQuery};

#[derive(Debug, Default, Deserialize)]
pub struct ListEventsQuery {
    pub search: Option<String>,
    pub organizer_id: Option<Uuid>,
    pub upcoming: Option<bool>,
}

impl ListEventsQuery {
    /// Without `organizer_id` this is the public dashboard. An organizer's
    /// own listing also includes drafts and past events.
    pub fn into_filter(self, viewer: Option<&AuthUser>, now: DateTime<Utc>) -> EventFilter {
        let sees_everything = match (self.organizer_id, viewer) {
            (Some(organizer_id), Some(viewer)) => viewer.id == organizer_id || viewer.is_admin(),
            _ => false,
        };
        let upcoming = self.upcoming.unwrap_or(self.organizer_id.is_none());

        EventFilter {
            search: self.search,
            organizer_id: self.organizer_id,
            published_only: !sees_everything,
            upcoming_after: upcoming.then_some(now),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateEventRequest {
    #[validate(
        length(min = 1, max = 200, message = "must be between 1 and 200 characters"),
        custom = "not_blank"
    )]
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub venue_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub status: Option<EventStatus>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateEventRequest {
    #[validate(
        length(min = 1, max = 200, message = "must be between 1 and 200 characters"),
        custom = "not_blank"
    )]
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub venue_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub status: Option<EventStatus>,
}

impl From<UpdateEventRequest> for EventChanges {
    fn from(req: UpdateEventRequest) -> Self {
        EventChanges {
            title: req.title.map(|t| t.trim().to_string()),
            description: req.description,
            start_time: req.start_time,
            end_time: req.end_time,
            venue_id: req.venue_id,
            category_id: req.category_id,
            status: req.status,
        }
    }
}

fn check_schedule(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), AppError> {
    if schedule_is_valid(start, end) {
        Ok(())
    } else {
        Err(AppError::ValidationError(
            "end_time must be after start_time".to_string(),
        ))
    }
}

async fn notify_friends(state: &AppState, event: &Event) -> Result<usize, AppError> {
    let friends = FriendRepo::new(state.db.clone())
        .accepted_friend_ids(event.organizer_id)
        .await?;
    let content = format!("New event published: {}", event.title);
    state
        .notify_many(&friends, NotificationType::NewEvent, &content)
        .await
}

/// The event is already committed, so a failed fan-out is only logged.
async fn announce(state: &AppState, event: &Event) {
    match notify_friends(state, event).await {
        Ok(count) => tracing::debug!(event_id = %event.id, count, "Announced new event"),
        Err(e) => tracing::warn!(event_id = %event.id, error = %e, "Failed to announce new event"),
    }
}

pub async fn list_events(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    AppQuery(query): AppQuery<ListEventsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = query.into_filter(viewer.as_ref(), Utc::now());
    let events = EventRepo::new(state.db.clone()).list(&filter).await?;

    Ok(success(events, "Events retrieved"))
}

pub async fn get_event(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let event = EventRepo::new(state.db.clone())
        .get_detail(id)
        .await?
        .filter(|e| {
            e.status == EventStatus::Published
                || viewer
                    .as_ref()
                    .is_some_and(|v| v.id == e.organizer_id || v.is_admin())
        })
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

    Ok(success(event, "Event retrieved"))
}

pub async fn create_event(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(req): AppJson<CreateEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth.require_organizer()?;
    req.validate()?;
    check_schedule(req.start_time, req.end_time)?;

    let event = EventRepo::new(state.db.clone())
        .create(
            auth.id,
            NewEvent {
                title: req.title.trim().to_string(),
                description: req.description,
                start_time: req.start_time,
                end_time: req.end_time,
                venue_id: req.venue_id,
                category_id: req.category_id,
                status: req.status.unwrap_or(EventStatus::Published),
            },
        )
        .await?;

    tracing::info!(event_id = %event.id, organizer_id = %auth.id, "Event created");
    if event.status == EventStatus::Published {
        announce(&state, &event).await;
    }

    Ok(created(event, "Event created"))
}

pub async fn update_event(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let changes = EventChanges::from(req);

    let repo = EventRepo::new(state.db.clone());
    let current = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;
    auth.ensure_owner(current.organizer_id, "event")?;

    if changes.is_empty() {
        return Ok(success(current, "Nothing to update"));
    }

    let (start, end) = changes.schedule_after(&current);
    check_schedule(start, end)?;

    let publishes = changes
        .status
        .is_some_and(|next| current.status.publishes(next));

    let updated = repo
        .update(id, changes)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

    tracing::info!(event_id = %updated.id, "Event updated");
    if publishes {
        announce(&state, &updated).await;
    }

    Ok(success(updated, "Event updated"))
}

pub async fn delete_event(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let repo = EventRepo::new(state.db.clone());
    let event = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;
    auth.ensure_owner(event.organizer_id, "event")?;

    if !repo.delete(id).await? {
        return Err(AppError::NotFound("Event not found".to_string()));
    }

    tracing::info!(event_id = %id, "Event deleted");
    Ok(empty_success("Event deleted"))
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum EventStatus {
    Draft,
    Published,
    Cancelled,
}

impl EventStatus {
    /// True when moving from `self` to `next` makes the event newly public.
    pub fn publishes(self, next: EventStatus) -> bool {
        self != EventStatus::Published && next == EventStatus::Published
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub venue_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub organizer_id: Uuid,
    pub status: EventStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Event joined with its venue, category and organizer names.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct EventDetail {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub venue_id: Option<Uuid>,
    pub venue_name: Option<String>,
    pub venue_address: Option<String>,
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
    pub organizer_id: Uuid,
    pub organizer_name: String,
    pub status: EventStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub venue_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub status: EventStatus,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub venue_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub status: Option<EventStatus>,
}

impl EventChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
            && self.venue_id.is_none()
            && self.category_id.is_none()
            && self.status.is_none()
    }

    /// The schedule the event would have after these changes are applied.
    pub fn schedule_after(&self, current: &Event) -> (DateTime<Utc>, DateTime<Utc>) {
        (
            self.start_time.unwrap_or(current.start_time),
            self.end_time.unwrap_or(current.end_time),
        )
    }
}

pub fn schedule_is_valid(start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    end > start
}

#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub search: Option<String>,
    pub organizer_id: Option<Uuid>,
    pub published_only: bool,
    pub upcoming_after: Option<DateTime<Utc>>,
}

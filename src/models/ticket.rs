use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::event::EventStatus;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TicketType {
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub price: Decimal,
    /// Remaining tickets; never negative.
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub ticket_type_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A booking with the event and ticket details needed for "My Tickets".
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BookingView {
    pub id: Uuid,
    pub event_id: Uuid,
    pub event_title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub ticket_type_id: Uuid,
    pub ticket_name: String,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Result of a successful booking: the booking and the ticket type after the
/// decrement.
#[derive(Debug, Clone, Serialize)]
pub struct BookingReceipt {
    pub booking: Booking,
    pub ticket_type: TicketType,
}

/// State read back after the conditional decrement matched no row.
#[derive(Debug, Clone, FromRow)]
pub struct BookingSnapshot {
    pub event_id: Uuid,
    pub quantity: i32,
    pub event_status: EventStatus,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingRejection {
    UnknownTicketType,
    EventClosed,
    SoldOut,
}

impl BookingRejection {
    /// Explains why the decrement for `requested_event` did not apply.
    pub fn diagnose(
        requested_event: Uuid,
        snapshot: Option<&BookingSnapshot>,
        now: DateTime<Utc>,
    ) -> Self {
        match snapshot {
            None => BookingRejection::UnknownTicketType,
            Some(p) if p.event_id != requested_event => BookingRejection::UnknownTicketType,
            Some(p) if p.event_status != EventStatus::Published || p.end_time <= now => {
                BookingRejection::EventClosed
            }
            Some(_) => BookingRejection::SoldOut,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn snapshot(event_id: Uuid, quantity: i32, status: EventStatus) -> BookingSnapshot {
        BookingSnapshot {
            event_id,
            quantity,
            event_status: status,
            end_time: Utc::now() + Duration::days(1),
        }
    }

    #[test]
    fn test_missing_ticket_type() {
        let event_id = Uuid::new_v4();
        assert_eq!(
            BookingRejection::diagnose(event_id, None, Utc::now()),
            BookingRejection::UnknownTicketType
        );
    }

    #[test]
    fn test_ticket_type_of_another_event() {
        let p = snapshot(Uuid::new_v4(), 5, EventStatus::Published);
        assert_eq!(
            BookingRejection::diagnose(Uuid::new_v4(), Some(&p), Utc::now()),
            BookingRejection::UnknownTicketType
        );
    }

    #[test]
    fn test_closed_events() {
        let event_id = Uuid::new_v4();
        let draft = snapshot(event_id, 5, EventStatus::Draft);
        assert_eq!(
            BookingRejection::diagnose(event_id, Some(&draft), Utc::now()),
            BookingRejection::EventClosed
        );

        let mut ended = snapshot(event_id, 5, EventStatus::Published);
        ended.end_time = Utc::now() - Duration::minutes(1);
        assert_eq!(
            BookingRejection::diagnose(event_id, Some(&ended), Utc::now()),
            BookingRejection::EventClosed
        );
    }

    #[test]
    fn test_sold_out() {
        let event_id = Uuid::new_v4();
        let p = snapshot(event_id, 0, EventStatus::Published);
        assert_eq!(
            BookingRejection::diagnose(event_id, Some(&p), Utc::now()),
            BookingRejection::SoldOut
        );
    }
}

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Result};
use uuid::Uuid;

use crate::models::{
    Booking, BookingReceipt, BookingRejection, BookingSnapshot, BookingView, TicketType,
};

const TICKET_TYPE_COLUMNS: &str = "id, event_id, name, price, quantity, created_at";

pub enum BookingOutcome {
    Booked(BookingReceipt),
    Rejected(BookingRejection),
}

/// One booked seat at an event that is about to start.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DueReminder {
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub title: String,
    pub start_time: DateTime<Utc>,
}

pub struct TicketRepo {
    db: PgPool,
}

impl TicketRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create_type(
        &self,
        event_id: Uuid,
        name: &str,
        price: Decimal,
        quantity: i32,
    ) -> Result<TicketType> {
        let sql = format!(
            "INSERT INTO ticket_types (id, event_id, name, price, quantity) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            TICKET_TYPE_COLUMNS
        );
        sqlx::query_as::<_, TicketType>(&sql)
            .bind(Uuid::new_v4())
            .bind(event_id)
            .bind(name)
            .bind(price)
            .bind(quantity)
            .fetch_one(&self.db)
            .await
    }

    pub async fn list_types(&self, event_id: Uuid) -> Result<Vec<TicketType>> {
        let sql = format!(
            "SELECT {} FROM ticket_types WHERE event_id = $1 ORDER BY price ASC, created_at ASC",
            TICKET_TYPE_COLUMNS
        );
        sqlx::query_as::<_, TicketType>(&sql)
            .bind(event_id)
            .fetch_all(&self.db)
            .await
    }

    pub async fn get_type(&self, id: Uuid) -> Result<Option<TicketType>> {
        let sql = format!("SELECT {} FROM ticket_types WHERE id = $1", TICKET_TYPE_COLUMNS);
        sqlx::query_as::<_, TicketType>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await
    }

    /// Books one ticket.
    ///
    /// The decrement and its guard are a single `UPDATE`, so concurrent
    /// bookings of the same ticket type queue on the row lock and each
    /// re-evaluates `quantity > 0` against the committed value. The booking
    /// row is inserted in the same transaction, so a failed insert restores
    /// the ticket.
    pub async fn book(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        ticket_type_id: Uuid,
    ) -> Result<BookingOutcome> {
        let mut tx = self.db.begin().await?;

        let decremented = sqlx::query_as::<_, TicketType>(
            "UPDATE ticket_types t SET quantity = t.quantity - 1 \
             FROM events e \
             WHERE t.id = $1 AND t.event_id = $2 AND e.id = t.event_id \
               AND t.quantity > 0 AND e.status = 'PUBLISHED' AND e.end_time > NOW() \
             RETURNING t.id, t.event_id, t.name, t.price, t.quantity, t.created_at",
        )
        .bind(ticket_type_id)
        .bind(event_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(ticket_type) = decremented else {
            let snapshot = sqlx::query_as::<_, BookingSnapshot>(
                "SELECT t.event_id, t.quantity, e.status AS event_status, e.end_time \
                 FROM ticket_types t JOIN events e ON e.id = t.event_id WHERE t.id = $1",
            )
            .bind(ticket_type_id)
            .fetch_optional(&mut *tx)
            .await?;
            tx.rollback().await?;

            return Ok(BookingOutcome::Rejected(BookingRejection::diagnose(
                event_id,
                snapshot.as_ref(),
                Utc::now(),
            )));
        };

        let booking = sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (id, user_id, event_id, ticket_type_id) VALUES ($1, $2, $3, $4) \
             RETURNING id, user_id, event_id, ticket_type_id, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(event_id)
        .bind(ticket_type_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(BookingOutcome::Booked(BookingReceipt {
            booking,
            ticket_type,
        }))
    }

    pub async fn list_bookings(&self, user_id: Uuid) -> Result<Vec<BookingView>> {
        sqlx::query_as::<_, BookingView>(
            "SELECT b.id, b.event_id, e.title AS event_title, e.start_time, e.end_time, \
                    b.ticket_type_id, t.name AS ticket_name, t.price, b.created_at \
             FROM bookings b \
             JOIN events e ON e.id = b.event_id \
             JOIN ticket_types t ON t.id = b.ticket_type_id \
             WHERE b.user_id = $1 \
             ORDER BY e.start_time ASC, b.created_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
    }

    /// Flags bookings for published events starting before `horizon` and
    /// returns one row per flagged booking. Each booking is claimed once.
    pub async fn claim_due_reminders(&self, horizon: DateTime<Utc>) -> Result<Vec<DueReminder>> {
        sqlx::query_as::<_, DueReminder>(
            "UPDATE bookings b SET reminder_sent = TRUE \
             FROM events e \
             WHERE e.id = b.event_id AND NOT b.reminder_sent \
               AND e.status = 'PUBLISHED' AND e.start_time > NOW() AND e.start_time <= $1 \
             RETURNING b.user_id, e.id AS event_id, e.title, e.start_time",
        )
        .bind(horizon)
        .fetch_all(&self.db)
        .await
    }
}

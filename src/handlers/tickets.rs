use axum::extract::State;
use axum::response::IntoResponse;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthUser;
use crate::models::BookingRejection;
use crate::repos::{BookingOutcome, EventRepo, TicketRepo};
use crate::state::AppState;
use crate::utils::response::{created, success};
use crate::utils::validation::not_blank;
use crate::utils::{AppError, AppJson, AppQuery};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTicketTypeRequest {
    pub event_id: Uuid,
    #[validate(
        length(min = 1, max = 100, message = "must be between 1 and 100 characters"),
        custom = "not_blank"
    )]
    pub name: String,
    pub price: Decimal,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct EventScopedQuery {
    pub event_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct BookTicketRequest {
    pub event_id: Uuid,
    pub ticket_type_id: Uuid,
}

impl From<BookingRejection> for AppError {
    fn from(rejection: BookingRejection) -> Self {
        match rejection {
            BookingRejection::UnknownTicketType => {
                AppError::NotFound("Ticket type not found for this event".to_string())
            }
            BookingRejection::EventClosed => {
                AppError::Conflict("Event is not open for booking".to_string())
            }
            BookingRejection::SoldOut => AppError::Conflict("Tickets are sold out".to_string()),
        }
    }
}

pub async fn create_ticket_type(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(req): AppJson<CreateTicketTypeRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    if req.price.is_sign_negative() {
        return Err(AppError::ValidationError("price: must not be negative".to_string()));
    }

    let event = EventRepo::new(state.db.clone())
        .get_by_id(req.event_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;
    auth.ensure_owner(event.organizer_id, "event")?;

    let ticket_type = TicketRepo::new(state.db.clone())
        .create_type(event.id, req.name.trim(), req.price, req.quantity)
        .await?;

    tracing::info!(event_id = %event.id, ticket_type_id = %ticket_type.id, "Ticket type created");
    Ok(created(ticket_type, "Ticket type created"))
}

pub async fn list_ticket_types(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<EventScopedQuery>,
) -> Result<impl IntoResponse, AppError> {
    let types = TicketRepo::new(state.db.clone())
        .list_types(query.event_id)
        .await?;

    Ok(success(types, "Ticket types retrieved"))
}

pub async fn book_ticket(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(req): AppJson<BookTicketRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = TicketRepo::new(state.db.clone())
        .book(auth.id, req.event_id, req.ticket_type_id)
        .await?;

    match outcome {
        BookingOutcome::Booked(receipt) => {
            tracing::info!(
                booking_id = %receipt.booking.id,
                ticket_type_id = %receipt.ticket_type.id,
                remaining = receipt.ticket_type.quantity,
                "Ticket booked"
            );
            Ok(created(receipt, "Ticket booked"))
        }
        BookingOutcome::Rejected(rejection) => {
            tracing::debug!(
                user_id = %auth.id,
                ticket_type_id = %req.ticket_type_id,
                ?rejection,
                "Booking rejected"
            );
            Err(rejection.into())
        }
    }
}

pub async fn list_bookings(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let bookings = TicketRepo::new(state.db.clone())
        .list_bookings(auth.id)
        .await?;

    Ok(success(bookings, "Bookings retrieved"))
}

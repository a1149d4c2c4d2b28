use axum::extract::{Multipart, State};
use axum::response::IntoResponse;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::{AuthUser, MaybeAuthUser};
use crate::handlers::tickets::EventScopedQuery;
use crate::models::{ReviewStatus, SponsorApplication, SponsorTier};
use crate::repos::{EventRepo, SponsorRepo};
use crate::state::AppState;
use crate::uploads::MultipartForm;
use crate::utils::response::{created, success};
use crate::utils::{AppError, AppJson, AppQuery};

#[derive(Debug, Deserialize)]
pub struct ReviewSponsorRequest {
    pub sponsor_id: Uuid,
    pub status: ReviewStatus,
}

pub async fn apply_sponsor(
    State(state): State<AppState>,
    _auth: AuthUser,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut form = MultipartForm::read(multipart).await?;

    let event_id: Uuid = form
        .parse("event_id")?
        .ok_or_else(|| AppError::ValidationError("event_id is required".to_string()))?;
    let name = form.require_text("name")?;
    let tier: SponsorTier = form
        .parse("tier")?
        .ok_or_else(|| AppError::ValidationError("tier is required".to_string()))?;
    let contribution_amount: Decimal = form.parse("contribution_amount")?.unwrap_or_default();
    if contribution_amount.is_sign_negative() {
        return Err(AppError::ValidationError(
            "contribution_amount: must not be negative".to_string(),
        ));
    }

    EventRepo::new(state.db.clone())
        .get_by_id(event_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

    let uploads = state.uploads();
    let logo_url = uploads.save_optional(form.take_file("logo")).await?;
    let saved: Vec<String> = logo_url.iter().cloned().collect();

    let result = SponsorRepo::new(state.db.clone())
        .create(SponsorApplication {
            event_id,
            name,
            tier,
            contribution_amount,
            logo_url,
        })
        .await;
    let sponsor = uploads.discard_on_error(&saved, result).await?;

    tracing::info!(sponsor_id = %sponsor.id, event_id = %event_id, "Sponsor application received");
    Ok(created(sponsor, "Sponsorship application submitted"))
}

pub async fn list_sponsors(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    AppQuery(query): AppQuery<EventScopedQuery>,
) -> Result<impl IntoResponse, AppError> {
    let event = EventRepo::new(state.db.clone())
        .get_by_id(query.event_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

    let is_owner = viewer
        .as_ref()
        .is_some_and(|v| v.ensure_owner(event.organizer_id, "event").is_ok());

    let sponsors = SponsorRepo::new(state.db.clone())
        .list_for_event(event.id, !is_owner)
        .await?;

    Ok(success(sponsors, "Sponsors retrieved"))
}

pub async fn review_sponsor(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(req): AppJson<ReviewSponsorRequest>,
) -> Result<impl IntoResponse, AppError> {
    let repo = SponsorRepo::new(state.db.clone());
    let sponsor = repo
        .get_by_id(req.sponsor_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Sponsor not found".to_string()))?;

    let event = EventRepo::new(state.db.clone())
        .get_by_id(sponsor.event_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;
    auth.ensure_owner(event.organizer_id, "event")?;

    if !sponsor.status.can_transition_to(req.status) {
        return Err(AppError::Conflict(format!(
            "Sponsor cannot move from {:?} to {:?}",
            sponsor.status, req.status
        )));
    }

    // A concurrent review can win between the read and the update
    let reviewed = repo
        .review(sponsor.id, req.status)
        .await?
        .ok_or_else(|| AppError::Conflict("Sponsor has already been reviewed".to_string()))?;

    tracing::info!(sponsor_id = %reviewed.id, status = ?reviewed.status, "Sponsor reviewed");
    Ok(success(reviewed, "Sponsor reviewed"))
}

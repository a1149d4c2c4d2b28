use axum::extract::State;
use axum::response::IntoResponse;
use serde::Deserialize;
use validator::Validate;

use crate::auth::AuthUser;
use crate::repos::LookupRepo;
use crate::state::AppState;
use crate::utils::response::{created, success};
use crate::utils::validation::not_blank;
use crate::utils::{AppError, AppJson};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateVenueRequest {
    #[validate(
        length(min = 1, max = 200, message = "must be between 1 and 200 characters"),
        custom = "not_blank"
    )]
    pub name: String,
    pub address: Option<String>,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub capacity: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(
        length(min = 1, max = 100, message = "must be between 1 and 100 characters"),
        custom = "not_blank"
    )]
    pub name: String,
}

pub async fn list_venues(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let venues = LookupRepo::new(state.db.clone()).venues().await?;
    Ok(success(venues, "Venues retrieved"))
}

pub async fn create_venue(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(req): AppJson<CreateVenueRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth.require_admin()?;
    req.validate()?;

    let venue = LookupRepo::new(state.db.clone())
        .create_venue(req.name.trim(), req.address, req.capacity)
        .await?;
    Ok(created(venue, "Venue created"))
}

pub async fn list_categories(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let categories = LookupRepo::new(state.db.clone()).categories().await?;
    Ok(success(categories, "Categories retrieved"))
}

pub async fn create_category(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(req): AppJson<CreateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth.require_admin()?;
    req.validate()?;

    let category = LookupRepo::new(state.db.clone())
        .create_category(req.name.trim())
        .await?;
    Ok(created(category, "Category created"))
}

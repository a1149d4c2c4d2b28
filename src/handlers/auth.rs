use axum::extract::{Multipart, State};
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::{AuthUser, PasswordService};
use crate::models::{ProfileUpdate, User, UserRole};
use crate::repos::{NewUser, RoleRequestRepo, UserRepo};
use crate::state::AppState;
use crate::uploads::MultipartForm;
use crate::utils::response::{created, success};
use crate::utils::validation::not_blank;
use crate::utils::{AppError, AppJson};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        length(min = 1, max = 100, message = "must be between 1 and 100 characters"),
        custom = "not_blank"
    )]
    pub name: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    pub password: String,
    #[validate(length(max = 30, message = "must be at most 30 characters"))]
    pub phone: Option<String>,
    #[validate(length(max = 100, message = "must be at most 100 characters"))]
    pub designation: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthPayload {
    pub user: User,
    pub token: String,
}

pub async fn register(
    State(state): State<AppState>,
    AppJson(req): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    PasswordService::validate_password_strength(&req.password)?;

    let password_hash = PasswordService::hash_blocking(req.password).await?;
    let user = UserRepo::new(state.db.clone())
        .create(NewUser {
            name: req.name.trim().to_string(),
            email: req.email.trim().to_string(),
            password_hash,
            role: UserRole::Attendee,
            is_verified: false,
            phone: req.phone.filter(|p| !p.trim().is_empty()),
            designation: req.designation.filter(|d| !d.trim().is_empty()),
        })
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => {
                AppError::Conflict("An account with this email already exists".to_string())
            }
            other => other,
        })?;

    let token = state.jwt_service().create_token(&user)?;
    tracing::info!(user_id = %user.id, "User registered");

    Ok(created(AuthPayload { user, token }, "Registration successful"))
}

pub async fn login(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let Some(user) = UserRepo::new(state.db.clone()).find_by_email(&req.email).await? else {
        return Err(AppError::invalid_credentials());
    };

    if !PasswordService::verify_blocking(req.password, user.password_hash.clone()).await? {
        tracing::debug!(user_id = %user.id, "Rejected login with wrong password");
        return Err(AppError::invalid_credentials());
    }

    let token = state.jwt_service().create_token(&user)?;
    Ok(success(AuthPayload { user, token }, "Login successful"))
}

pub async fn request_role(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let user = UserRepo::new(state.db.clone())
        .get_by_id(auth.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if user.role.can_organize() {
        return Err(AppError::Conflict(
            "You already have organizer access".to_string(),
        ));
    }

    let request = RoleRequestRepo::new(state.db.clone())
        .create(user.id, UserRole::Organizer)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => {
                AppError::Conflict("You already have a pending role request".to_string())
            }
            other => other,
        })?;

    tracing::info!(user_id = %user.id, request_id = %request.id, "Organizer role requested");
    Ok(created(request, "Role request submitted"))
}

pub async fn get_profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let user = UserRepo::new(state.db.clone())
        .get_by_id(auth.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(success(user, "Profile retrieved"))
}

pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut form = MultipartForm::read(multipart).await?;
    let uploads = state.uploads();

    let files = vec![
        form.take_file("profile_image"),
        form.take_file("organization_id_card"),
        form.take_file("proof_document"),
    ];
    let mut urls = uploads.save_all(files).await?.into_iter();
    let update = ProfileUpdate {
        designation: form.text("designation"),
        phone: form.text("phone"),
        profile_image: urls.next().flatten(),
        organization_id_card: urls.next().flatten(),
        proof_document: urls.next().flatten(),
    };
    let saved: Vec<String> = [
        &update.profile_image,
        &update.organization_id_card,
        &update.proof_document,
    ]
    .into_iter()
    .flatten()
    .cloned()
    .collect();

    let result = UserRepo::new(state.db.clone())
        .update_profile(auth.id, update)
        .await
        .map_err(AppError::from)
        .and_then(|user| user.ok_or_else(|| AppError::NotFound("User not found".to_string())));
    let user = uploads.discard_on_error(&saved, result).await?;

    Ok(success(user, "Profile updated"))
}

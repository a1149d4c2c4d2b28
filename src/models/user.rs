use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::review::ReviewStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Attendee,
    Organizer,
    Admin,
}

impl UserRole {
    pub fn can_organize(self) -> bool {
        matches!(self, UserRole::Organizer | UserRole::Admin)
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub is_verified: bool,
    pub phone: Option<String>,
    pub designation: Option<String>,
    pub profile_image: Option<String>,
    pub organization_id_card: Option<String>,
    pub proof_document: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields visible to other users (search results, friend lists, authors).
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub designation: Option<String>,
    pub profile_image: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub designation: Option<String>,
    pub phone: Option<String>,
    pub profile_image: Option<String>,
    pub organization_id_card: Option<String>,
    pub proof_document: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RoleRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub requested_role: UserRole,
    pub status: ReviewStatus,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<Uuid>,
}

/// Pending role request joined with the applicant, for the admin queue.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RoleRequestView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub designation: Option<String>,
    pub organization_id_card: Option<String>,
    pub proof_document: Option<String>,
    pub requested_role: UserRole,
    pub status: ReviewStatus,
    pub created_at: DateTime<Utc>,
}

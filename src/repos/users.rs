use sqlx::{PgPool, Result};
use uuid::Uuid;

use crate::models::{ProfileUpdate, PublicUser, User, UserRole};
use crate::utils::search::contains_pattern;

const USER_COLUMNS: &str = "id, name, email, password_hash, role, is_verified, phone, designation, \
     profile_image, organization_id_card, proof_document, created_at, updated_at";

pub const SEARCH_LIMIT: i64 = 20;

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub is_verified: bool,
    pub phone: Option<String>,
    pub designation: Option<String>,
}

pub struct UserRepo {
    db: PgPool,
}

impl UserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create(&self, user: NewUser) -> Result<User> {
        let sql = format!(
            "INSERT INTO users (id, name, email, password_hash, role, is_verified, phone, designation) \
             VALUES ($1, $2, LOWER($3), $4, $5, $6, $7, $8) RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(user.name)
            .bind(user.email)
            .bind(user.password_hash)
            .bind(user.role)
            .bind(user.is_verified)
            .bind(user.phone)
            .bind(user.designation)
            .fetch_one(&self.db)
            .await
    }

    /// Inserts the account or, if the email exists, resets its password and
    /// role.
    pub async fn upsert(&self, user: NewUser) -> Result<User> {
        let sql = format!(
            "INSERT INTO users (id, name, email, password_hash, role, is_verified, phone, designation) \
             VALUES ($1, $2, LOWER($3), $4, $5, $6, $7, $8) \
             ON CONFLICT ((LOWER(email))) DO UPDATE SET \
                name = EXCLUDED.name, \
                password_hash = EXCLUDED.password_hash, \
                role = EXCLUDED.role, \
                is_verified = EXCLUDED.is_verified, \
                designation = COALESCE(EXCLUDED.designation, users.designation), \
                updated_at = NOW() \
             RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(user.name)
            .bind(user.email)
            .bind(user.password_hash)
            .bind(user.role)
            .bind(user.is_verified)
            .bind(user.phone)
            .bind(user.designation)
            .fetch_one(&self.db)
            .await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE LOWER(email) = LOWER($1)", USER_COLUMNS);
        sqlx::query_as::<_, User>(&sql)
            .bind(email.trim())
            .fetch_optional(&self.db)
            .await
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await
    }

    /// Case-insensitive match on name or email, excluding `viewer`.
    pub async fn search(&self, term: &str, viewer: Uuid) -> Result<Vec<PublicUser>> {
        let Some(pattern) = contains_pattern(term) else {
            return Ok(Vec::new());
        };

        sqlx::query_as::<_, PublicUser>(
            "SELECT id, name, email, role, designation, profile_image FROM users \
             WHERE id <> $1 AND (name ILIKE $2 OR email ILIKE $2) \
             ORDER BY name ASC LIMIT $3",
        )
        .bind(viewer)
        .bind(pattern)
        .bind(SEARCH_LIMIT)
        .fetch_all(&self.db)
        .await
    }

    pub async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<Option<User>> {
        let sql = format!(
            "UPDATE users SET \
                designation = COALESCE($2, designation), \
                phone = COALESCE($3, phone), \
                profile_image = COALESCE($4, profile_image), \
                organization_id_card = COALESCE($5, organization_id_card), \
                proof_document = COALESCE($6, proof_document), \
                updated_at = NOW() \
             WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(update.designation)
            .bind(update.phone)
            .bind(update.profile_image)
            .bind(update.organization_id_card)
            .bind(update.proof_document)
            .fetch_optional(&self.db)
            .await
    }
}

use sqlx::{PgPool, Result};
use uuid::Uuid;

use crate::models::{ReviewStatus, RoleRequest, RoleRequestView, UserRole};

const ROLE_REQUEST_COLUMNS: &str =
    "id, user_id, requested_role, status, created_at, reviewed_at, reviewed_by";

pub struct RoleRequestRepo {
    db: PgPool,
}

impl RoleRequestRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// A second PENDING request for the same user violates the partial unique
    /// index and surfaces as a unique violation.
    pub async fn create(&self, user_id: Uuid, requested_role: UserRole) -> Result<RoleRequest> {
        let sql = format!(
            "INSERT INTO role_requests (id, user_id, requested_role) VALUES ($1, $2, $3) RETURNING {}",
            ROLE_REQUEST_COLUMNS
        );
        sqlx::query_as::<_, RoleRequest>(&sql)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(requested_role)
            .fetch_one(&self.db)
            .await
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<RoleRequest>> {
        let sql = format!("SELECT {} FROM role_requests WHERE id = $1", ROLE_REQUEST_COLUMNS);
        sqlx::query_as::<_, RoleRequest>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await
    }

    pub async fn list_pending(&self) -> Result<Vec<RoleRequestView>> {
        sqlx::query_as::<_, RoleRequestView>(
            "SELECT r.id, r.user_id, u.name AS user_name, u.email AS user_email, \
                    u.designation, u.organization_id_card, u.proof_document, \
                    r.requested_role, r.status, r.created_at \
             FROM role_requests r JOIN users u ON u.id = r.user_id \
             WHERE r.status = 'PENDING' \
             ORDER BY r.created_at ASC",
        )
        .fetch_all(&self.db)
        .await
    }

    /// Applies a decision to a PENDING request. Approval promotes the user in
    /// the same transaction. Returns `None` when the request is not PENDING.
    pub async fn review(
        &self,
        id: Uuid,
        decision: ReviewStatus,
        reviewer: Uuid,
    ) -> Result<Option<RoleRequest>> {
        let mut tx = self.db.begin().await?;

        let sql = format!(
            "UPDATE role_requests SET status = $2, reviewed_at = NOW(), reviewed_by = $3 \
             WHERE id = $1 AND status = 'PENDING' RETURNING {}",
            ROLE_REQUEST_COLUMNS
        );
        let reviewed = sqlx::query_as::<_, RoleRequest>(&sql)
            .bind(id)
            .bind(decision)
            .bind(reviewer)
            .fetch_optional(&mut *tx)
            .await?;

        if let Some(request) = &reviewed {
            if request.status == ReviewStatus::Approved {
                sqlx::query(
                    "UPDATE users SET role = $2, is_verified = TRUE, updated_at = NOW() WHERE id = $1",
                )
                .bind(request.user_id)
                .bind(request.requested_role)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(reviewed)
    }
}

use sqlx::{PgPool, Result};
use uuid::Uuid;

use crate::models::{ReviewStatus, Sponsor, SponsorApplication};

const SPONSOR_COLUMNS: &str =
    "id, event_id, name, tier, contribution_amount, logo_url, status, created_at, reviewed_at";

pub struct SponsorRepo {
    db: PgPool,
}

impl SponsorRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create(&self, application: SponsorApplication) -> Result<Sponsor> {
        let sql = format!(
            "INSERT INTO sponsors (id, event_id, name, tier, contribution_amount, logo_url, status) \
             VALUES ($1, $2, $3, $4, $5, $6, 'PENDING') RETURNING {}",
            SPONSOR_COLUMNS
        );
        sqlx::query_as::<_, Sponsor>(&sql)
            .bind(Uuid::new_v4())
            .bind(application.event_id)
            .bind(application.name)
            .bind(application.tier)
            .bind(application.contribution_amount)
            .bind(application.logo_url)
            .fetch_one(&self.db)
            .await
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Sponsor>> {
        let sql = format!("SELECT {} FROM sponsors WHERE id = $1", SPONSOR_COLUMNS);
        sqlx::query_as::<_, Sponsor>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await
    }

    /// `approved_only` hides applications still under review.
    pub async fn list_for_event(&self, event_id: Uuid, approved_only: bool) -> Result<Vec<Sponsor>> {
        let sql = format!(
            "SELECT {} FROM sponsors WHERE event_id = $1 AND ($2 = FALSE OR status = 'APPROVED') \
             ORDER BY CASE tier WHEN 'Gold' THEN 0 WHEN 'Silver' THEN 1 WHEN 'Bronze' THEN 2 ELSE 3 END, \
                      contribution_amount DESC, created_at ASC",
            SPONSOR_COLUMNS
        );
        sqlx::query_as::<_, Sponsor>(&sql)
            .bind(event_id)
            .bind(approved_only)
            .fetch_all(&self.db)
            .await
    }

    /// Returns `None` if the application is no longer PENDING.
    pub async fn review(&self, id: Uuid, decision: ReviewStatus) -> Result<Option<Sponsor>> {
        let sql = format!(
            "UPDATE sponsors SET status = $2, reviewed_at = NOW() \
             WHERE id = $1 AND status = 'PENDING' RETURNING {}",
            SPONSOR_COLUMNS
        );
        sqlx::query_as::<_, Sponsor>(&sql)
            .bind(id)
            .bind(decision)
            .fetch_optional(&self.db)
            .await
    }
}

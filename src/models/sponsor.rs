use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

use crate::models::review::ReviewStatus;

/// Contribution tier. Affects display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "sponsor_tier")]
pub enum SponsorTier {
    Partner,
    Bronze,
    Silver,
    Gold,
}

impl FromStr for SponsorTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "partner" => Ok(SponsorTier::Partner),
            "bronze" => Ok(SponsorTier::Bronze),
            "silver" => Ok(SponsorTier::Silver),
            "gold" => Ok(SponsorTier::Gold),
            other => Err(format!("unknown sponsor tier '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Sponsor {
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub tier: SponsorTier,
    pub contribution_amount: Decimal,
    pub logo_url: Option<String>,
    pub status: ReviewStatus,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct SponsorApplication {
    pub event_id: Uuid,
    pub name: String,
    pub tier: SponsorTier,
    pub contribution_amount: Decimal,
    pub logo_url: Option<String>,
}

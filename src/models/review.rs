use serde::{Deserialize, Serialize};

/// Review workflow shared by sponsor applications and role requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "review_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
}

impl ReviewStatus {
    /// A review decision is only legal from PENDING, and only to a final state.
    pub fn can_transition_to(self, next: ReviewStatus) -> bool {
        self == ReviewStatus::Pending && next != ReviewStatus::Pending
    }

    pub fn is_decision(self) -> bool {
        self != ReviewStatus::Pending
    }
}

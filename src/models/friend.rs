use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::user::UserRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "friendship_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum FriendshipStatus {
    Pending,
    Accepted,
    Rejected,
}

impl FriendshipStatus {
    /// PENDING -> ACCEPTED and PENDING -> REJECTED are the only legal moves.
    pub fn can_transition_to(self, next: FriendshipStatus) -> bool {
        self == FriendshipStatus::Pending && next != FriendshipStatus::Pending
    }

    /// Whether an existing row in this state blocks a new request for the pair.
    pub fn blocks_new_request(self) -> bool {
        self != FriendshipStatus::Rejected
    }
}

/// Directed row: `user_id` sent the request to `friend_id`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Friendship {
    pub id: Uuid,
    pub user_id: Uuid,
    pub friend_id: Uuid,
    pub status: FriendshipStatus,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

impl Friendship {
    pub fn is_incoming_for(&self, viewer: Uuid) -> bool {
        self.friend_id == viewer
    }

    pub fn involves(&self, user: Uuid) -> bool {
        self.user_id == user || self.friend_id == user
    }
}

/// A relation from the viewer's side: the other party plus the row state.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FriendView {
    pub friendship_id: Uuid,
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub designation: Option<String>,
    pub image: Option<String>,
    pub status: FriendshipStatus,
    pub is_incoming: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(from: Uuid, to: Uuid) -> Friendship {
        Friendship {
            id: Uuid::new_v4(),
            user_id: from,
            friend_id: to,
            status: FriendshipStatus::Pending,
            created_at: Utc::now(),
            responded_at: None,
        }
    }

    #[test]
    fn test_only_pending_can_be_answered() {
        use FriendshipStatus::*;
        assert!(Pending.can_transition_to(Accepted));
        assert!(Pending.can_transition_to(Rejected));
        assert!(!Pending.can_transition_to(Pending));
        assert!(!Accepted.can_transition_to(Rejected));
        assert!(!Accepted.can_transition_to(Pending));
        assert!(!Rejected.can_transition_to(Accepted));
        assert!(!Rejected.can_transition_to(Pending));
    }

    #[test]
    fn test_rejected_rows_do_not_block() {
        assert!(FriendshipStatus::Pending.blocks_new_request());
        assert!(FriendshipStatus::Accepted.blocks_new_request());
        assert!(!FriendshipStatus::Rejected.blocks_new_request());
    }

    #[test]
    fn test_incoming_is_relative_to_viewer() {
        let (alice, bob, carol) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let request = row(alice, bob);
        assert!(request.is_incoming_for(bob));
        assert!(!request.is_incoming_for(alice));
        assert!(request.involves(alice));
        assert!(!request.involves(carol));
    }
}

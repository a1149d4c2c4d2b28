pub mod events;
pub mod friends;
pub mod lookups;
pub mod messages;
pub mod notifications;
pub mod posts;
pub mod role_requests;
pub mod sponsors;
pub mod tickets;
pub mod users;

pub use events::EventRepo;
pub use friends::{FriendRepo, RequestOutcome};
pub use lookups::LookupRepo;
pub use messages::MessageRepo;
pub use notifications::NotificationRepo;
pub use posts::PostRepo;
pub use role_requests::RoleRequestRepo;
pub use sponsors::SponsorRepo;
pub use tickets::{BookingOutcome, DueReminder, TicketRepo};
pub use users::{NewUser, UserRepo};

pub mod event;
pub mod friend;
pub mod lookup;
pub mod message;
pub mod notification;
pub mod post;
pub mod review;
pub mod sponsor;
pub mod ticket;
pub mod user;

pub use event::{Event, EventChanges, EventDetail, EventFilter, EventStatus, NewEvent};
pub use friend::{FriendView, Friendship, FriendshipStatus};
pub use lookup::{Category, Venue};
pub use message::Message;
pub use notification::{Notification, NotificationType};
pub use post::{Comment, CommentView, LikeStatus, Post, PostRow, PostView};
pub use review::ReviewStatus;
pub use sponsor::{Sponsor, SponsorApplication, SponsorTier};
pub use ticket::{Booking, BookingReceipt, BookingRejection, BookingSnapshot, BookingView, TicketType};
pub use user::{ProfileUpdate, PublicUser, RoleRequest, RoleRequestView, User, UserRole};

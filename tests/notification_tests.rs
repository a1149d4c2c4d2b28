mod common;

use chrono::{Duration, Utc};
use common::*;
use eventkoi_server::models::{FriendshipStatus, Notification, NotificationType, User, UserRole};
use eventkoi_server::reminders;
use eventkoi_server::repos::{
    BookingOutcome, FriendRepo, NotificationRepo, RequestOutcome, TicketRepo, UserRepo,
};
use eventkoi_server::AppState;
use serde_json::json;
use uuid::Uuid;

async fn notifications_of(state: &AppState, user: &User, kind: NotificationType) -> Vec<Notification> {
    NotificationRepo::new(state.db.clone())
        .list_for(user.id)
        .await
        .unwrap()
        .into_iter()
        .filter(|n| n.kind == kind)
        .collect()
}

async fn befriend(state: &AppState, a: &User, b: &User) {
    let repo = FriendRepo::new(state.db.clone());
    let RequestOutcome::Created(request) = repo.request(a.id, b.id).await.unwrap() else {
        panic!("expected a new friend request");
    };
    repo.respond(request.id, b.id, FriendshipStatus::Accepted)
        .await
        .unwrap()
        .expect("pending request");
}

async fn book(state: &AppState, user: &User, event_id: Uuid, ticket_type_id: Uuid) {
    let outcome = TicketRepo::new(state.db.clone())
        .book(user.id, event_id, ticket_type_id)
        .await
        .unwrap();
    assert!(matches!(outcome, BookingOutcome::Booked(_)));
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_role_request_approval_promotes_and_verifies() {
    let state = setup_test_db().await;
    let (applicant, applicant_token) = create_test_user(&state, UserRole::Attendee).await;
    let (_, admin_token) = create_test_user(&state, UserRole::Admin).await;
    assert!(!applicant.is_verified);

    let (status, body) = send_json(app(&state), "POST", "/api/user/request-role", Some(&applicant_token), json!({})).await;
    assert_eq!(status.as_u16(), 201);
    let request_id = body["data"]["id"].as_str().unwrap().to_string();

    // Only admins review
    let uri = format!("/api/admin/role-requests/{}", request_id);
    let (status, _) = send_json(app(&state), "PUT", &uri, Some(&applicant_token), json!({ "status": "APPROVED" })).await;
    assert_eq!(status.as_u16(), 403);

    let (status, body) = send_json(app(&state), "PUT", &uri, Some(&admin_token), json!({ "status": "APPROVED" })).await;
    assert_eq!(status.as_u16(), 200);
    assert_eq!(body["data"]["status"], "APPROVED");

    let promoted = UserRepo::new(state.db.clone())
        .get_by_id(applicant.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(promoted.role, UserRole::Organizer);
    assert!(promoted.is_verified);

    let (status, _) = send_json(app(&state), "PUT", &uri, Some(&admin_token), json!({ "status": "REJECTED" })).await;
    assert_eq!(status.as_u16(), 409);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_role_request_rejection_leaves_role_alone() {
    let state = setup_test_db().await;
    let (applicant, applicant_token) = create_test_user(&state, UserRole::Attendee).await;
    let (_, admin_token) = create_test_user(&state, UserRole::Admin).await;

    let (_, body) = send_json(app(&state), "POST", "/api/user/request-role", Some(&applicant_token), json!({})).await;
    let uri = format!("/api/admin/role-requests/{}", body["data"]["id"].as_str().unwrap());
    let (status, _) = send_json(app(&state), "PUT", &uri, Some(&admin_token), json!({ "status": "REJECTED" })).await;
    assert_eq!(status.as_u16(), 200);

    let user = UserRepo::new(state.db.clone())
        .get_by_id(applicant.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.role, UserRole::Attendee);
    assert!(!user.is_verified);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_reminders_are_claimed_once_and_sent_once_per_user_and_event() {
    let state = setup_test_db().await;
    let (organizer, _) = create_test_user(&state, UserRole::Organizer).await;
    let (alice, _) = create_test_user(&state, UserRole::Attendee).await;
    let (bob, _) = create_test_user(&state, UserRole::Attendee).await;

    let soon_title = format!("Soon {}", Uuid::new_v4());
    let later_title = format!("Later {}", Uuid::new_v4());
    let soon = create_test_event(&state, organizer.id, &soon_title, Duration::minutes(30)).await;
    let later = create_test_event(&state, organizer.id, &later_title, Duration::days(3)).await;

    let general = create_ticket_type(&state, soon.id, "General", 10, 10).await;
    let vip = create_ticket_type(&state, soon.id, "VIP", 50, 10).await;
    let far = create_ticket_type(&state, later.id, "General", 10, 10).await;

    // Alice holds two tickets for the same event
    book(&state, &alice, soon.id, general.id).await;
    book(&state, &alice, soon.id, vip.id).await;
    book(&state, &bob, soon.id, general.id).await;
    book(&state, &alice, later.id, far.id).await;

    let sent = reminders::sweep(&state, Utc::now()).await.unwrap();
    assert!(sent >= 2);

    let reminders_for = |user: User| {
        let state = state.clone();
        let title = soon_title.clone();
        async move {
            notifications_of(&state, &user, NotificationType::EventReminder)
                .await
                .into_iter()
                .filter(|n| n.content.contains(&title))
                .count()
        }
    };
    assert_eq!(reminders_for(alice.clone()).await, 1);
    assert_eq!(reminders_for(bob.clone()).await, 1);
    assert!(notifications_of(&state, &alice, NotificationType::EventReminder)
        .await
        .iter()
        .all(|n| !n.content.contains(&later_title)));

    let claimed: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM bookings WHERE event_id = $1 AND reminder_sent",
    )
    .bind(soon.id)
    .fetch_one(&state.db)
    .await
    .unwrap();
    assert_eq!(claimed, 3);

    // Nothing is left to claim, and a second sweep sends nothing new
    let repo = TicketRepo::new(state.db.clone());
    let horizon = Utc::now() + state.config().reminder_lead;
    let again = repo.claim_due_reminders(horizon).await.unwrap();
    assert!(again.iter().all(|r| r.event_id != soon.id));
    reminders::sweep(&state, Utc::now()).await.unwrap();
    assert_eq!(reminders_for(alice.clone()).await, 1);

    // Two sweepers racing split the bookings without overlap
    let race_title = format!("Race {}", Uuid::new_v4());
    let race = create_test_event(&state, organizer.id, &race_title, Duration::minutes(20)).await;
    let seats = create_ticket_type(&state, race.id, "General", 10, 10).await;
    for _ in 0..4 {
        book(&state, &bob, race.id, seats.id).await;
    }
    let (first, second) = tokio::join!(
        repo.claim_due_reminders(horizon),
        repo.claim_due_reminders(horizon)
    );
    let total = first
        .unwrap()
        .into_iter()
        .chain(second.unwrap())
        .filter(|r| r.event_id == race.id)
        .count();
    assert_eq!(total, 4);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_mark_read_is_owner_only_and_idempotent() {
    let state = setup_test_db().await;
    let (owner, owner_token) = create_test_user(&state, UserRole::Attendee).await;
    let (_, other_token) = create_test_user(&state, UserRole::Attendee).await;

    let notification = state
        .notify(owner.id, NotificationType::NewEvent, "New event published: Gala")
        .await
        .unwrap();
    let body = json!({ "notification_id": notification.id });

    let (status, response) = send_json(app(&state), "PUT", "/api/notifications", Some(&other_token), body.clone()).await;
    assert_eq!(status.as_u16(), 403);
    assert_eq!(response["error"]["code"], "FORBIDDEN");

    let stored = NotificationRepo::new(state.db.clone())
        .get_by_id(notification.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!stored.is_read);

    for _ in 0..2 {
        let (status, response) = send_json(app(&state), "PUT", "/api/notifications", Some(&owner_token), body.clone()).await;
        assert_eq!(status.as_u16(), 200);
        assert_eq!(response["data"]["is_read"], true);
    }

    let missing = json!({ "notification_id": Uuid::new_v4() });
    let (status, _) = send_json(app(&state), "PUT", "/api/notifications", Some(&owner_token), missing).await;
    assert_eq!(status.as_u16(), 404);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_new_event_reaches_accepted_friends_only() {
    let state = setup_test_db().await;
    let (organizer, organizer_token) = create_test_user(&state, UserRole::Organizer).await;
    let (friend, _) = create_test_user(&state, UserRole::Attendee).await;
    let (pending, _) = create_test_user(&state, UserRole::Attendee).await;
    let (stranger, _) = create_test_user(&state, UserRole::Attendee).await;

    befriend(&state, &organizer, &friend).await;
    FriendRepo::new(state.db.clone())
        .request(organizer.id, pending.id)
        .await
        .unwrap();

    let start = Utc::now() + Duration::days(2);
    let published_title = format!("Launch {}", Uuid::new_v4());
    let (status, _) = send_json(
        app(&state),
        "POST",
        "/api/events",
        Some(&organizer_token),
        json!({ "title": published_title, "start_time": start, "end_time": start + Duration::hours(2) }),
    )
    .await;
    assert_eq!(status.as_u16(), 201);

    let announced = |user: User, title: String| {
        let state = state.clone();
        async move {
            notifications_of(&state, &user, NotificationType::NewEvent)
                .await
                .into_iter()
                .filter(|n| n.content.contains(&title))
                .count()
        }
    };
    assert_eq!(announced(friend.clone(), published_title.clone()).await, 1);
    assert_eq!(announced(pending.clone(), published_title.clone()).await, 0);
    assert_eq!(announced(stranger.clone(), published_title.clone()).await, 0);

    // A draft stays quiet until it is published
    let draft_title = format!("Draft {}", Uuid::new_v4());
    let (status, draft) = send_json(
        app(&state),
        "POST",
        "/api/events",
        Some(&organizer_token),
        json!({
            "title": draft_title,
            "start_time": start,
            "end_time": start + Duration::hours(2),
            "status": "DRAFT"
        }),
    )
    .await;
    assert_eq!(status.as_u16(), 201);
    assert_eq!(announced(friend.clone(), draft_title.clone()).await, 0);

    let uri = format!("/api/events/{}", draft["data"]["id"].as_str().unwrap());
    let (status, _) = send_json(app(&state), "PUT", &uri, Some(&organizer_token), json!({ "status": "PUBLISHED" })).await;
    assert_eq!(status.as_u16(), 200);
    assert_eq!(announced(friend.clone(), draft_title.clone()).await, 1);
    assert_eq!(announced(stranger.clone(), draft_title.clone()).await, 0);

    // Editing an already published event does not announce it again
    let (status, _) = send_json(app(&state), "PUT", &uri, Some(&organizer_token), json!({ "description": "Now with snacks" })).await;
    assert_eq!(status.as_u16(), 200);
    assert_eq!(announced(friend, draft_title).await, 1);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_message_notification_names_the_sender() {
    let state = setup_test_db().await;
    let (sender, sender_token) = create_test_user(&state, UserRole::Attendee).await;
    let (receiver, _) = create_test_user(&state, UserRole::Attendee).await;
    befriend(&state, &sender, &receiver).await;

    let (status, _) = send_json(
        app(&state),
        "POST",
        "/api/messages",
        Some(&sender_token),
        json!({ "receiver_id": receiver.id, "content": "See you there" }),
    )
    .await;
    assert_eq!(status.as_u16(), 201);

    let notes = notifications_of(&state, &receiver, NotificationType::Message).await;
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].content, format!("New message from {}", sender.name));
    assert!(!notes[0].content.contains(&sender.email));
}

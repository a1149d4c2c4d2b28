mod common;

use chrono::Duration;
use common::*;
use eventkoi_server::models::{
    FriendshipStatus, ReviewStatus, SponsorApplication, SponsorTier, UserRole,
};
use eventkoi_server::repos::{FriendRepo, PostRepo, RequestOutcome, SponsorRepo};
use rust_decimal::Decimal;
use serde_json::json;

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_like_toggle_pair_restores_state() {
    let state = setup_test_db().await;
    let (organizer, _) = create_test_user(&state, UserRole::Organizer).await;
    let (fan, fan_token) = create_test_user(&state, UserRole::Attendee).await;
    let event = create_test_event(&state, organizer.id, "Feed", Duration::days(2)).await;
    let post = PostRepo::new(state.db.clone())
        .create(event.id, organizer.id, "Doors open at 6", None)
        .await
        .unwrap();

    let body = json!({ "post_id": post.id });
    let (status, liked) = send_json(app(&state), "POST", "/api/posts/like", Some(&fan_token), body.clone()).await;
    assert_eq!(status.as_u16(), 200);
    assert_eq!(liked["data"]["liked"], true);
    assert_eq!(liked["data"]["like_count"], 1);

    let (_, unliked) = send_json(app(&state), "POST", "/api/posts/like", Some(&fan_token), body).await;
    assert_eq!(unliked["data"]["liked"], false);
    assert_eq!(unliked["data"]["like_count"], 0);

    let rows = PostRepo::new(state.db.clone())
        .list_for_event(event.id, Some(fan.id))
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].like_count, 0);
    assert!(!rows[0].is_liked);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_friend_request_lifecycle() {
    let state = setup_test_db().await;
    let (alice, alice_token) = create_test_user(&state, UserRole::Attendee).await;
    let (bob, bob_token) = create_test_user(&state, UserRole::Attendee).await;

    let (status, _) = send_json(app(&state), "POST", "/api/friends", Some(&alice_token), json!({ "friend_id": alice.id })).await;
    assert_eq!(status.as_u16(), 400);

    let (status, sent) = send_json(app(&state), "POST", "/api/friends", Some(&alice_token), json!({ "friend_id": bob.id })).await;
    assert_eq!(status.as_u16(), 201);
    let friendship_id = sent["data"]["id"].clone();

    // Reverse direction while PENDING
    let (status, _) = send_json(app(&state), "POST", "/api/friends", Some(&bob_token), json!({ "friend_id": alice.id })).await;
    assert_eq!(status.as_u16(), 409);

    // The sender cannot accept their own request
    let respond = json!({ "friendship_id": friendship_id, "status": "ACCEPTED" });
    let (status, _) = send_json(app(&state), "PUT", "/api/friends", Some(&alice_token), respond.clone()).await;
    assert_eq!(status.as_u16(), 403);

    let (status, accepted) = send_json(app(&state), "PUT", "/api/friends", Some(&bob_token), respond.clone()).await;
    assert_eq!(status.as_u16(), 200);
    assert_eq!(accepted["data"]["status"], "ACCEPTED");

    // ACCEPTED is terminal
    let reject = json!({ "friendship_id": friendship_id, "status": "REJECTED" });
    let (status, _) = send_json(app(&state), "PUT", "/api/friends", Some(&bob_token), reject).await;
    assert_eq!(status.as_u16(), 409);

    assert!(FriendRepo::new(state.db.clone())
        .are_friends(alice.id, bob.id)
        .await
        .unwrap());
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_rejected_request_can_be_sent_again() {
    let state = setup_test_db().await;
    let (alice, _) = create_test_user(&state, UserRole::Attendee).await;
    let (bob, _) = create_test_user(&state, UserRole::Attendee).await;
    let repo = FriendRepo::new(state.db.clone());

    let RequestOutcome::Created(first) = repo.request(alice.id, bob.id).await.unwrap() else {
        panic!("first request should be created");
    };
    let rejected = repo
        .respond(first.id, bob.id, FriendshipStatus::Rejected)
        .await
        .unwrap()
        .expect("recipient can reject");
    assert_eq!(rejected.status, FriendshipStatus::Rejected);

    let RequestOutcome::Created(second) = repo.request(bob.id, alice.id).await.unwrap() else {
        panic!("a rejected pair can start over");
    };
    assert_ne!(second.id, first.id);
    assert_eq!(second.status, FriendshipStatus::Pending);
    assert!(repo.get_by_id(first.id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_messages_require_friendship() {
    let state = setup_test_db().await;
    let (_, alice_token) = create_test_user(&state, UserRole::Attendee).await;
    let (bob, _) = create_test_user(&state, UserRole::Attendee).await;

    let (status, _) = send_json(
        app(&state),
        "POST",
        "/api/messages",
        Some(&alice_token),
        json!({ "receiver_id": bob.id, "content": "hi" }),
    )
    .await;
    assert_eq!(status.as_u16(), 403);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_pending_sponsor_hidden_until_approved() {
    let state = setup_test_db().await;
    let (organizer, organizer_token) = create_test_user(&state, UserRole::Organizer).await;
    let event = create_test_event(&state, organizer.id, "Sponsored", Duration::days(5)).await;

    let sponsor = SponsorRepo::new(state.db.clone())
        .create(SponsorApplication {
            event_id: event.id,
            name: "Acme".to_string(),
            tier: SponsorTier::Gold,
            contribution_amount: Decimal::from(1000),
            logo_url: None,
        })
        .await
        .unwrap();
    assert_eq!(sponsor.status, ReviewStatus::Pending);

    let uri = format!("/api/sponsors?event_id={}", event.id);
    let (_, public) = get_json(app(&state), &uri, None).await;
    assert_eq!(public["data"].as_array().unwrap().len(), 0);

    let (_, owner_view) = get_json(app(&state), &uri, Some(&organizer_token)).await;
    assert_eq!(owner_view["data"].as_array().unwrap().len(), 1);

    let approve = json!({ "sponsor_id": sponsor.id, "status": "APPROVED" });
    let (status, _) = send_json(app(&state), "PUT", "/api/sponsors", Some(&organizer_token), approve.clone()).await;
    assert_eq!(status.as_u16(), 200);

    let (_, public) = get_json(app(&state), &uri, None).await;
    assert_eq!(public["data"][0]["name"], "Acme");

    // APPROVED is terminal
    let (status, _) = send_json(app(&state), "PUT", "/api/sponsors", Some(&organizer_token), approve).await;
    assert_eq!(status.as_u16(), 409);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_concurrent_like_toggles_cancel_out() {
    let state = setup_test_db().await;
    let (organizer, _) = create_test_user(&state, UserRole::Organizer).await;
    let (fan, _) = create_test_user(&state, UserRole::Attendee).await;
    let event = create_test_event(&state, organizer.id, "Race", Duration::days(2)).await;
    let repo = PostRepo::new(state.db.clone());
    let post = repo
        .create(event.id, organizer.id, "Double tap", None)
        .await
        .unwrap();

    let (first, second) = tokio::join!(
        repo.toggle_like(post.id, fan.id),
        repo.toggle_like(post.id, fan.id)
    );
    let (first, second) = (first.unwrap(), second.unwrap());

    // Two toggles are a like and an unlike, whichever order they land in
    assert_ne!(first.liked, second.liked);

    let rows = repo.list_for_event(event.id, Some(fan.id)).await.unwrap();
    assert_eq!(rows[0].like_count, 0);
    assert!(!rows[0].is_liked);
}

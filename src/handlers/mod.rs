use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::utils::response::success;

pub mod admin;
pub mod auth;
pub mod events;
pub mod friends;
pub mod lookups;
pub mod messages;
pub mod notifications;
pub mod posts;
pub mod sponsors;
pub mod tickets;
pub mod users;

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
}

pub async fn health_check() -> Response {
    let payload = HealthPayload {
        status: "ok",
        service: "eventkoi-api",
    };

    success(payload, "Health check successful").into_response()
}

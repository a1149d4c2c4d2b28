use std::future::Future;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, create_security_headers_layer};
use crate::handlers::{
    admin, auth, events, friends, health_check, lookups, messages, notifications, posts,
    sponsors, tickets, users,
};
use crate::state::AppState;
use crate::uploads::PUBLIC_PREFIX;

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/user/request-role", post(auth::request_role))
        .route(
            "/user/profile",
            get(auth::get_profile).put(auth::update_profile),
        )
        .route("/admin/role-requests", get(admin::list_role_requests))
        .route("/admin/role-requests/:id", put(admin::review_role_request))
        .route(
            "/events",
            get(events::list_events).post(events::create_event),
        )
        .route(
            "/events/:id",
            get(events::get_event)
                .put(events::update_event)
                .delete(events::delete_event),
        )
        .route(
            "/ticket-types",
            get(tickets::list_ticket_types).post(tickets::create_ticket_type),
        )
        .route(
            "/bookings",
            get(tickets::list_bookings).post(tickets::book_ticket),
        )
        .route(
            "/sponsors",
            get(sponsors::list_sponsors)
                .post(sponsors::apply_sponsor)
                .put(sponsors::review_sponsor),
        )
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route("/posts/like", post(posts::toggle_like))
        .route("/posts/comment", post(posts::add_comment))
        .route("/users", get(users::search_users))
        .route(
            "/friends",
            get(friends::list_friends)
                .post(friends::send_request)
                .put(friends::respond_request),
        )
        .route(
            "/messages",
            get(messages::list_messages).post(messages::send_message),
        )
        .route("/messages/stream", get(messages::stream_messages))
        .route(
            "/notifications",
            get(notifications::list_notifications).put(notifications::mark_read),
        )
        .route("/notifications/read-all", put(notifications::mark_all_read))
        .route(
            "/notifications/stream",
            get(notifications::stream_notifications),
        )
        .route(
            "/venues",
            get(lookups::list_venues).post(lookups::create_venue),
        )
        .route(
            "/categories",
            get(lookups::list_categories).post(lookups::create_category),
        )
}

pub fn create_routes(state: AppState) -> Router {
    let config = state.config();
    let max_body = config.max_upload_bytes;
    let security = create_security_headers_layer(config);
    let cors = create_cors_layer(config);
    let uploads = ServeDir::new(state.uploads().root());

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes())
        .nest_service(PUBLIC_PREFIX, uploads)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body))
        .layer(TraceLayer::new_for_http())
        .layer(security)
        .layer(cors)
        .with_state(state)
}

/// Serves the API until `signal` resolves. The realtime hub is closed at that
/// point so open SSE streams finish and in-flight requests can drain.
pub async fn serve<F>(listener: TcpListener, state: AppState, signal: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let hub = state.hub().clone();
    let app = create_routes(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            signal.await;
            hub.close();
        })
        .await
}

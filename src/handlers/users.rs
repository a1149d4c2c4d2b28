use axum::extract::State;
use axum::response::IntoResponse;
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::repos::UserRepo;
use crate::state::AppState;
use crate::utils::response::success;
use crate::utils::{AppError, AppQuery};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub search: String,
}

pub async fn search_users(
    State(state): State<AppState>,
    auth: AuthUser,
    AppQuery(query): AppQuery<SearchQuery>,
) -> Result<impl IntoResponse, AppError> {
    let users = UserRepo::new(state.db.clone())
        .search(&query.search, auth.id)
        .await?;

    Ok(success(users, "Users retrieved"))
}

use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{validate_update, ListUsersQuery},
    extractors::{ApiJson, ApiPath, ApiQuery},
};
use crate::{
    identity::{dto::UserUpdate, ApiError},
    state::AppState,
    users::repo_types::{User, UserPage},
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:id", get(get_user).put(update_user))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    ApiQuery(q): ApiQuery<ListUsersQuery>,
) -> Result<Json<UserPage>, ApiError> {
    q.validate()?;
    let page = state
        .identity
        .list_users(q.limit, q.offset, q.email, q.name)
        .await?;
    Ok(Json(page))
}

/// `:id` may be a numeric id or an email.
#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.identity.get_user(&id).await?))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UserUpdate>,
) -> Result<Json<User>, ApiError> {
    validate_update(&payload)?;
    Ok(Json(state.identity.update(payload, id).await?))
}

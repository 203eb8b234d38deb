use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{AssignRoleRequest, CreateRoleRequest},
    extractors::{ApiJson, ApiPath},
};
use crate::{identity::ApiError, roles::repo_types::Role, state::AppState};

/// Role administration, mounted behind `require_admin`.
pub fn role_routes() -> Router<AppState> {
    Router::new()
        .route("/roles", get(list_roles).post(create_role))
        .route("/users/:id/roles", post(assign_role))
}

pub async fn list_roles(State(state): State<AppState>) -> Result<Json<Vec<Role>>, ApiError> {
    Ok(Json(state.identity.list_roles().await?))
}

#[instrument(skip(state, payload))]
pub async fn create_role(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateRoleRequest>,
) -> Result<(StatusCode, Json<Role>), ApiError> {
    payload.validate()?;
    let role = state
        .identity
        .create_role(&payload.code, &payload.name)
        .await?;
    Ok((StatusCode::CREATED, Json(role)))
}

#[instrument(skip(state))]
pub async fn assign_role(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<AssignRoleRequest>,
) -> Result<StatusCode, ApiError> {
    state.identity.assign_role(id, &payload.code).await?;
    Ok(StatusCode::NO_CONTENT)
}

use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{error, instrument, warn};

use super::{
    dto::{
        LoginRequest, LoginResponse, MessageResponse, RegisterRequest, ResetPasswordRequest,
        TokenCheckRequest,
    },
    extractors::{encode_cookie, ApiJson, BearerToken, CREDENTIALS_COOKIE},
};
use crate::{
    auth::claims::TokenPayload,
    identity::ApiError,
    state::AppState,
    users::repo_types::User,
};

/// Routes reachable without a token.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/token/check", post(check_token))
}

/// Routes behind `require_token`.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/logout", get(logout))
        .route("/me", get(me))
        .route("/register", post(register))
        .route("/reset-password", post(reset_password))
}

fn cookie_header(value: &str, max_age: i64) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(&format!(
        "{CREDENTIALS_COOKIE}={value}; HttpOnly; Path=/; Max-Age={max_age}"
    ))
    .map_err(|e| {
        error!(error = %e, "cookie header build failed");
        ApiError::Internal(e.into())
    })
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<(HeaderMap, Json<LoginResponse>), ApiError> {
    payload.validate()?;

    let (claims, token) = state
        .identity
        .authenticate(&payload.email, &payload.password)
        .await?;

    let max_age = (claims.exp - OffsetDateTime::now_utc().unix_timestamp()).max(0);
    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie_header(&encode_cookie(&token), max_age)?);

    Ok((
        headers,
        Json(LoginResponse {
            payload: claims,
            token,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn check_token(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<TokenCheckRequest>,
) -> Result<Json<TokenPayload>, ApiError> {
    if !state.identity.is_token_valid(&payload.token) {
        warn!("token check failed");
        return Err(ApiError::Unauthorized("Invalid token.".into()));
    }
    Ok(Json(state.identity.get_token_data(&payload.token)?))
}

pub async fn logout() -> Result<(HeaderMap, Json<MessageResponse>), ApiError> {
    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie_header("", 0)?);
    Ok((
        headers,
        Json(MessageResponse {
            message: "User disconnected.",
        }),
    ))
}

#[instrument(skip_all)]
pub async fn me(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<Json<TokenPayload>, ApiError> {
    Ok(Json(state.identity.get_token_data(&token)?))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    payload.validate()?;
    let user = state
        .identity
        .register(&payload.email, &payload.name, &payload.password)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ResetPasswordRequest>,
) -> Result<Json<User>, ApiError> {
    payload.validate()?;
    let user = state
        .identity
        .reset_password(&payload.email, &payload.password)
        .await?;
    Ok(Json(user))
}

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Request, State},
    http::{
        header::{AUTHORIZATION, COOKIE},
        request::Parts,
        HeaderMap,
    },
    middleware::Next,
    response::Response,
};
use base64ct::{Base64, Encoding};
use tracing::warn;

use crate::{identity::ApiError, state::AppState};

/// Cookie carrying base64(token), set on login.
pub const CREDENTIALS_COOKIE: &str = "user-api-credentials";
pub const ADMIN_ROLE: &str = "admin";

/// `Json` whose rejection is an [`ApiError`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Raw token from `Authorization: Bearer <token>` or the credentials cookie.
/// Presence only; validity is checked by the middleware.
pub struct BearerToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(header) = parts.headers.get(AUTHORIZATION) {
            let token = header
                .to_str()
                .ok()
                .and_then(|h| h.strip_prefix("Bearer ").or_else(|| h.strip_prefix("bearer ")))
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .ok_or_else(|| ApiError::Unauthorized("Invalid Authorization header.".into()))?;
            return Ok(BearerToken(token.to_owned()));
        }

        if let Some(raw) = cookie_value(&parts.headers, CREDENTIALS_COOKIE) {
            let token = decode_cookie(raw)
                .ok_or_else(|| ApiError::Unauthorized("Invalid token.".into()))?;
            return Ok(BearerToken(token));
        }

        Err(ApiError::Unauthorized("Missing credentials.".into()))
    }
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

pub fn encode_cookie(token: &str) -> String {
    Base64::encode_string(token.as_bytes())
}

fn decode_cookie(raw: &str) -> Option<String> {
    let bytes = Base64::decode_vec(raw).ok()?;
    String::from_utf8(bytes).ok()
}

fn ensure_valid(state: &AppState, token: &str, request: &Request) -> Result<(), ApiError> {
    if state.identity.is_token_valid(token) {
        return Ok(());
    }
    warn!(path = %request.uri().path(), "invalid or expired token");
    Err(ApiError::Unauthorized("Invalid token.".into()))
}

/// Lets the request through only with a valid, unexpired token.
pub async fn require_token(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    ensure_valid(&state, &token, &request)?;
    Ok(next.run(request).await)
}

/// [`require_token`] plus the `admin` role.
pub async fn require_admin(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    ensure_valid(&state, &token, &request)?;
    state.identity.authorize(&token, &[ADMIN_ROLE])?;
    Ok(next.run(request).await)
}

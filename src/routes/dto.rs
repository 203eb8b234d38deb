use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::auth::claims::TokenPayload;
use crate::identity::{dto::UserUpdate, ApiError};

pub const MAX_PAGE_SIZE: i64 = 100;

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn check_email(email: &str) -> Result<(), ApiError> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(ApiError::InvalidArgument("Invalid email.".into()))
    }
}

fn check_non_empty(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        Err(ApiError::InvalidArgument(format!("{field} must not be empty.")))
    } else {
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        check_email(&self.email)?;
        check_non_empty("password", &self.password)
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        check_email(&self.email)?;
        check_non_empty("name", &self.name)?;
        check_non_empty("password", &self.password)
    }
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub password: String,
}

impl ResetPasswordRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        check_email(&self.email)?;
        check_non_empty("password", &self.password)
    }
}

#[derive(Debug, Deserialize)]
pub struct TokenCheckRequest {
    pub token: String,
}

pub fn validate_update(update: &UserUpdate) -> Result<(), ApiError> {
    check_email(&update.email)?;
    check_non_empty("name", &update.name)
}

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    pub email: Option<String>,
    pub name: Option<String>,
}
fn default_limit() -> i64 {
    20
}

impl ListUsersQuery {
    pub fn validate(&self) -> Result<(), ApiError> {
        if !(1..=MAX_PAGE_SIZE).contains(&self.limit) {
            return Err(ApiError::InvalidArgument(format!(
                "limit must be between 1 and {MAX_PAGE_SIZE}."
            )));
        }
        if self.offset < 0 {
            return Err(ApiError::InvalidArgument("offset must not be negative.".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub code: String,
    pub name: String,
}

impl CreateRoleRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        check_non_empty("code", &self.code)?;
        check_non_empty("name", &self.name)
    }
}

#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub payload: TokenPayload,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape_is_checked() {
        assert!(is_valid_email("dumb@laposte.net"));
        assert!(is_valid_email("Mixed.Case@Example.org"));
        assert!(!is_valid_email("no-at-sign.net"));
        assert!(!is_valid_email("spaces in@x.com"));
        assert!(!is_valid_email("a@nodot"));
    }

    #[test]
    fn list_query_bounds() {
        let q = |limit, offset| ListUsersQuery {
            limit,
            offset,
            email: None,
            name: None,
        };
        assert!(q(20, 0).validate().is_ok());
        assert!(q(MAX_PAGE_SIZE, 10).validate().is_ok());
        assert!(q(0, 0).validate().is_err());
        assert!(q(MAX_PAGE_SIZE + 1, 0).validate().is_err());
        assert!(q(5, -1).validate().is_err());
    }

    #[test]
    fn list_query_defaults() {
        let q: ListUsersQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.limit, 20);
        assert_eq!(q.offset, 0);
        assert!(q.email.is_none());
    }

    #[test]
    fn register_requires_every_field() {
        let req = RegisterRequest {
            email: "a@x.com".into(),
            name: " ".into(),
            password: "pw".into(),
        };
        assert!(matches!(req.validate(), Err(ApiError::InvalidArgument(_))));
    }
}

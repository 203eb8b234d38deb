use serde::{Deserialize, Serialize};

use crate::roles::repo_types::Role;
use crate::users::repo_types::User;

/// Everything a token asserts about its holder, minus the expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserClaims {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub active: bool,
    pub roles: Vec<Role>,
}

impl UserClaims {
    pub fn new(user: User, roles: Vec<Role>) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            active: user.active,
            roles,
        }
    }

    pub fn role_codes(&self) -> impl Iterator<Item = &str> {
        self.roles.iter().map(|r| r.code.as_str())
    }
}

/// JWT payload: the user claims plus `exp` (unix seconds, UTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    #[serde(flatten)]
    pub user: UserClaims,
    pub exp: i64,
}

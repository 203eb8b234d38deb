use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use super::{dto::UserUpdate, error::ApiError};
use crate::auth::{
    claims::{TokenPayload, UserClaims},
    jwt::TokenService,
    password::{derive_hash, generate_salt},
};
use crate::roles::{repo::RoleStore, repo_types::Role};
use crate::storage::StoreError;
use crate::users::{
    repo::UserStore,
    repo_types::{User, UserFilter, UserPage},
};

/// Stateless coordinator over the stores and the token service.
#[derive(Clone)]
pub struct IdentityService {
    users: Arc<dyn UserStore>,
    roles: Arc<dyn RoleStore>,
    tokens: TokenService,
}

impl IdentityService {
    pub fn new(users: Arc<dyn UserStore>, roles: Arc<dyn RoleStore>, tokens: TokenService) -> Self {
        Self {
            users,
            roles,
            tokens,
        }
    }

    #[instrument(skip(self, password))]
    pub async fn register(&self, email: &str, name: &str, password: &str) -> Result<User, ApiError> {
        let salt = generate_salt();
        let hash = derive_hash(password, &salt)?;

        match self.users.create(email, name, &hash, &salt).await {
            Ok(user) => {
                info!(user_id = user.id, "user registered");
                Ok(user)
            }
            Err(StoreError::Conflict) => {
                warn!("email already registered");
                Err(ApiError::Conflict("User already exists.".into()))
            }
            Err(e) => Err(ApiError::internal("register", e)),
        }
    }

    #[instrument(skip(self, password))]
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(TokenPayload, String), ApiError> {
        let salt = match self.users.get_salt(email).await {
            Ok(salt) => salt,
            Err(StoreError::NotFound) => {
                return Err(ApiError::NotFound(format!("Can't find user {email}.")))
            }
            Err(e) => return Err(ApiError::internal("authenticate", e)),
        };

        let hash = derive_hash(password, &salt)?;
        let valid = self
            .users
            .check_hash(email, &hash)
            .await
            .map_err(|e| ApiError::internal("authenticate", e))?;
        if !valid {
            warn!("login invalid password");
            return Err(ApiError::Unauthorized("Wrong login or / and password.".into()));
        }

        let user = match self.users.get_by_id_or_email(email).await {
            Ok(user) => user,
            // Row vanished after the hash check.
            Err(StoreError::NotFound) => {
                return Err(ApiError::Unauthorized("Wrong login or / and password.".into()))
            }
            Err(e) => return Err(ApiError::internal("authenticate", e)),
        };
        if !user.active {
            warn!(user_id = user.id, "login on inactive user");
            return Err(ApiError::Unauthorized("User is not active.".into()));
        }

        let roles = match self.roles.get_roles_for_user(user.id).await {
            Ok(roles) => roles,
            Err(StoreError::NotFound) => {
                return Err(ApiError::Unauthorized("Wrong login or / and password.".into()))
            }
            Err(e) => return Err(ApiError::internal("authenticate", e)),
        };

        let user_id = user.id;
        let issued = self.tokens.issue(UserClaims::new(user, roles))?;
        info!(user_id, "user logged in");
        Ok(issued)
    }

    #[instrument(skip(self, password))]
    pub async fn reset_password(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let salt = generate_salt();
        let hash = derive_hash(password, &salt)?;

        let written = self
            .users
            .set_hash_and_salt(email, &hash, &salt)
            .await
            .map_err(|e| ApiError::internal("reset_password", e))?;
        debug!(written, "password hash replaced");

        match self.users.get_by_id_or_email(email).await {
            Ok(user) => {
                info!(user_id = user.id, "password reset");
                Ok(user)
            }
            Err(StoreError::NotFound) => Err(ApiError::UnprocessableEntity(format!(
                "User '{email}' doesn't exist."
            ))),
            Err(e) => Err(ApiError::internal("reset_password", e)),
        }
    }

    #[instrument(skip(self, payload))]
    pub async fn update(&self, payload: UserUpdate, user_id: i64) -> Result<User, ApiError> {
        let UserUpdate {
            id,
            email,
            name,
            active,
        } = payload;
        if id.is_some_and(|id| id != user_id) {
            debug!(body_id = ?id, "ignoring id from update body");
        }

        match self.users.update(user_id, &email, &name, active).await {
            Ok(user) => {
                info!(user_id, "user updated");
                Ok(user)
            }
            Err(StoreError::Conflict) => {
                Err(ApiError::Conflict(format!("Email {email} is already in use.")))
            }
            Err(StoreError::NotFound) => Err(ApiError::NotFound("User not found.".into())),
            Err(e) => Err(ApiError::internal("update", e)),
        }
    }

    #[instrument(skip(self))]
    pub async fn list_users(
        &self,
        limit: i64,
        offset: i64,
        email: Option<String>,
        name: Option<String>,
    ) -> Result<UserPage, ApiError> {
        let filter = UserFilter {
            limit,
            offset,
            email,
            name,
        };
        self.users
            .list(&filter)
            .await
            .map_err(|e| ApiError::internal("list_users", e))
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, identifier: &str) -> Result<User, ApiError> {
        match self.users.get_by_id_or_email(identifier).await {
            Ok(user) => Ok(user),
            Err(StoreError::NotFound) => Err(ApiError::NotFound("User not found.".into())),
            Err(e) => Err(ApiError::internal("get_user", e)),
        }
    }

    pub fn get_token_data(&self, token: &str) -> Result<TokenPayload, ApiError> {
        Ok(self.tokens.decode(token)?)
    }

    pub fn is_token_valid(&self, token: &str) -> bool {
        self.tokens.is_valid(token)
    }

    /// Ok(true) when the token holds every role in `required`, otherwise
    /// `Forbidden` listing the missing codes in the order they were asked for.
    pub fn authorize<S: AsRef<str>>(&self, token: &str, required: &[S]) -> Result<bool, ApiError> {
        let payload = self.tokens.decode(token)?;

        let mut missing: Vec<String> = Vec::new();
        for code in required.iter().map(|s| s.as_ref()) {
            let held = payload.user.role_codes().any(|held| held == code);
            if !held && !missing.iter().any(|m| m == code) {
                missing.push(code.to_owned());
            }
        }

        if !missing.is_empty() {
            warn!(user_id = payload.user.id, ?missing, "missing roles");
            return Err(ApiError::Forbidden { missing });
        }
        Ok(true)
    }

    #[instrument(skip(self))]
    pub async fn create_role(&self, code: &str, name: &str) -> Result<Role, ApiError> {
        match self.roles.create_role(code, name).await {
            Ok(role) => {
                info!(role_id = role.id, "role created");
                Ok(role)
            }
            Err(StoreError::Conflict) => {
                Err(ApiError::Conflict(format!("Role {code} already exists.")))
            }
            Err(e) => Err(ApiError::internal("create_role", e)),
        }
    }

    #[instrument(skip(self))]
    pub async fn assign_role(&self, user_id: i64, code: &str) -> Result<(), ApiError> {
        match self.roles.assign_role(user_id, code).await {
            Ok(()) => Ok(()),
            Err(StoreError::NotFound) => Err(ApiError::NotFound(format!(
                "User {user_id} or role {code} not found."
            ))),
            Err(e) => Err(ApiError::internal("assign_role", e)),
        }
    }

    pub async fn list_roles(&self) -> Result<Vec<Role>, ApiError> {
        self.roles
            .list_roles()
            .await
            .map_err(|e| ApiError::internal("list_roles", e))
    }
}

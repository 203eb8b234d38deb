//! In-memory stores for tests. Same contracts as the Postgres stores.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::auth::password::hashes_equal;
use crate::roles::{repo::RoleStore, repo_types::Role};
use crate::storage::{StoreError, StoreResult};
use crate::users::{
    repo::UserStore,
    repo_types::{User, UserFilter, UserPage},
};

#[derive(Debug, Clone)]
struct UserRow {
    user: User,
    hash: String,
    salt: String,
}

#[derive(Default)]
struct Tables {
    users: Vec<UserRow>,
    roles: Vec<Role>,
    user_roles: Vec<(i64, i64)>,
    next_user_id: i64,
    next_role_id: i64,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn seed_role(&self, code: &str, name: &str) -> Role {
        let mut t = self.tables.lock().unwrap();
        t.next_role_id += 1;
        let role = Role {
            id: t.next_role_id,
            code: code.into(),
            name: name.into(),
        };
        t.roles.push(role.clone());
        role
    }

    pub fn salt_of(&self, email: &str) -> Option<String> {
        let t = self.tables.lock().unwrap();
        t.users
            .iter()
            .find(|r| r.user.email == email)
            .map(|r| r.salt.clone())
    }

    pub fn user_count(&self) -> usize {
        self.tables.lock().unwrap().users.len()
    }

    /// Drops the user row and its role links, like a concurrent delete.
    pub fn remove_user(&self, user_id: i64) {
        let mut t = self.tables.lock().unwrap();
        t.users.retain(|r| r.user.id != user_id);
        t.user_roles.retain(|(uid, _)| *uid != user_id);
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, email: &str, name: &str, hash: &str, salt: &str) -> StoreResult<User> {
        let mut t = self.tables.lock().unwrap();
        if t.users.iter().any(|r| r.user.email == email) {
            return Err(StoreError::Conflict);
        }
        t.next_user_id += 1;
        let user = User {
            id: t.next_user_id,
            email: email.into(),
            name: name.into(),
            active: true,
        };
        t.users.push(UserRow {
            user: user.clone(),
            hash: hash.into(),
            salt: salt.into(),
        });
        Ok(user)
    }

    async fn get_by_id_or_email(&self, identifier: &str) -> StoreResult<User> {
        let t = self.tables.lock().unwrap();
        let found = match identifier.parse::<i64>() {
            Ok(id) => t.users.iter().find(|r| r.user.id == id),
            Err(_) => t.users.iter().find(|r| r.user.email == identifier),
        };
        found.map(|r| r.user.clone()).ok_or(StoreError::NotFound)
    }

    async fn get_salt(&self, email: &str) -> StoreResult<String> {
        self.salt_of(email).ok_or(StoreError::NotFound)
    }

    async fn set_hash_and_salt(&self, email: &str, hash: &str, salt: &str) -> StoreResult<u64> {
        let mut t = self.tables.lock().unwrap();
        let mut written = 0;
        for row in t.users.iter_mut().filter(|r| r.user.email == email) {
            row.hash = hash.into();
            row.salt = salt.into();
            written += 1;
        }
        Ok(written)
    }

    async fn update(
        &self,
        user_id: i64,
        email: &str,
        name: &str,
        active: bool,
    ) -> StoreResult<User> {
        let mut t = self.tables.lock().unwrap();
        if !t.users.iter().any(|r| r.user.id == user_id) {
            return Err(StoreError::NotFound);
        }
        if t
            .users
            .iter()
            .any(|r| r.user.email == email && r.user.id != user_id)
        {
            return Err(StoreError::Conflict);
        }
        let row = t
            .users
            .iter_mut()
            .find(|r| r.user.id == user_id)
            .ok_or(StoreError::NotFound)?;
        row.user.email = email.into();
        row.user.name = name.into();
        row.user.active = active;
        Ok(row.user.clone())
    }

    async fn list(&self, filter: &UserFilter) -> StoreResult<UserPage> {
        let t = self.tables.lock().unwrap();
        let rows: Vec<User> = t
            .users
            .iter()
            .map(|r| &r.user)
            .filter(|u| filter.email.as_deref().map_or(true, |e| contains_ci(&u.email, e)))
            .filter(|u| filter.name.as_deref().map_or(true, |n| contains_ci(&u.name, n)))
            .skip(usize::try_from(filter.offset).unwrap_or(0))
            .take(usize::try_from(filter.limit + 1).unwrap_or(0))
            .cloned()
            .collect();
        Ok(UserPage::from_overfetch(rows, filter.limit))
    }

    async fn check_hash(&self, email: &str, hash: &str) -> StoreResult<bool> {
        let t = self.tables.lock().unwrap();
        Ok(t.users
            .iter()
            .find(|r| r.user.email == email)
            .is_some_and(|r| hashes_equal(&r.hash, hash)))
    }
}

#[async_trait]
impl RoleStore for MemoryStore {
    async fn get_roles_for_user(&self, user_id: i64) -> StoreResult<Vec<Role>> {
        let t = self.tables.lock().unwrap();
        if !t.users.iter().any(|r| r.user.id == user_id) {
            return Err(StoreError::NotFound);
        }
        Ok(t.roles
            .iter()
            .filter(|role| t.user_roles.contains(&(user_id, role.id)))
            .cloned()
            .collect())
    }

    async fn create_role(&self, code: &str, name: &str) -> StoreResult<Role> {
        if self.tables.lock().unwrap().roles.iter().any(|r| r.code == code) {
            return Err(StoreError::Conflict);
        }
        Ok(self.seed_role(code, name))
    }

    async fn assign_role(&self, user_id: i64, code: &str) -> StoreResult<()> {
        let mut t = self.tables.lock().unwrap();
        let role_id = t
            .roles
            .iter()
            .find(|r| r.code == code)
            .map(|r| r.id)
            .ok_or(StoreError::NotFound)?;
        if !t.users.iter().any(|r| r.user.id == user_id) {
            return Err(StoreError::NotFound);
        }
        if !t.user_roles.contains(&(user_id, role_id)) {
            t.user_roles.push((user_id, role_id));
        }
        Ok(())
    }

    async fn list_roles(&self) -> StoreResult<Vec<Role>> {
        Ok(self.tables.lock().unwrap().roles.clone())
    }
}

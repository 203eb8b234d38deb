use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Public projection of a user row. `hash` and `salt` stay in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub active: bool,
}

/// Filter and window for listing users.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub limit: i64,
    pub offset: i64,
    pub email: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserPage {
    pub users: Vec<User>,
    pub has_next: bool,
}

impl UserPage {
    /// Builds a page from a query that fetched up to `limit + 1` rows.
    pub(crate) fn from_overfetch(mut rows: Vec<User>, limit: i64) -> Self {
        let limit = usize::try_from(limit).unwrap_or(0);
        let has_next = rows.len() > limit;
        rows.truncate(limit);
        Self {
            users: rows,
            has_next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users(n: i64) -> Vec<User> {
        (1..=n)
            .map(|id| User {
                id,
                email: format!("u{id}@x.com"),
                name: format!("U{id}"),
                active: true,
            })
            .collect()
    }

    #[test]
    fn overfetched_row_sets_has_next() {
        let page = UserPage::from_overfetch(users(6), 5);
        assert_eq!(page.users.len(), 5);
        assert_eq!(page.users.last().map(|u| u.id), Some(5));
        assert!(page.has_next);
    }

    #[test]
    fn exact_window_has_no_next() {
        let page = UserPage::from_overfetch(users(5), 5);
        assert_eq!(page.users.len(), 5);
        assert!(!page.has_next);
    }

    #[test]
    fn user_serialization_has_no_secrets() {
        let json = serde_json::to_string(&users(1)[0]).unwrap();
        assert!(json.contains("u1@x.com"));
        assert!(!json.contains("hash"));
        assert!(!json.contains("salt"));
    }
}

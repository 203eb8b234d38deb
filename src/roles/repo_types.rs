use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An authorization label such as `admin`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub id: i64,
    pub code: String,
    pub name: String,
}

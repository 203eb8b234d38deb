use serde::Deserialize;

/// Full replacement of a user's mutable attributes.
///
/// `id` is accepted so clients can echo a fetched record back, but it is
/// never used: the target always comes from the caller's `user_id`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserUpdate {
    #[serde(default)]
    pub id: Option<i64>,
    pub email: String,
    pub name: String,
    pub active: bool,
}

//! Creates (or reuses) a user and grants it the `admin` role.
//!
//! Reads `ADMIN_EMAIL`, `ADMIN_PASSWORD` and optionally `ADMIN_NAME` on top of
//! the service configuration.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use user_api::{
    config::AppConfig,
    db,
    identity::ApiError,
    routes::extractors::ADMIN_ROLE,
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    user_api::init_tracing();

    let email = std::env::var("ADMIN_EMAIL").context("ADMIN_EMAIL is not set")?;
    let password = std::env::var("ADMIN_PASSWORD").context("ADMIN_PASSWORD is not set")?;
    let name = std::env::var("ADMIN_NAME").unwrap_or_else(|_| "Admin".into());

    let config = Arc::new(AppConfig::from_env()?);
    let pool = db::connect(&config).await?;
    db::migrate(&pool).await?;
    let state = AppState::from_pool(pool, config);
    let identity = &state.identity;

    let user = match identity.register(&email, &name, &password).await {
        Ok(user) => user,
        Err(ApiError::Conflict(_)) => {
            info!(%email, "user exists, reusing it");
            identity.get_user(&email).await?
        }
        Err(e) => return Err(e.into()),
    };

    identity.assign_role(user.id, ADMIN_ROLE).await?;
    info!(user_id = user.id, %email, "admin ready");
    Ok(())
}

use std::sync::Arc;

use user_api::{app, config::AppConfig, db, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    user_api::init_tracing();

    let config = Arc::new(AppConfig::from_env()?);
    let pool = db::connect(&config).await?;
    db::migrate(&pool).await?;

    let state = AppState::from_pool(pool, config.clone());
    let app = app::build_app(state);

    app::serve(app, &config.host, config.port).await
}

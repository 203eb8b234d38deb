use anyhow::Context;
use serde::Deserialize;

/// 15 days.
const DEFAULT_TTL_SECONDS: u64 = 3600 * 12 * 30;
/// One year.
pub const MAX_TTL_SECONDS: u64 = 3600 * 24 * 365;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_seconds: u64,
}

impl JwtConfig {
    /// Rejects an empty secret and a lifetime outside `1..=MAX_TTL_SECONDS`.
    pub fn new(secret: String, ttl_seconds: u64) -> anyhow::Result<Self> {
        if secret.is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }
        if !(1..=MAX_TTL_SECONDS).contains(&ttl_seconds) {
            anyhow::bail!(
                "JWT_TTL_SECONDS must be between 1 and {MAX_TTL_SECONDS}, got {ttl_seconds}"
            );
        }
        Ok(Self {
            secret,
            ttl_seconds,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt = JwtConfig::new(
            std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?,
            parse_or("JWT_TTL_SECONDS", DEFAULT_TTL_SECONDS)?,
        )?;
        Ok(Self {
            database_url,
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", 10)?,
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parse_or("APP_PORT", 8080)?,
            jwt,
        })
    }
}

fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

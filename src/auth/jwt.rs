use std::time::Duration;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, error};

use super::claims::{TokenPayload, UserClaims};
use crate::config::JwtConfig;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid token")]
    InvalidToken,
    #[error("token encoding failed: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
    #[error("token lifetime of {0:?} puts the expiry out of range")]
    LifetimeOutOfRange(Duration),
}

/// Signs and verifies HS256 tokens. Built once from config and never mutated.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime: Duration,
}

impl From<&JwtConfig> for TokenService {
    fn from(cfg: &JwtConfig) -> Self {
        Self::new(cfg.secret.as_bytes(), Duration::from_secs(cfg.ttl_seconds))
    }
}

impl TokenService {
    pub fn new(secret: &[u8], lifetime: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            lifetime,
        }
    }

    pub fn issue(&self, claims: UserClaims) -> Result<(TokenPayload, String), TokenError> {
        self.issue_at(claims, OffsetDateTime::now_utc())
    }

    fn issue_at(
        &self,
        claims: UserClaims,
        now: OffsetDateTime,
    ) -> Result<(TokenPayload, String), TokenError> {
        let exp = i64::try_from(self.lifetime.as_secs())
            .ok()
            .and_then(|secs| now.checked_add(TimeDuration::seconds(secs)))
            .ok_or_else(|| {
                error!(lifetime = ?self.lifetime, "token expiry out of range");
                TokenError::LifetimeOutOfRange(self.lifetime)
            })?;
        let payload = TokenPayload {
            user: claims,
            exp: exp.unix_timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &payload, &self.encoding).map_err(|e| {
            error!(error = %e, "jwt encode failed");
            TokenError::from(e)
        })?;
        debug!(user_id = payload.user.id, exp = payload.exp, "jwt signed");
        Ok((payload, token))
    }

    /// Verifies signature and structure only; expiry is left to [`Self::is_valid`].
    pub fn decode(&self, token: &str) -> Result<TokenPayload, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        let data = decode::<TokenPayload>(token, &self.decoding, &validation).map_err(|e| {
            debug!(error = %e, "jwt rejected");
            TokenError::InvalidToken
        })?;
        Ok(data.claims)
    }

    pub fn is_valid(&self, token: &str) -> bool {
        match self.decode(token) {
            Ok(payload) => OffsetDateTime::now_utc().unix_timestamp() < payload.exp,
            Err(_) => false,
        }
    }
}

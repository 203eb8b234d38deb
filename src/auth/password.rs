use argon2::{
    password_hash::{PasswordHasher, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Fresh 16-byte salt from the OS RNG, B64 encoded.
pub fn generate_salt() -> String {
    SaltString::generate(&mut OsRng).as_str().to_owned()
}

/// Argon2id hash of `plain` under `salt`, as a PHC string.
///
/// Same inputs always give the same output, so the result can be compared
/// against the stored hash with [`hashes_equal`].
pub fn derive_hash(plain: &str, salt: &str) -> Result<String, CredentialError> {
    if plain.is_empty() {
        return Err(CredentialError::InvalidArgument(
            "password must not be empty".into(),
        ));
    }
    if salt.is_empty() {
        return Err(CredentialError::InvalidArgument(
            "salt must not be empty".into(),
        ));
    }

    let salt = SaltString::from_b64(salt)
        .map_err(|e| CredentialError::InvalidArgument(format!("malformed salt: {e}")))?;

    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            CredentialError::InvalidArgument(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn hashes_equal(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

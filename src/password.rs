use crate::config::AuthConfig;
use crate::error::AppResult;

/// Hash a plaintext password for `users.password_hash` at the configured cost.
pub fn hash_password(plaintext: &str, auth: &AuthConfig) -> AppResult<String> {
    Ok(bcrypt::hash(plaintext, auth.bcrypt_cost)?)
}

/// Constant-time check via bcrypt. A malformed hash never verifies.
pub fn verify_password(plaintext: &str, hash: &str) -> bool {
    bcrypt::verify(plaintext, hash).unwrap_or(false)
}

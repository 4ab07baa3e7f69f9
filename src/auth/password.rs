use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use tracing::error;

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// Check a password against a stored hash. New accounts carry argon2 PHC
/// strings; accounts migrated from the legacy system still hold bare
/// hex-encoded SHA-256 digests, which we keep verifying.
pub fn verify_password(plain: &str, stored: &str) -> anyhow::Result<bool> {
    if let Ok(parsed) = PasswordHash::new(stored) {
        return Ok(Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok());
    }
    if is_legacy_digest(stored) {
        return Ok(legacy_digest(plain) == stored.to_ascii_lowercase());
    }
    error!("unrecognized password hash format");
    anyhow::bail!("unrecognized password hash format")
}

pub fn legacy_digest(plain: &str) -> String {
    format!("{:x}", Sha256::digest(plain.as_bytes()))
}

fn is_legacy_digest(stored: &str) -> bool {
    stored.len() == 64 && stored.bytes().all(|b| b.is_ascii_hexdigit())
}

// Password hashing using Argon2id
// Decision: Use Argon2id as it's the recommended algorithm for password hashing
// Decision: Use default parameters which are secure for most use cases
// Decision: A stored hash that cannot be parsed is a non-match, not an error

use anyhow::Result;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use shopverse_core::CredentialVerifier;

/// Hash a password using Argon2id
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;

    Ok(hash.to_string())
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| anyhow::anyhow!("Failed to parse password hash: {}", e))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// CredentialVerifier backed by Argon2 PHC strings
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Verifier;

#[async_trait]
impl CredentialVerifier for Argon2Verifier {
    async fn matches(&self, plaintext: &str, stored_hash: &str) -> shopverse_core::Result<bool> {
        let plaintext = plaintext.to_string();
        let stored_hash = stored_hash.to_string();

        // Argon2 is CPU-bound; keep it off the request executor
        let outcome = tokio::task::spawn_blocking(move || verify_password(&plaintext, &stored_hash))
            .await
            .map_err(|e| anyhow::anyhow!("Password verification task failed: {}", e))?;

        match outcome {
            Ok(matched) => Ok(matched),
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash is unusable");
                Ok(false)
            }
        }
    }
}

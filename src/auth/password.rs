use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("Password hashing failed: {0}")]
pub struct PasswordError(String);

/// Hash a password with Argon2id and a random salt.
///
/// Argon2 is CPU-bound, so the work runs on the blocking pool.
pub async fn hash_password(password: &str) -> Result<String, PasswordError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || hash_blocking(&password))
        .await
        .map_err(|e| PasswordError(format!("hashing task failed: {}", e)))?
}

/// False for a wrong password or an unparseable stored hash
pub async fn verify_password(password: &str, password_hash: &str) -> bool {
    let password = password.to_owned();
    let password_hash = password_hash.to_owned();
    match tokio::task::spawn_blocking(move || verify_blocking(&password, &password_hash)).await {
        Ok(verified) => verified,
        Err(e) => {
            tracing::error!("Password verification task failed: {}", e);
            false
        }
    }
}

fn hash_blocking(password: &str) -> Result<String, PasswordError> {
    use argon2::password_hash::rand_core::OsRng;
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError(e.to_string()))
}

fn verify_blocking(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(e) => {
            tracing::warn!("Stored password hash could not be parsed: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_verifies_only_the_same_password() {
        let hash = hash_password("Secret123").await.unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("Secret123", &hash).await);
        assert!(!verify_password("secret123", &hash).await);
    }

    #[tokio::test]
    async fn garbage_hash_never_verifies() {
        assert!(!verify_password("Secret123", "not-a-hash").await);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn hashing_leaves_the_runtime_free() {
        // A single-threaded runtime still makes progress on other tasks while hashing.
        let ticker = tokio::spawn(async { 7 });
        let hash = hash_password("Secret123").await.unwrap();
        assert_eq!(ticker.await.unwrap(), 7);
        assert!(verify_password("Secret123", &hash).await);
    }
}

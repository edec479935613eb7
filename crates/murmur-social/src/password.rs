//! Password hashing with argon2id

use crate::SocialError;
use argon2::Argon2;
use murmur_domain::User;
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use std::sync::OnceLock;
use tracing::warn;

/// Verified against when a login names no account
static DECOY_HASH: OnceLock<Option<String>> = OnceLock::new();

fn decoy_hash() -> Option<&'static str> {
    DECOY_HASH
        .get_or_init(|| hash_password("murmur decoy password").ok())
        .as_deref()
}

/// Hash a plain password with argon2id
pub fn hash_password(password: &str) -> Result<String, SocialError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| SocialError::Internal(format!("Failed to hash password: {}", e)))
}

/// Verify a password against an argon2id hash
///
/// A malformed stored hash verifies as false.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Finish a login given the stored credentials for `username`, if any
///
/// An unknown username still costs one argon2 verification, against a decoy
/// hash, so it takes as long to reject as a wrong password.
pub fn check_login(
    username: &str,
    password: &str,
    credentials: Option<(User, String)>,
) -> Result<User, SocialError> {
    let verified = match credentials {
        Some((user, hash)) => verify_password(password, &hash).then_some(user),
        None => {
            if let Some(decoy) = decoy_hash() {
                let _ = verify_password(password, decoy);
            }
            None
        }
    };

    verified.ok_or_else(|| {
        warn!(username = %username, "rejected login");
        SocialError::InvalidCredentials
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use murmur_domain::UserId;

    fn alice() -> User {
        User {
            id: UserId::new(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            bio: String::new(),
            is_staff: false,
            created_at: 0,
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
    }

    #[test]
    fn test_salted() {
        assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
    }

    #[test]
    fn test_garbage_hash() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn test_decoy_is_a_real_hash() {
        let decoy = decoy_hash().unwrap();
        assert!(PasswordHash::new(decoy).is_ok());
        assert!(!verify_password("murmur", decoy));
    }

    #[test]
    fn test_check_login() {
        let hash = hash_password("s3cret-pass").unwrap();
        let user = alice();

        let ok = check_login("alice", "s3cret-pass", Some((user.clone(), hash.clone())));
        assert_eq!(ok.unwrap(), user);

        let wrong = check_login("alice", "nope", Some((user, hash)));
        assert!(matches!(wrong, Err(SocialError::InvalidCredentials)));

        let unknown = check_login("nobody", "s3cret-pass", None);
        assert!(matches!(unknown, Err(SocialError::InvalidCredentials)));
    }
}

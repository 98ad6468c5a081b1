use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha2::{Digest, Sha256};
use tracing::error;

/// bcrypt work factor for every stored hash.
pub const BCRYPT_COST: u32 = 12;

/// bcrypt only reads the first 72 bytes of its input, so every byte of the
/// password goes through SHA-256 first. The base64 digest is 44 bytes.
fn prehash(plain: &str) -> String {
    STANDARD.encode(Sha256::digest(plain.as_bytes()))
}

pub fn hash_password(plain: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(prehash(plain), BCRYPT_COST).map_err(|e| {
        error!(error = %e, "bcrypt hash error");
        e
    })
}

/// Constant-time check of `plain` against a stored bcrypt hash.
///
/// `Ok(false)` means the password does not match; `Err` means the stored hash
/// itself is unusable.
pub fn verify_password(plain: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    bcrypt::verify(prehash(plain), hash).map_err(|e| {
        error!(error = %e, "bcrypt parse hash error");
        e
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let password = "Secur3P@ssw0rd!";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(hash.starts_with("$2b$12$"));
        assert!(verify_password(password, &hash).expect("verify should succeed"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let password = "correct-horse-battery-staple1";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(!verify_password("correct-horse-battery-staple2", &hash).expect("verify should not error"));
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("same-password1").unwrap();
        let b = hash_password("same-password1").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn bytes_past_72_still_count() {
        let long = format!("{}1{}", "a".repeat(80), "b".repeat(19));
        let mut changed = long.clone();
        changed.replace_range(99.., "c");
        let hash = hash_password(&long).unwrap();
        assert!(verify_password(&long, &hash).unwrap());
        assert!(!verify_password(&changed, &hash).unwrap());
    }

    #[test]
    fn prehash_is_fixed_length() {
        assert_eq!(prehash("x").len(), 44);
        assert_eq!(prehash(&"é".repeat(128)).len(), 44);
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = verify_password("anything", "not-a-valid-hash").unwrap_err();
        assert!(!err.to_string().is_empty());
    }
}

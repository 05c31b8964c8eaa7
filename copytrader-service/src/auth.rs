//! Stored-hash credential helpers
//!
//! Copytraders authenticate with a password verified against a stored
//! PBKDF2-SHA256 hash. The stored format is `<salt-hex>$<hash-hex>`.
//! Admins never go through this path; they use managed sessions.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use uuid::Uuid;

/// PBKDF2 iteration count
const ITERATIONS: u32 = 100_000;

/// Derived key length in bytes
const KEY_LEN: usize = 32;

/// Hash a password with a fresh random salt
pub fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().into_bytes();
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, ITERATIONS, &mut key);
    format!("{}${}", hex::encode(salt), hex::encode(key))
}

/// Verify a password against a stored `<salt-hex>$<hash-hex>` value
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, hash_hex)) = stored.split_once('$') else {
        return false;
    };
    let Ok(salt) = hex::decode(salt_hex) else {
        return false;
    };
    let Ok(expected) = hex::decode(hash_hex) else {
        return false;
    };
    if expected.len() != KEY_LEN {
        return false;
    }

    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, ITERATIONS, &mut key);
    key[..] == expected[..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let stored = hash_password("hunter2");
        assert!(verify_password("hunter2", &stored));
        assert!(!verify_password("hunter3", &stored));
    }

    #[test]
    fn verify_rejects_malformed_stored_values() {
        assert!(!verify_password("hunter2", "not-a-hash"));
        assert!(!verify_password("hunter2", "abc$zzzz"));
    }

    #[test]
    fn salts_are_unique() {
        assert_ne!(hash_password("same"), hash_password("same"));
    }
}

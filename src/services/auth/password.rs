//! Password hashing compatible with the hashes already stored by the plant systems:
//! `base64(sha256(password || salt))` with a random UUID string as salt.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};
use uuid::Uuid;

pub fn generate_salt() -> String {
    Uuid::new_v4().to_string()
}

pub fn hash(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(salt.as_bytes());
    STANDARD.encode(hasher.finalize())
}

pub fn verify(password: &str, salt: &str, stored_hash: &str) -> bool {
    constant_time_eq(hash(password, salt).as_bytes(), stored_hash.as_bytes())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_sha256_of_password_then_salt() {
        // sha256("abc")
        assert_eq!(hash("ab", "c"), "ungWv48Bz+pBQUDeXa4iI7ADYaOWF3qctBD/YfIAFa0=");
        assert_eq!(
            hash("Admin123!", "3f2b9c2e-5d1a-4b7e-9f5e-2a4c8d6e1b0a"),
            "bn3RJHZAkh/SiE5gS7LxBnR9j8LioacZ8T2fsZ2PJDE="
        );
    }

    #[test]
    fn verify_accepts_only_the_right_password() {
        let salt = generate_salt();
        let stored = hash("Proveedor123!", &salt);

        assert!(verify("Proveedor123!", &salt, &stored));
        assert!(!verify("proveedor123!", &salt, &stored));
        assert!(!verify("Proveedor123!", &generate_salt(), &stored));
    }
}

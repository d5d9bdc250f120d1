use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

pub const DEFAULT_HASH_ROUNDS: u32 = 100_000;
/// Upper bound on rounds, applied to records read back from disk.
pub const MAX_HASH_ROUNDS: u32 = 1_000_000;
const SALT_LEN: usize = 16;
const KEY_LEN: usize = 32;

fn default_rounds() -> u32 {
    DEFAULT_HASH_ROUNDS
}

/// Salted PBKDF2-HMAC-SHA256 digest of a password, hex encoded for storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordRecord {
    pub salt: String,
    pub hash: String,
    #[serde(default = "default_rounds")]
    pub rounds: u32,
}

impl PasswordRecord {
    /// Hashes `password` under a fresh random salt.
    pub fn derive(password: &str, rounds: u32) -> Self {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        let rounds = clamp_rounds(rounds);
        Self {
            salt: hex::encode(salt),
            hash: hex::encode(derive_key(password, &salt, rounds)),
            rounds,
        }
    }

    pub fn verify(&self, password: &str) -> bool {
        let (Ok(salt), Ok(expected)) = (hex::decode(&self.salt), hex::decode(&self.hash)) else {
            return false;
        };
        let actual = derive_key(password, &salt, clamp_rounds(self.rounds));
        constant_time_eq(&actual, &expected)
    }
}

fn clamp_rounds(rounds: u32) -> u32 {
    rounds.clamp(1, MAX_HASH_ROUNDS)
}

fn derive_key(password: &str, salt: &[u8], rounds: u32) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, rounds, &mut key);
    key
}

fn constant_time_eq(lhs: &[u8], rhs: &[u8]) -> bool {
    lhs.len() == rhs.len()
        && lhs
            .iter()
            .zip(rhs)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_verifies_only_the_hashed_password() {
        let record = PasswordRecord::derive("pw1", 16);
        assert!(record.verify("pw1"));
        assert!(!record.verify("pw2"));
        assert!(!record.verify(""));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let first = PasswordRecord::derive("secret", 16);
        let second = PasswordRecord::derive("secret", 16);
        assert_ne!(first.salt, second.salt);
        assert_ne!(first.hash, second.hash);
        assert!(!first.hash.contains("secret"));
    }

    #[test]
    fn stored_rounds_are_bounded() {
        assert_eq!(clamp_rounds(u32::MAX), MAX_HASH_ROUNDS);
        assert_eq!(clamp_rounds(0), 1);
        assert_eq!(clamp_rounds(DEFAULT_HASH_ROUNDS), DEFAULT_HASH_ROUNDS);
        assert_eq!(PasswordRecord::derive("pw", 0).rounds, 1);
    }

    #[test]
    fn corrupt_record_never_verifies() {
        let record = PasswordRecord {
            salt: "not-hex".into(),
            hash: "zz".into(),
            rounds: 16,
        };
        assert!(!record.verify("anything"));
    }
}

//! # Recipient Identity Hashing
//!
//! When email hashing is enabled the recipient identity is stored as
//! `sha256$<hex>` where the digest covers `identity || salt`. The salt is
//! 16 bytes from the OS RNG rendered in base62 and stored next to the hash
//! so a holder can prove ownership of the identity.

use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};

/// Prefix of every salted identity hash.
pub const SALTED_HASH_PREFIX: &str = "sha256$";

const BASE62: &[u8; 62] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Hash `identity` with `salt` into the `sha256$<hex>` form.
pub fn hash_and_salt_identity(identity: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(identity.as_bytes());
    hasher.update(salt.as_bytes());
    let hex: String = hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect();
    format!("{SALTED_HASH_PREFIX}{hex}")
}

/// Recompute the salted hash and compare it with a stored value.
pub fn verify_salted_hash(identity: &str, salt: &str, stored: &str) -> bool {
    hash_and_salt_identity(identity, salt) == stored
}

/// Generate a fresh random salt: 16 OS-random bytes in base62.
pub fn generate_salt() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    base62_encode(u128::from_be_bytes(bytes))
}

/// Encode a non-negative integer with the base62 alphabet `0-9a-zA-Z`.
pub fn base62_encode(mut num: u128) -> String {
    if num == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while num > 0 {
        digits.push(BASE62[(num % 62) as usize]);
        num /= 62;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

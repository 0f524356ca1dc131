//! Name verification.
//!
//! A client proves ownership of its name with `md5(salt + name)` as lowercase
//! hex, where the salt is the one this server sends in its heartbeat.

use md5::{Digest, Md5};
use rand::distributions::Alphanumeric;
use rand::Rng;

/// Length of a generated salt (base62 characters).
pub const SALT_LENGTH: usize = 16;

/// Longest accepted player name.
pub const MAX_NAME_LENGTH: usize = 16;

/// A fresh random base62 salt.
pub fn generate_salt() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SALT_LENGTH)
        .map(char::from)
        .collect()
}

/// The key a client must present for `name`.
pub fn verification_key(salt: &str, name: &str) -> String {
    let digest = Md5::digest(format!("{salt}{name}").as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Check a client-supplied verification key.
pub fn verify(salt: &str, name: &str, key: &str) -> bool {
    verification_key(salt, name).eq_ignore_ascii_case(key.trim())
}

/// 1–16 characters of `[A-Za-z0-9_]`.
pub fn is_valid_name(name: &str) -> bool {
    (1..=MAX_NAME_LENGTH).contains(&name.len())
        && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

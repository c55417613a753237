//! Salted password hashing for local credentials.
//!
//! Output format is `v1:` followed by the standard-base64 concatenation of a
//! 16-byte random salt and the 32-byte PBKDF2-HMAC-SHA256 key. Verification
//! fails closed: malformed input is reported as a mismatch, never a panic.
//! Plaintext passwords are never logged.

use base64ct::{Base64, Encoding};
use pbkdf2::pbkdf2_hmac;
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::Error;

const VERSION_PREFIX: &str = "v1:";
const SALT_LEN: usize = 16;
const KEY_LEN: usize = 32;
const PBKDF2_ROUNDS: u32 = 100_000;

/// Hash a plaintext password with a fresh random salt.
///
/// # Errors
///
/// Returns [`Error::Hash`] if the system random source fails.
pub fn hash(plaintext: &str) -> Result<String, Error> {
    let mut salt = [0u8; SALT_LEN];
    OsRng.try_fill_bytes(&mut salt).map_err(|_| Error::Hash)?;

    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(plaintext.as_bytes(), &salt, PBKDF2_ROUNDS, &mut key);

    let mut packed = [0u8; SALT_LEN + KEY_LEN];
    packed[..SALT_LEN].copy_from_slice(&salt);
    packed[SALT_LEN..].copy_from_slice(&key);

    Ok(format!("{VERSION_PREFIX}{}", Base64::encode_string(&packed)))
}

/// Check a plaintext password against a stored hash.
///
/// Returns `false` for an empty hash, a wrong version prefix, malformed
/// base64, or a wrong decoded length. Well-formed hashes are compared in
/// constant time.
#[must_use]
pub fn verify(plaintext: &str, stored: &str) -> bool {
    let Some(encoded) = stored.strip_prefix(VERSION_PREFIX) else {
        return false;
    };
    let Ok(packed) = Base64::decode_vec(encoded) else {
        return false;
    };
    if packed.len() != SALT_LEN + KEY_LEN {
        return false;
    }

    let (salt, expected) = packed.split_at(SALT_LEN);
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(plaintext.as_bytes(), salt, PBKDF2_ROUNDS, &mut key);

    bool::from(key[..].ct_eq(expected))
}

//! Token key generation

use rand::RngCore;
use sha2::{Digest, Sha512};

/// Generate an opaque token key: SHA-512 over 64 random bytes, hex encoded
/// (128 characters).
pub fn generate_token() -> String {
    let mut bytes = [0u8; 64];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(Sha512::digest(bytes))
}

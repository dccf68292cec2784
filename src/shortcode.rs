//! Shortcode generation
//!
//! Codes are 7 characters drawn from a 64-symbol URL-safe alphabet, giving
//! 64^7 (about 4.4 * 10^12) possible codes. Collisions are rare but possible,
//! so callers must still rely on the store's uniqueness check.

use rand::Rng;

/// Length of every generated shortcode
pub const CODE_LENGTH: usize = 7;

/// URL-safe alphabet (same symbol set as base64url)
const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

/// Generates a random candidate shortcode
pub fn generate() -> String {
    let mut rng = rand::rng();

    (0..CODE_LENGTH)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Returns true if `code` has the shape of a generated shortcode
///
/// Used to turn obviously malformed codes into a 404 without touching the store.
pub fn is_valid(code: &str) -> bool {
    code.len() == CODE_LENGTH && code.bytes().all(|b| ALPHABET.contains(&b))
}

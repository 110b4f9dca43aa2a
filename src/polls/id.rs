//! Poll identifiers
//!
//! Ten symbols from a 64-symbol URL-safe alphabet, roughly 60 bits of
//! randomness. Every generated ID matches the command parser's identifier
//! charset.

use rand::Rng;

const ALPHABET: &[u8; 64] = b"_-0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Default poll ID length
pub const POLL_ID_LEN: usize = 10;

/// Generate a random poll ID
pub fn generate_poll_id() -> String {
    generate_with(&mut rand::thread_rng(), POLL_ID_LEN)
}

pub(crate) fn generate_with<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

//! Canonical text encoding for public keys.
//!
//! Keys are rendered as lowercase RFC 4648 base32 without padding. Every
//! 32-byte key has exactly one accepted string: decoding re-encodes and
//! rejects anything that is not byte-for-byte the canonical form (upper case,
//! padding, non-zero trailing bits).

use base32::Alphabet;

use crate::error::{Error, Result};

/// Characters that can appear in a canonical key string.
pub const ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz234567";

const CODEC: Alphabet = Alphabet::RFC4648 { padding: false };

/// Number of base32 characters needed for `bytes` input bytes.
pub const fn encoded_len(bytes: usize) -> usize {
    (bytes * 8 + 4) / 5
}

/// Number of leading input bytes that fully determine the first `chars`
/// characters of the encoding.
pub const fn bytes_for_chars(chars: usize) -> usize {
    (chars * 5 + 7) / 8
}

/// Encode bytes as canonical lowercase base32.
pub fn to_base32(bytes: &[u8]) -> String {
    base32::encode(CODEC, bytes).to_ascii_lowercase()
}

/// Decode a canonical lowercase base32 string.
pub fn from_base32(text: &str) -> Result<Vec<u8>> {
    if let Some(bad) = text.chars().find(|c| !is_alphabet_char(*c)) {
        return Err(Error::Decoding(format!("invalid base32 character {:?}", bad)));
    }

    let bytes = base32::decode(CODEC, &text.to_ascii_uppercase())
        .ok_or_else(|| Error::Decoding("invalid base32 string".into()))?;

    if to_base32(&bytes) != text {
        return Err(Error::Decoding("non-canonical base32 string".into()));
    }

    Ok(bytes)
}

/// Whether `c` belongs to the canonical alphabet.
pub fn is_alphabet_char(c: char) -> bool {
    matches!(c, 'a'..='z' | '2'..='7')
}

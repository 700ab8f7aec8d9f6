//! Base32 secret key codec (RFC 4648 alphabet `A-Z2-7`).
//!
//! Secret keys arrive as user-typed or QR-scanned text and are frequently
//! grouped with spaces or dashes, lower-cased, or stripped of padding.
//! `decode` normalizes all of that before validating, so callers never
//! deal with padding themselves.

use data_encoding::BASE32_NOPAD;

use crate::error::{Result, VaultError};

/// Decode a Base32 secret key into raw bytes.
///
/// Sanitizes first (whitespace and dashes stripped, uppercased, `=` padding
/// removed), then validates against the RFC 4648 alphabet. Secrets that
/// decode to fewer than `min_bytes` are rejected: real services issue keys
/// of 10 bytes or more, and anything shorter is almost certainly a typo.
pub fn decode(text: &str, min_bytes: usize) -> Result<Vec<u8>> {
    let cleaned = sanitize(text);

    if cleaned.is_empty() {
        return Err(VaultError::InvalidSecretFormat(
            "secret key is empty".into(),
        ));
    }

    if let Some(bad) = cleaned
        .chars()
        .find(|c| !matches!(c, 'A'..='Z' | '2'..='7'))
    {
        return Err(VaultError::InvalidSecretFormat(format!(
            "character '{}' is not valid Base32",
            bad
        )));
    }

    let bytes = BASE32_NOPAD
        .decode(cleaned.as_bytes())
        .map_err(|_| VaultError::InvalidSecretFormat("not a valid Base32 string".into()))?;

    if bytes.len() < min_bytes {
        return Err(VaultError::InvalidSecretFormat(format!(
            "secret too short: decodes to {} bytes, minimum is {}",
            bytes.len(),
            min_bytes
        )));
    }

    Ok(bytes)
}

/// Encode raw bytes as uppercase, unpadded Base32.
pub fn encode(bytes: &[u8]) -> String {
    BASE32_NOPAD.encode(bytes)
}

/// Strip whitespace, dashes, and padding; uppercase the rest.
fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '=')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

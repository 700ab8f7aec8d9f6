//! TOTP code derivation: RFC 6238 over the RFC 4226 HOTP core.
//!
//! Pure computation: no clock access, no caching, no shared state. Callers
//! pass the current unix time explicitly, which keeps every function
//! deterministic and lets a UI recompute its countdown each tick instead of
//! decrementing a stored value (decrementing drifts; recomputing cannot).

use hmac::{Hmac, Mac};
use serde::Serialize;
use sha1::Sha1;
use subtle::ConstantTimeEq;

use crate::error::{Result, VaultError};

/// Time step in seconds (RFC 6238 default, used by every major service).
pub const PERIOD: u64 = 30;

/// Code length in digits.
pub const DIGITS: u32 = 6;

/// A derived code plus the seconds left before it rotates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TotpCode {
    /// Zero-padded 6-digit code, e.g. "007081".
    pub code: String,
    /// Seconds until the next rotation, always in `[1, PERIOD]`.
    pub seconds_remaining: u64,
}

/// Derive the TOTP code for `secret` at `unix_seconds`.
///
/// Identical `(secret, unix_seconds)` always yields identical output;
/// that determinism is what makes the code match any other RFC 6238
/// client sharing the same secret and clock.
pub fn code_at(secret: &[u8], unix_seconds: u64) -> Result<TotpCode> {
    if secret.is_empty() {
        return Err(VaultError::InvalidSecretLength);
    }

    let step = unix_seconds / PERIOD;
    let code = hotp(secret, step);

    Ok(TotpCode {
        code,
        seconds_remaining: seconds_remaining_at(unix_seconds),
    })
}

/// Seconds left in the current 30-second window. Never 0: at an exact step
/// boundary a fresh code has the full period ahead of it.
pub fn seconds_remaining_at(unix_seconds: u64) -> u64 {
    PERIOD - (unix_seconds % PERIOD)
}

/// Fraction of the current window already elapsed (0.0 fresh, ~1.0 about
/// to expire). Drives progress bars.
pub fn progress_at(unix_seconds: u64) -> f64 {
    (unix_seconds % PERIOD) as f64 / PERIOD as f64
}

/// Check a user-submitted code against the secret, accepting codes from up
/// to `drift_steps` time steps on either side of the current one.
///
/// Comparison is constant-time so verification leaks nothing about how
/// close a guess was.
pub fn verify_at(secret: &[u8], code: &str, drift_steps: u64, unix_seconds: u64) -> Result<bool> {
    if secret.is_empty() {
        return Err(VaultError::InvalidSecretLength);
    }
    if code.len() != DIGITS as usize || !code.chars().all(|c| c.is_ascii_digit()) {
        return Ok(false);
    }

    let current = unix_seconds / PERIOD;
    let start = current.saturating_sub(drift_steps);
    let end = current + drift_steps;

    let mut matched = false;
    for step in start..=end {
        let candidate = hotp(secret, step);
        matched |= bool::from(candidate.as_bytes().ct_eq(code.as_bytes()));
    }
    Ok(matched)
}

/// Format a code for display with a mid-point space, e.g. "123 456".
pub fn format_code_display(code: &str) -> String {
    if code.len() <= 4 {
        return code.to_string();
    }
    let mid = code.len() / 2;
    format!("{} {}", &code[..mid], &code[mid..])
}

/// HOTP core (RFC 4226 §5.3): HMAC-SHA1 over the big-endian counter,
/// dynamic truncation, reduce mod 10^6.
fn hotp(secret: &[u8], counter: u64) -> String {
    let mut mac = Hmac::<Sha1>::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    let offset = (digest[digest.len() - 1] & 0x0f) as usize;
    let binary = ((digest[offset] as u32 & 0x7f) << 24)
        | ((digest[offset + 1] as u32) << 16)
        | ((digest[offset + 2] as u32) << 8)
        | (digest[offset + 3] as u32);
    let code = binary % 10u32.pow(DIGITS);

    format!("{:0width$}", code, width = DIGITS as usize)
}

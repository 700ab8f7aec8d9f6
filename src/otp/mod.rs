//! Secret key encoding and TOTP code derivation.
//!
//! Everything in here is pure computation: Base32 text in, raw key bytes
//! out; key bytes and a timestamp in, a 6-digit code out. No storage, no
//! clocks, no shared state.

pub mod base32;
pub mod engine;
pub mod uri;

pub use engine::{code_at, format_code_display, progress_at, seconds_remaining_at, TotpCode};
pub use uri::ParsedAccount;

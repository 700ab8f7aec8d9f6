//! authvault - local TOTP credential vault.
//!
//! Stores two-factor account secrets encrypted at rest under a single
//! locally held master key, and derives RFC 6238 time-based codes from
//! them. The window/dialog layer, clipboard, tray, and hotkeys live
//! elsewhere; they consume [`VaultService`].
//!
//! Known limitation: the master key sits unprotected on disk next to the
//! database, matching the behavior this vault inherits. Wrapping it under
//! a user passphrase would change the on-disk format and is intentionally
//! not attempted here.

pub mod error;
pub mod otp;
pub mod security;
pub mod storage;
pub mod vault;

pub use error::{Result, VaultError};
pub use otp::TotpCode;
pub use storage::VaultConfig;
pub use vault::{AccountCodes, AccountInfo, CodeStatus, ExportedAccount, RevealedSecret, VaultService};

//! Error types for vault operations.
//!
//! The taxonomy distinguishes recoverable user-input errors
//! (`InvalidSecretFormat`, `AccountNotFound`) from environment faults
//! (`KeyStoreUnavailable`, `StorageUnavailable`) and data-integrity faults
//! (`DecryptionFailed`), so a frontend can decide between re-prompting,
//! retrying, and alerting the user.

use thiserror::Error;

/// Errors that can occur during vault operations.
#[derive(Error, Debug)]
pub enum VaultError {
    /// The supplied secret key text is not usable Base32.
    /// User should correct the input and try again.
    #[error("Invalid secret key: {0}")]
    InvalidSecretFormat(String),

    /// A decoded secret reached the TOTP engine empty. Unreachable when
    /// input validation is enforced upstream.
    #[error("Secret key is empty")]
    InvalidSecretLength,

    /// The master key file cannot be read, written, or has the wrong size.
    /// The key is never regenerated on such faults: a fresh key would make
    /// every stored ciphertext permanently undecryptable.
    #[error("Master key unavailable: {0}")]
    KeyStoreUnavailable(String),

    /// The account database cannot be opened, read, or written.
    #[error("Account storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Authenticated decryption failed: tampered row, corrupted storage,
    /// or a ciphertext produced under a different master key.
    #[error("Could not decrypt stored secret")]
    DecryptionFailed,

    /// No account row with the given id exists.
    #[error("Account {0} not found")]
    AccountNotFound(i64),
}

/// Result type alias for vault operations.
pub type Result<T> = std::result::Result<T, VaultError>;

impl From<rusqlite::Error> for VaultError {
    fn from(err: rusqlite::Error) -> Self {
        use rusqlite::ErrorCode;
        match err.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => {
                VaultError::StorageUnavailable(
                    "database is locked by another process".into(),
                )
            }
            _ => VaultError::StorageUnavailable(err.to_string()),
        }
    }
}

impl serde::Serialize for VaultError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        // Serialize as a structured object for better frontend handling
        let mut state = serializer.serialize_struct("VaultError", 2)?;

        // Error code for programmatic handling
        let code = match self {
            VaultError::InvalidSecretFormat(_) => "INVALID_SECRET_FORMAT",
            VaultError::InvalidSecretLength => "INVALID_SECRET_LENGTH",
            VaultError::KeyStoreUnavailable(_) => "KEY_STORE_UNAVAILABLE",
            VaultError::StorageUnavailable(_) => "STORAGE_UNAVAILABLE",
            VaultError::DecryptionFailed => "DECRYPTION_FAILED",
            VaultError::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
        };

        state.serialize_field("code", code)?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let err = VaultError::DecryptionFailed;
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("DECRYPTION_FAILED"));
        assert!(json.contains("Could not decrypt stored secret"));
    }

    #[test]
    fn test_busy_maps_to_locked_message() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        );
        let mapped: VaultError = err.into();
        assert!(matches!(mapped, VaultError::StorageUnavailable(ref m)
            if m.contains("locked by another process")));
    }
}

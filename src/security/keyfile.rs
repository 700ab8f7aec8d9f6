//! Master key management.
//!
//! A single 256-bit symmetric key encrypts every stored secret. It is
//! generated once from OS randomness on first run and persisted as a raw
//! 32-byte file next to the database. There is deliberately no passphrase
//! wrapping and no rotation path: every ciphertext in the store was
//! produced under this key, and replacing it would orphan them all. A key
//! file of the wrong size is therefore a hard fault, never a trigger to
//! regenerate.

use std::path::Path;

use aes_gcm::aead::{rand_core::RngCore, OsRng};
use tracing::{debug, info};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Result, VaultError};

/// Master key size in bytes (AES-256)
pub const KEY_SIZE: usize = 32;

/// A 256-bit master key with automatic zeroization on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey {
    key: [u8; KEY_SIZE],
}

impl MasterKey {
    /// Create a key from a 32-byte slice.
    ///
    /// # Panics
    /// Panics if the slice is not exactly 32 bytes.
    pub fn from_slice(slice: &[u8]) -> Self {
        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(slice);
        Self { key }
    }

    /// Get the key bytes for cryptographic operations.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never log the actual key material
        f.debug_struct("MasterKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Load the master key from `path`, generating and persisting a fresh one
/// if no file exists yet.
///
/// # Errors
/// `KeyStoreUnavailable` when the file cannot be read or written, or when
/// an existing file is not exactly [`KEY_SIZE`] bytes.
pub fn load_or_create_master_key(path: &Path) -> Result<MasterKey> {
    if path.exists() {
        let bytes = std::fs::read(path).map_err(|e| {
            VaultError::KeyStoreUnavailable(format!(
                "cannot read key file {}: {}",
                path.display(),
                e
            ))
        })?;

        if bytes.len() != KEY_SIZE {
            return Err(VaultError::KeyStoreUnavailable(format!(
                "key file {} has invalid size: expected {} bytes, got {}",
                path.display(),
                KEY_SIZE,
                bytes.len()
            )));
        }

        debug!("Loaded existing master key from {:?}", path);
        return Ok(MasterKey::from_slice(&bytes));
    }

    // First run: generate a fresh key from OS randomness
    let mut key = [0u8; KEY_SIZE];
    OsRng.fill_bytes(&mut key);

    std::fs::write(path, key).map_err(|e| {
        VaultError::KeyStoreUnavailable(format!(
            "cannot write key file {}: {}",
            path.display(),
            e
        ))
    })?;

    // Restrict permissions on Unix (the key is the sole long-term secret)
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let set_mode = std::fs::metadata(path).and_then(|m| {
            let mut perms = m.permissions();
            perms.set_mode(0o600);
            std::fs::set_permissions(path, perms)
        });
        set_mode.map_err(|e| {
            VaultError::KeyStoreUnavailable(format!(
                "cannot restrict permissions on {}: {}",
                path.display(),
                e
            ))
        })?;
    }

    info!("Generated new master key at {:?}", path);
    Ok(MasterKey::from_slice(&key))
}

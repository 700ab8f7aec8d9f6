//! Authenticated encryption for stored secrets using AES-256-GCM.
//!
//! Blob format: `[12-byte nonce][ciphertext with 16-byte auth tag]`.
//! A fresh random nonce is drawn for every encryption and embedded in the
//! blob, so decryption needs nothing but the key and the blob itself.

use aes_gcm::{
    aead::{rand_core::RngCore, Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use zeroize::Zeroizing;

use crate::error::{Result, VaultError};
use crate::security::keyfile::MasterKey;

/// Nonce size for AES-GCM (96 bits = 12 bytes)
const NONCE_SIZE: usize = 12;

/// Encrypt a secret under the master key.
pub fn encrypt(plaintext: &[u8], key: &MasterKey) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::KeyStoreUnavailable(format!("invalid key: {}", e)))?;

    // Generate random nonce
    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    // GCM encryption only fails on absurd plaintext lengths; secrets here
    // are tens of bytes
    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| VaultError::StorageUnavailable(format!("encryption failed: {}", e)))?;

    // Prepend nonce to ciphertext
    let mut blob = nonce_bytes.to_vec();
    blob.extend(ciphertext);
    Ok(blob)
}

/// Decrypt a blob produced by [`encrypt`].
///
/// Any authentication failure (tampered data, wrong key, corrupted
/// storage) yields `DecryptionFailed`. Garbage plaintext is never
/// returned. The plaintext buffer zeroizes when dropped.
pub fn decrypt(blob: &[u8], key: &MasterKey) -> Result<Zeroizing<Vec<u8>>> {
    if blob.len() < NONCE_SIZE {
        return Err(VaultError::DecryptionFailed);
    }

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::KeyStoreUnavailable(format!("invalid key: {}", e)))?;

    let (nonce_bytes, ciphertext) = blob.split_at(NONCE_SIZE);
    let nonce = Nonce::from_slice(nonce_bytes);

    let plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| VaultError::DecryptionFailed)?;

    Ok(Zeroizing::new(plaintext))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> MasterKey {
        MasterKey::from_slice(&[7u8; 32])
    }

    #[test]
    fn test_roundtrip() {
        let key = test_key();
        let blob = encrypt(b"super secret totp key", &key).unwrap();
        let plain = decrypt(&blob, &key).unwrap();
        assert_eq!(plain.as_slice(), b"super secret totp key");
    }

    #[test]
    fn test_nonce_freshness() {
        let key = test_key();
        let a = encrypt(b"same input", &key).unwrap();
        let b = encrypt(b"same input", &key).unwrap();
        assert_ne!(a, b, "two encryptions must never share a nonce");
    }

    #[test]
    fn test_tampering_detected() {
        let key = test_key();
        let blob = encrypt(b"payload", &key).unwrap();

        // Flip one byte at every position; authentication must always fail
        for i in 0..blob.len() {
            let mut tampered = blob.clone();
            tampered[i] ^= 0x01;
            assert!(
                matches!(decrypt(&tampered, &key), Err(VaultError::DecryptionFailed)),
                "tampering at byte {} went undetected",
                i
            );
        }
    }

    #[test]
    fn test_wrong_key_fails() {
        let blob = encrypt(b"payload", &test_key()).unwrap();
        let other = MasterKey::from_slice(&[8u8; 32]);
        assert!(matches!(
            decrypt(&blob, &other),
            Err(VaultError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_truncated_blob_fails() {
        let key = test_key();
        assert!(matches!(
            decrypt(&[0u8; 5], &key),
            Err(VaultError::DecryptionFailed)
        ));
        assert!(matches!(
            decrypt(&[], &key),
            Err(VaultError::DecryptionFailed)
        ));
    }
}

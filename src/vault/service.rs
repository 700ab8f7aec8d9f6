//! VaultService - the façade external collaborators talk to.
//!
//! Owns the master key and the account store, and orchestrates the two
//! data paths:
//! - intake: Base32 decode → encrypt → insert (all-or-nothing)
//! - display: list → decrypt → derive code, with per-account failure
//!   isolation so one corrupted row never blanks the whole list
//!
//! Decrypted secrets live in zeroizing buffers for the duration of a
//! single computation and are never logged. There are no automatic
//! retries: every failure is either bad input or an environment fault,
//! and both belong to the caller.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Result, VaultError};
use crate::otp::engine::{self, TotpCode};
use crate::otp::{base32, uri};
use crate::security::cipher;
use crate::security::keyfile::{load_or_create_master_key, MasterKey};
use crate::storage::accounts::{CredentialStore, StoredAccount};
use crate::storage::config::VaultConfig;

/// Account metadata, safe to display and serialize.
#[derive(Debug, Clone, Serialize)]
pub struct AccountInfo {
    pub id: i64,
    pub name: String,
    pub issuer: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Outcome of deriving one account's code during a listing.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CodeStatus {
    Ready { code: String, seconds_remaining: u64 },
    Failed { error: VaultError },
}

/// One listing entry: account metadata plus its code (or failure).
#[derive(Debug, Serialize)]
pub struct AccountCodes {
    pub id: i64,
    pub name: String,
    pub issuer: Option<String>,
    pub created_at: DateTime<Utc>,
    pub code: CodeStatus,
}

/// A decrypted secret returned by an explicit reveal.
#[derive(Clone, Serialize)]
pub struct RevealedSecret {
    /// Normalized Base32 text of the stored secret.
    pub base32: String,
    /// Manual-entry URI for re-import into any authenticator.
    pub otpauth_uri: String,
}

impl std::fmt::Debug for RevealedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Revealed secrets must not leak through debug logging
        f.debug_struct("RevealedSecret")
            .field("base32", &"[REDACTED]")
            .field("otpauth_uri", &"[REDACTED]")
            .finish()
    }
}

/// Outcome of decrypting one account during an export.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SecretStatus {
    Revealed(RevealedSecret),
    Failed { error: VaultError },
}

/// One export entry.
#[derive(Debug, Serialize)]
pub struct ExportedAccount {
    pub id: i64,
    pub name: String,
    pub issuer: Option<String>,
    pub created_at: DateTime<Utc>,
    pub secret: SecretStatus,
}

/// The credential vault: encrypted secret storage plus code derivation.
pub struct VaultService {
    config: VaultConfig,
    key: MasterKey,
    store: CredentialStore,
}

impl VaultService {
    /// Open the vault described by `config`.
    ///
    /// Creates the data directory, loads (or on first run generates) the
    /// master key, and takes the exclusive database lock. A second
    /// process opening the same vault fails here with
    /// `StorageUnavailable`.
    pub fn open(config: VaultConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir).map_err(|e| {
            VaultError::StorageUnavailable(format!(
                "cannot create data directory {}: {}",
                config.data_dir.display(),
                e
            ))
        })?;

        let key = load_or_create_master_key(&config.key_path())?;
        let store = CredentialStore::open(&config.db_path())?;

        info!("Vault opened at {:?}", config.data_dir);
        Ok(Self { config, key, store })
    }

    /// Register a new account from Base32 secret text.
    ///
    /// Decode → encrypt → insert; if any step fails, nothing is stored.
    pub fn add_account(
        &self,
        name: &str,
        issuer: Option<&str>,
        secret_text: &str,
    ) -> Result<AccountInfo> {
        let secret = base32::decode(secret_text, self.config.min_secret_bytes)?;
        let blob = cipher::encrypt(&secret, &self.key)?;

        let id = self.store.insert(name, issuer, &blob)?;
        let row = self.store.get(id)?;

        info!("Added account {} ({})", id, name);
        Ok(account_info(&row))
    }

    /// Register a new account from an `otpauth://totp/` URI (QR payload).
    pub fn add_account_from_uri(&self, otpauth: &str) -> Result<AccountInfo> {
        let parsed = uri::parse(otpauth)?;
        self.add_account(&parsed.name, parsed.issuer.as_deref(), &parsed.secret)
    }

    /// List every account with its current code at `now` (unix seconds).
    ///
    /// A row that fails to decrypt is reported as `CodeStatus::Failed` in
    /// place; the remaining rows still produce codes.
    pub fn list_accounts_with_codes(&self, now: u64) -> Result<Vec<AccountCodes>> {
        let rows = self.store.list_all()?;
        debug!("Listing {} accounts", rows.len());

        Ok(rows
            .into_iter()
            .map(|row| {
                let code = match self.derive_code(&row, now) {
                    Ok(totp) => CodeStatus::Ready {
                        code: totp.code,
                        seconds_remaining: totp.seconds_remaining,
                    },
                    Err(error) => {
                        warn!("Account {} ({}): {}", row.id, row.name, error);
                        CodeStatus::Failed { error }
                    }
                };
                AccountCodes {
                    id: row.id,
                    name: row.name,
                    issuer: row.issuer,
                    created_at: row.created_at,
                    code,
                }
            })
            .collect())
    }

    /// Current code for a single account. This is the once-per-second
    /// refresh path: always recomputed from the clock, never decremented.
    pub fn current_code(&self, id: i64, now: u64) -> Result<TotpCode> {
        let row = self.store.get(id)?;
        self.derive_code(&row, now)
    }

    /// Decrypt one account's secret and return its Base32 text plus a
    /// manual-entry URI. Callers are expected to gate this behind an
    /// explicit user confirmation.
    pub fn reveal_secret(&self, id: i64) -> Result<RevealedSecret> {
        let row = self.store.get(id)?;
        let plain = cipher::decrypt(&row.secret, &self.key)?;
        info!("Revealed secret for account {}", id);
        Ok(revealed(&row, &plain))
    }

    /// Decrypt every account for backup/recovery. Per-row decrypt
    /// failures surface per-row, like the listing.
    pub fn export_accounts(&self) -> Result<Vec<ExportedAccount>> {
        let rows = self.store.list_all()?;
        info!("Exporting {} accounts", rows.len());

        Ok(rows
            .into_iter()
            .map(|row| {
                let secret = match cipher::decrypt(&row.secret, &self.key) {
                    Ok(plain) => SecretStatus::Revealed(revealed(&row, &plain)),
                    Err(error) => {
                        warn!("Account {} ({}): {}", row.id, row.name, error);
                        SecretStatus::Failed { error }
                    }
                };
                ExportedAccount {
                    id: row.id,
                    name: row.name,
                    issuer: row.issuer,
                    created_at: row.created_at,
                    secret,
                }
            })
            .collect())
    }

    /// Remove an account permanently. The row is gone for good; its id is
    /// never handed out again.
    pub fn delete_account(&self, id: i64) -> Result<()> {
        self.store.delete(id)?;
        info!("Deleted account {}", id);
        Ok(())
    }

    /// Number of registered accounts.
    pub fn account_count(&self) -> Result<usize> {
        self.store.count()
    }

    fn derive_code(&self, row: &StoredAccount, now: u64) -> Result<TotpCode> {
        let plain = cipher::decrypt(&row.secret, &self.key)?;
        engine::code_at(&plain, now)
    }
}

fn account_info(row: &StoredAccount) -> AccountInfo {
    AccountInfo {
        id: row.id,
        name: row.name.clone(),
        issuer: row.issuer.clone(),
        created_at: row.created_at,
    }
}

fn revealed(row: &StoredAccount, plain: &[u8]) -> RevealedSecret {
    let base32 = base32::encode(plain);
    let otpauth_uri = uri::build(&row.name, row.issuer.as_deref(), &base32);
    RevealedSecret {
        base32,
        otpauth_uri,
    }
}

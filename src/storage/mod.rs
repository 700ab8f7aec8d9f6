pub mod accounts;
pub mod config;

pub use accounts::{CredentialStore, StoredAccount};
pub use config::VaultConfig;

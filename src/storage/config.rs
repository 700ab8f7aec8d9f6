use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Filesystem layout and policy knobs for a vault instance.
///
/// The vault takes this explicit handle instead of reaching for ambient
/// global paths, so embedders (and tests) can point it anywhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Directory holding the database and key file; created on open.
    pub data_dir: PathBuf,
    /// Account database file name inside `data_dir`.
    pub db_file: String,
    /// Master key file name inside `data_dir`.
    pub key_file: String,
    /// Minimum decoded secret length accepted by `add_account`. Typical
    /// services issue 10-byte (16-character) or longer keys.
    pub min_secret_bytes: usize,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            db_file: "authenticator.db".to_string(),
            key_file: "master.key".to_string(),
            min_secret_bytes: 10,
        }
    }
}

impl VaultConfig {
    /// Config rooted at a specific directory, with default file names.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(&self.db_file)
    }

    pub fn key_path(&self) -> PathBuf {
        self.data_dir.join(&self.key_file)
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("authvault")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_join_data_dir() {
        let config = VaultConfig::with_data_dir("/tmp/vault-test");
        assert_eq!(
            config.db_path(),
            PathBuf::from("/tmp/vault-test/authenticator.db")
        );
        assert_eq!(
            config.key_path(),
            PathBuf::from("/tmp/vault-test/master.key")
        );
    }

    #[test]
    fn test_default_policy() {
        assert_eq!(VaultConfig::default().min_secret_bytes, 10);
    }
}

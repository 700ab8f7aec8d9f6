//! End-to-end tests for the vault service: account lifecycle, persistence
//! across reopen, per-row failure isolation, and locking behavior.

use authvault::vault::{CodeStatus, SecretStatus};
use authvault::{VaultConfig, VaultError, VaultService};

const RFC_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

fn open_vault(dir: &std::path::Path) -> VaultService {
    VaultService::open(VaultConfig::with_data_dir(dir)).unwrap()
}

#[test]
fn account_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let vault = open_vault(dir.path());

    let info = vault
        .add_account("user@gmail.com", Some("Google"), "JBSWY3DPEHPK3PXP")
        .unwrap();

    // Present exactly once, with a code matching direct engine output
    let listing = vault.list_accounts_with_codes(1111111109).unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].id, info.id);
    assert_eq!(listing[0].name, "user@gmail.com");
    assert_eq!(listing[0].issuer.as_deref(), Some("Google"));

    let secret = authvault::otp::base32::decode("JBSWY3DPEHPK3PXP", 10).unwrap();
    let expected = authvault::otp::code_at(&secret, 1111111109).unwrap();
    match &listing[0].code {
        CodeStatus::Ready {
            code,
            seconds_remaining,
        } => {
            assert_eq!(*code, expected.code);
            assert_eq!(*seconds_remaining, expected.seconds_remaining);
        }
        other => panic!("expected a code, got {:?}", other),
    }

    // Delete is terminal: the id never reappears
    vault.delete_account(info.id).unwrap();
    assert!(vault.list_accounts_with_codes(1111111109).unwrap().is_empty());
    assert!(matches!(
        vault.delete_account(info.id),
        Err(VaultError::AccountNotFound(_))
    ));
    assert!(matches!(
        vault.current_code(info.id, 1111111109),
        Err(VaultError::AccountNotFound(_))
    ));
}

#[test]
fn add_from_otpauth_uri() {
    let dir = tempfile::tempdir().unwrap();
    let vault = open_vault(dir.path());

    let info = vault
        .add_account_from_uri(
            "otpauth://totp/GitHub:octocat?secret=JBSWY3DPEHPK3PXP&issuer=GitHub",
        )
        .unwrap();
    assert_eq!(info.name, "octocat");
    assert_eq!(info.issuer.as_deref(), Some("GitHub"));

    let revealed = vault.reveal_secret(info.id).unwrap();
    assert_eq!(revealed.base32, "JBSWY3DPEHPK3PXP");
}

#[test]
fn accounts_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();

    let id = {
        let vault = open_vault(dir.path());
        vault
            .add_account("persistent", None, RFC_SECRET)
            .unwrap()
            .id
    };

    // Same data directory, fresh process-equivalent: same key, same rows
    let vault = open_vault(dir.path());
    let listing = vault.list_accounts_with_codes(59).unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].id, id);
    match &listing[0].code {
        CodeStatus::Ready { code, .. } => assert_eq!(code, "287082"),
        other => panic!("expected a code, got {:?}", other),
    }
}

#[test]
fn tampered_row_fails_alone() {
    let dir = tempfile::tempdir().unwrap();

    let (good_id, bad_id) = {
        let vault = open_vault(dir.path());
        let good = vault.add_account("intact", None, RFC_SECRET).unwrap().id;
        let bad = vault
            .add_account("tampered", None, "JBSWY3DPEHPK3PXP")
            .unwrap()
            .id;
        (good, bad)
    };

    // Corrupt one ciphertext byte behind the vault's back
    {
        let conn = rusqlite::Connection::open(dir.path().join("authenticator.db")).unwrap();
        let mut blob: Vec<u8> = conn
            .query_row(
                "SELECT secret FROM accounts WHERE id = ?1",
                [bad_id],
                |row| row.get(0),
            )
            .unwrap();
        let last = blob.len() - 1;
        blob[last] ^= 0x01;
        conn.execute(
            "UPDATE accounts SET secret = ?1 WHERE id = ?2",
            rusqlite::params![blob, bad_id],
        )
        .unwrap();
    }

    let vault = open_vault(dir.path());
    let listing = vault.list_accounts_with_codes(59).unwrap();
    assert_eq!(listing.len(), 2);

    for entry in &listing {
        if entry.id == good_id {
            assert!(matches!(entry.code, CodeStatus::Ready { .. }));
        } else {
            assert!(matches!(
                entry.code,
                CodeStatus::Failed {
                    error: VaultError::DecryptionFailed
                }
            ));
        }
    }

    // The export path isolates the same failure the same way
    let exported = vault.export_accounts().unwrap();
    for entry in &exported {
        if entry.id == good_id {
            match &entry.secret {
                SecretStatus::Revealed(secret) => assert_eq!(secret.base32, RFC_SECRET),
                other => panic!("expected secret, got {:?}", other),
            }
        } else {
            assert!(matches!(entry.secret, SecretStatus::Failed { .. }));
        }
    }
}

#[test]
fn concurrent_adds_all_land() {
    const WRITERS: usize = 8;
    const PER_WRITER: usize = 5;

    let dir = tempfile::tempdir().unwrap();
    let vault = open_vault(dir.path());

    std::thread::scope(|scope| {
        for w in 0..WRITERS {
            let vault = &vault;
            scope.spawn(move || {
                for i in 0..PER_WRITER {
                    vault
                        .add_account(&format!("worker{}-{}", w, i), None, RFC_SECRET)
                        .unwrap();
                }
            });
        }
    });

    let listing = vault.list_accounts_with_codes(59).unwrap();
    assert_eq!(listing.len(), WRITERS * PER_WRITER);

    let mut ids: Vec<i64> = listing.iter().map(|a| a.id).collect();
    ids.dedup();
    assert_eq!(ids.len(), WRITERS * PER_WRITER, "ids must be distinct");
}

#[test]
fn second_handle_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    let _first = open_vault(dir.path());

    match VaultService::open(VaultConfig::with_data_dir(dir.path())) {
        Err(VaultError::StorageUnavailable(msg)) => {
            assert!(msg.contains("locked"), "unexpected message: {}", msg)
        }
        Ok(_) => panic!("second handle must not open a held vault"),
        Err(other) => panic!("expected StorageUnavailable, got {:?}", other),
    }
}

#[test]
fn corrupted_key_file_is_fatal_and_preserved() {
    let dir = tempfile::tempdir().unwrap();
    {
        let vault = open_vault(dir.path());
        vault.add_account("existing", None, RFC_SECRET).unwrap();
    }

    let key_path = dir.path().join("master.key");
    std::fs::write(&key_path, b"short").unwrap();

    assert!(matches!(
        VaultService::open(VaultConfig::with_data_dir(dir.path())),
        Err(VaultError::KeyStoreUnavailable(_))
    ));
    // No silent regeneration: the broken file is still there, untouched
    assert_eq!(std::fs::read(&key_path).unwrap(), b"short");
}

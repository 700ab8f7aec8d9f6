//! Recovery tool: decrypt and print every stored account secret.
//!
//! For moving accounts to a new authenticator or taking a paper backup.
//! Prints each secret in Base32 plus a manual-entry otpauth URI. Run it
//! only on a trusted screen; everything it prints is sensitive.
//!
//! Usage: `recover [data-dir]` (defaults to the platform data directory).

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use authvault::vault::SecretStatus;
use authvault::{VaultConfig, VaultService};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "authvault=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match std::env::args().nth(1) {
        Some(dir) => VaultConfig::with_data_dir(dir),
        None => VaultConfig::default(),
    };

    println!("authvault secret recovery");
    println!("Data directory: {}", config.data_dir.display());
    println!("{}", "=".repeat(60));

    let vault = VaultService::open(config).context("failed to open vault")?;
    let exported = vault
        .export_accounts()
        .context("failed to read accounts")?;

    if exported.is_empty() {
        println!("No accounts stored.");
        return Ok(());
    }

    let mut failures = 0usize;
    for account in &exported {
        println!();
        println!("Account #{}", account.id);
        println!("  Name:    {}", account.name);
        println!("  Issuer:  {}", account.issuer.as_deref().unwrap_or("-"));
        println!("  Created: {}", account.created_at.to_rfc3339());
        match &account.secret {
            SecretStatus::Revealed(secret) => {
                println!("  Secret:  {}", secret.base32);
                println!("  URI:     {}", secret.otpauth_uri);
            }
            SecretStatus::Failed { error } => {
                failures += 1;
                println!("  FAILED:  {}", error);
            }
        }
    }

    println!();
    println!("{}", "=".repeat(60));
    println!(
        "{} accounts processed, {} could not be decrypted.",
        exported.len(),
        failures
    );

    Ok(())
}

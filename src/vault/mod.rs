//! The vault façade: account lifecycle plus code derivation over the
//! encrypted store. This is the API the presentation layer consumes.

pub mod service;

pub use service::{
    AccountCodes, AccountInfo, CodeStatus, ExportedAccount, RevealedSecret, SecretStatus,
    VaultService,
};

pub mod cipher;
pub mod keyfile;

pub use cipher::{decrypt, encrypt};
pub use keyfile::{load_or_create_master_key, MasterKey, KEY_SIZE};

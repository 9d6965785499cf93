//! Password-protected accounts for Keyward.
//!
//! Key material is only ever persisted inside a PBKDF2/AES-256-GCM blob.
//! Unlocking an account decrypts it into a volatile [`EphemeralStore`] entry;
//! signing reads that entry and fails with [`AccountError::AccountLocked`]
//! when it is absent. Locking clears it.

pub mod account;
pub mod cipher;
pub mod codec;
pub mod ephemeral;
pub mod error;
pub mod registry;
pub mod store;
pub mod types;

#[cfg(test)]
mod test_support;

pub use account::{Account, AccountContext, ImportedAccount};
pub use cipher::CipherParams;
pub use codec::{ExportedKeypair, KeySchema};
pub use ephemeral::EphemeralStore;
pub use error::{AccountError, Result};
pub use registry::AccountRegistry;
pub use store::{AccountStore, FileAccountStore, MemoryAccountStore};
pub use types::{AccountEvent, AccountType, DisplayAccount, NewAccount, StoredAccount, UnlockType};

//! Core types for account records.
//!
//! Persisted records and display projections carry only non-secret fields
//! plus, for the persisted record, the opaque ciphertext blob.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind tag of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Created from an imported keypair and unlocked with a password.
    Imported,
}

/// How an account is unlocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnlockType {
    Password,
}

/// An account record as stored by an [`crate::store::AccountStore`].
///
/// `encrypted` is the cipher blob; there is no field that could hold
/// plaintext key material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAccount {
    /// Unique account identifier.
    pub id: String,

    /// Account kind.
    #[serde(rename = "type")]
    pub kind: AccountType,

    /// Address derived from the public key.
    pub address: String,

    /// Base64 public key.
    pub public_key: String,

    /// Encrypted key material (see [`crate::cipher`]).
    pub encrypted: String,

    /// When the account was last successfully unlocked.
    pub last_unlocked_on: Option<DateTime<Utc>>,

    /// Whether this is the selected account.
    pub selected: bool,
}

/// A freshly created account record that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    #[serde(rename = "type")]
    pub kind: AccountType,
    pub address: String,
    pub public_key: String,
    pub encrypted: String,
    pub last_unlocked_on: Option<DateTime<Utc>>,
    pub selected: bool,
}

impl NewAccount {
    /// Attach the registry-assigned id.
    pub fn with_id(self, id: impl Into<String>) -> StoredAccount {
        StoredAccount {
            id: id.into(),
            kind: self.kind,
            address: self.address,
            public_key: self.public_key,
            encrypted: self.encrypted,
            last_unlocked_on: self.last_unlocked_on,
            selected: self.selected,
        }
    }
}

/// Presentation view of an account. Safe to log or send to a UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayAccount {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AccountType,
    pub address: String,
    pub public_key: String,
    pub is_locked: bool,
    pub last_unlocked_on: Option<DateTime<Utc>>,
    pub selected: bool,
    pub is_password_unlockable: bool,
}

/// Lifecycle notifications broadcast to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountEvent {
    /// The account now has a live session.
    Unlocked { id: String },

    /// The account's session was cleared. `allow_read` tells observers whether
    /// they may keep showing cached display data.
    Locked { id: String, allow_read: bool },

    /// The account was deleted from both stores.
    Removed { id: String },
}

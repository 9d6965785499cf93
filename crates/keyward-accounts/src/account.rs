//! Account lifecycle: create, unlock, lock, sign.
//!
//! An account is `Locked` unless the [`EphemeralStore`] holds a live key for
//! its id. Unlocking decrypts the stored blob with the caller's password and
//! places the decoded key in the ephemeral store; locking removes it. Signing
//! only ever reads from the ephemeral store and never unlocks implicitly.

use std::sync::Arc;

use chrono::Utc;
use ed25519_dalek::SigningKey;
use keyward_core::SecretString;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::cipher::{self, CipherParams};
use crate::codec::{self, ExportedKeypair};
use crate::ephemeral::EphemeralStore;
use crate::error::{AccountError, Result};
use crate::store::AccountStore;
use crate::types::{AccountEvent, AccountType, DisplayAccount, NewAccount, StoredAccount, UnlockType};

/// Payload sealed inside the `encrypted` blob.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EncryptedData {
    key_pair: ExportedKeypair,
}

/// Shared handles every account operates on.
#[derive(Clone)]
pub struct AccountContext {
    pub store: Arc<dyn AccountStore>,
    pub sessions: Arc<EphemeralStore>,
    pub events: broadcast::Sender<AccountEvent>,
}

impl AccountContext {
    pub fn new(store: Arc<dyn AccountStore>, sessions: Arc<EphemeralStore>) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            store,
            sessions,
            events,
        }
    }

    pub(crate) fn notify(&self, event: AccountEvent) {
        // Err only means nobody is subscribed.
        if self.events.send(event).is_err() {
            debug!("no account event subscribers");
        }
    }
}

/// An account backed by an imported keypair and unlocked with a password.
pub struct ImportedAccount {
    id: String,
    ctx: AccountContext,
}

impl ImportedAccount {
    /// Build the record for a new imported account.
    ///
    /// Validates and encrypts `exported` under `password`. The returned record
    /// has no id yet and is not persisted; the account starts locked.
    pub async fn create_new(
        exported: ExportedKeypair,
        password: &SecretString,
        params: CipherParams,
    ) -> Result<NewAccount> {
        let verifying_key = codec::to_internal(&exported)?.verifying_key();

        let encrypted = cipher::encrypt_blocking(
            password.clone(),
            EncryptedData { key_pair: exported },
            params,
        )
        .await?;

        Ok(NewAccount {
            kind: AccountType::Imported,
            address: codec::address(&verifying_key),
            public_key: codec::public_key(&verifying_key),
            encrypted,
            last_unlocked_on: None,
            selected: false,
        })
    }

    /// Handle to an existing account. Does not touch either store.
    pub fn new(id: impl Into<String>, ctx: AccountContext) -> Self {
        Self { id: id.into(), ctx }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Decrypt the stored key material and check it against the stored public key.
    async fn decrypt_key(&self, record: &StoredAccount, password: &SecretString) -> Result<SigningKey> {
        let data: EncryptedData =
            cipher::decrypt_blocking(password.clone(), record.encrypted.clone()).await?;
        let key = codec::to_internal(&data.key_pair)?;

        if codec::public_key(&key.verifying_key()) != record.public_key {
            return Err(AccountError::MalformedKeyMaterial(
                "decrypted key does not match stored public key".to_string(),
            ));
        }
        Ok(key)
    }

    /// Unlock with `password`, starting (or restarting) the session.
    ///
    /// On failure the session state is left exactly as it was. Once the key
    /// has been decrypted, the record update and the session put run as one
    /// spawned task: dropping this future after that point does not cancel
    /// them.
    pub async fn unlock(&self, password: &SecretString) -> Result<()> {
        let guard = self.ctx.sessions.transition(&self.id).await;

        let mut record = self.ctx.store.load(&self.id).await?;
        let key = match self.decrypt_key(&record, password).await {
            Ok(key) => key,
            Err(e) => {
                warn!(account_id = %self.id, "unlock failed: {e}");
                return Err(e);
            }
        };

        let ctx = self.ctx.clone();
        let id = self.id.clone();
        let commit = tokio::spawn(async move {
            let _guard = guard;

            record.last_unlocked_on = Some(Utc::now());
            ctx.store.save(&record).await?;
            ctx.sessions.put(&id, key).await;

            info!(account_id = %id, address = %record.address, "account unlocked");
            ctx.notify(AccountEvent::Unlocked { id });
            Ok::<(), AccountError>(())
        });

        commit
            .await
            .map_err(|e| AccountError::Storage(format!("unlock task failed: {e}")))?
    }

    /// Clear the session. Safe to call when already locked.
    pub async fn lock(&self, allow_read: bool) -> Result<()> {
        let _guard = self.ctx.sessions.transition(&self.id).await;

        let was_unlocked = self.ctx.sessions.clear(&self.id).await;
        info!(account_id = %self.id, was_unlocked, allow_read, "account locked");
        self.ctx.notify(AccountEvent::Locked {
            id: self.id.clone(),
            allow_read,
        });
        Ok(())
    }

    pub async fn is_locked(&self) -> bool {
        !self.ctx.sessions.contains(&self.id).await
    }

    /// Sign `data` with the unlocked key.
    ///
    /// Returns the serialized signature (see [`codec::sign`]), or
    /// [`AccountError::AccountLocked`] when there is no live session.
    pub async fn sign_data(&self, data: &[u8]) -> Result<String> {
        let signature = self
            .ctx
            .sessions
            .with_key(&self.id, |key| codec::sign(key, data))
            .await
            .ok_or_else(|| AccountError::AccountLocked(self.id.clone()))?;

        debug!(account_id = %self.id, len = data.len(), "signed data");
        Ok(signature)
    }

    /// Check `password` without changing any state.
    pub async fn verify_password(&self, password: &SecretString) -> Result<()> {
        let record = self.ctx.store.load(&self.id).await?;
        self.decrypt_key(&record, password).await.map(|_| ())
    }

    /// Non-secret projection for presentation.
    pub async fn to_display_serialized(&self) -> Result<DisplayAccount> {
        let record = self.ctx.store.load(&self.id).await?;
        Ok(DisplayAccount {
            id: self.id.clone(),
            kind: record.kind,
            address: record.address,
            public_key: record.public_key,
            is_locked: self.is_locked().await,
            last_unlocked_on: record.last_unlocked_on,
            selected: record.selected,
            is_password_unlockable: true,
        })
    }
}

/// Any account kind. Every variant supports password unlock and signing.
pub enum Account {
    Imported(ImportedAccount),
}

impl Account {
    /// Wrap a stored record in the handle matching its kind.
    pub fn from_record(record: &StoredAccount, ctx: AccountContext) -> Self {
        match record.kind {
            AccountType::Imported => Account::Imported(ImportedAccount::new(&record.id, ctx)),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Account::Imported(account) => account.id(),
        }
    }

    pub fn kind(&self) -> AccountType {
        match self {
            Account::Imported(_) => AccountType::Imported,
        }
    }

    pub fn can_sign(&self) -> bool {
        match self {
            Account::Imported(_) => true,
        }
    }

    pub fn unlock_type(&self) -> UnlockType {
        match self {
            Account::Imported(_) => UnlockType::Password,
        }
    }

    pub async fn unlock(&self, password: &SecretString) -> Result<()> {
        match self {
            Account::Imported(account) => account.unlock(password).await,
        }
    }

    pub async fn lock(&self, allow_read: bool) -> Result<()> {
        match self {
            Account::Imported(account) => account.lock(allow_read).await,
        }
    }

    pub async fn is_locked(&self) -> bool {
        match self {
            Account::Imported(account) => account.is_locked().await,
        }
    }

    pub async fn sign_data(&self, data: &[u8]) -> Result<String> {
        match self {
            Account::Imported(account) => account.sign_data(data).await,
        }
    }

    pub async fn verify_password(&self, password: &SecretString) -> Result<()> {
        match self {
            Account::Imported(account) => account.verify_password(password).await,
        }
    }

    pub async fn to_display_serialized(&self) -> Result<DisplayAccount> {
        match self {
            Account::Imported(account) => account.to_display_serialized().await,
        }
    }
}

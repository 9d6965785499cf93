//! Registry of accounts over a shared persistent and ephemeral store.

use std::sync::Arc;

use keyward_core::{Config, SecretString};
use tokio::sync::broadcast;
use tracing::info;

use crate::account::{Account, AccountContext, ImportedAccount};
use crate::cipher::CipherParams;
use crate::codec::ExportedKeypair;
use crate::ephemeral::EphemeralStore;
use crate::error::{AccountError, Result};
use crate::store::{AccountStore, FileAccountStore};
use crate::types::{AccountEvent, DisplayAccount};

/// Entry point for creating, finding and removing accounts.
#[derive(Clone)]
pub struct AccountRegistry {
    ctx: AccountContext,
    params: CipherParams,
}

impl AccountRegistry {
    pub fn new(
        store: Arc<dyn AccountStore>,
        sessions: Arc<EphemeralStore>,
        params: CipherParams,
    ) -> Self {
        Self {
            ctx: AccountContext::new(store, sessions),
            params,
        }
    }

    /// File-backed registry using the configured directory, iterations and
    /// auto-lock.
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = FileAccountStore::from_config(config)?;
        Ok(Self::new(
            Arc::new(store),
            Arc::new(EphemeralStore::new(config.auto_lock())),
            CipherParams::from(&config.cipher),
        ))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AccountEvent> {
        self.ctx.events.subscribe()
    }

    pub fn sessions(&self) -> &Arc<EphemeralStore> {
        &self.ctx.sessions
    }

    /// Encrypt and persist a new imported account. It starts locked.
    pub async fn create_imported(
        &self,
        exported: ExportedKeypair,
        password: &SecretString,
    ) -> Result<DisplayAccount> {
        let new = ImportedAccount::create_new(exported, password, self.params).await?;

        let record = new.with_id(keyward_core::id::uuid());
        self.ctx.store.save(&record).await?;
        info!(account_id = %record.id, address = %record.address, "account created");

        Account::from_record(&record, self.ctx.clone())
            .to_display_serialized()
            .await
    }

    /// Look up an account by id.
    pub async fn get(&self, id: &str) -> Result<Account> {
        let record = self.ctx.store.load(id).await?;
        Ok(Account::from_record(&record, self.ctx.clone()))
    }

    /// Look up an account by id, or by address when `key` starts with `0x`.
    pub async fn resolve(&self, key: &str) -> Result<Account> {
        if !key.starts_with("0x") {
            return self.get(key).await;
        }
        self.ctx
            .store
            .list()
            .await?
            .into_iter()
            .find(|r| r.address.eq_ignore_ascii_case(key))
            .map(|r| Account::from_record(&r, self.ctx.clone()))
            .ok_or_else(|| AccountError::NotFound(key.to_string()))
    }

    /// All accounts, sorted by address.
    pub async fn list(&self) -> Result<Vec<DisplayAccount>> {
        let mut records = self.ctx.store.list().await?;
        records.sort_by(|a, b| a.address.cmp(&b.address));

        let mut accounts = Vec::with_capacity(records.len());
        for record in &records {
            accounts.push(
                Account::from_record(record, self.ctx.clone())
                    .to_display_serialized()
                    .await?,
            );
        }
        Ok(accounts)
    }

    /// The selected account, if any.
    pub async fn selected(&self) -> Result<Option<Account>> {
        Ok(self
            .ctx
            .store
            .list()
            .await?
            .into_iter()
            .find(|r| r.selected)
            .map(|r| Account::from_record(&r, self.ctx.clone())))
    }

    /// Make `id` the only selected account.
    pub async fn select(&self, id: &str) -> Result<()> {
        // Fail before touching other records.
        self.ctx.store.load(id).await?;

        for record in self.ctx.store.list().await? {
            let want = record.id == id;
            if record.selected == want {
                continue;
            }
            // Same guard as unlock so its lastUnlockedOn write is not lost.
            let _guard = self.ctx.sessions.transition(&record.id).await;
            let mut record = self.ctx.store.load(&record.id).await?;
            record.selected = want;
            self.ctx.store.save(&record).await?;
        }

        info!(account_id = id, "account selected");
        Ok(())
    }

    /// Delete an account. Its session is cleared before the record goes.
    pub async fn remove(&self, id: &str) -> Result<()> {
        {
            let _guard = self.ctx.sessions.transition(id).await;
            self.ctx.sessions.clear(id).await;
            self.ctx.store.remove(id).await?;
        }
        self.ctx.sessions.forget(id);

        info!(account_id = id, "account removed");
        self.ctx.notify(AccountEvent::Removed { id: id.to_string() });
        Ok(())
    }

    /// Lock every unlocked account. Returns the ids that were unlocked.
    ///
    /// Unlocks already in flight finish first and are then locked too.
    pub async fn lock_all(&self) -> Vec<String> {
        let _guards = self.ctx.sessions.transition_all().await;
        let ids = self.ctx.sessions.clear_all().await;
        for id in &ids {
            self.ctx.notify(AccountEvent::Locked {
                id: id.clone(),
                allow_read: false,
            });
        }
        info!(count = ids.len(), "all accounts locked");
        ids
    }
}

//! Durable account record storage.
//!
//! Defines the [`AccountStore`] trait and provides [`FileAccountStore`], a
//! file-system-backed implementation that keeps each record as a JSON file
//! under `~/.keyward/accounts/`, plus [`MemoryAccountStore`] for tests and
//! throwaway sessions.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{AccountError, Result};
use crate::types::StoredAccount;

/// Async trait for account record backends.
///
/// Records hold non-secret metadata and the ciphertext blob only.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Insert or replace the record under `record.id`.
    async fn save(&self, record: &StoredAccount) -> Result<()>;

    /// Load a record by id.
    async fn load(&self, id: &str) -> Result<StoredAccount>;

    /// Delete a record by id.
    async fn remove(&self, id: &str) -> Result<()>;

    /// List all records, sorted by id.
    async fn list(&self) -> Result<Vec<StoredAccount>>;
}

/// Validate that an account id contains only safe characters.
fn validate_id(id: &str) -> Result<()> {
    if keyward_core::id::is_valid_id(id) {
        Ok(())
    } else {
        Err(AccountError::InvalidId(format!(
            "{id:?} (allowed: alphanumeric, underscore, hyphen; max {} chars)",
            keyward_core::id::MAX_ID_LEN
        )))
    }
}

/// A file-system-backed account store.
///
/// Each record is stored at `{base_dir}/{id}.json`. The directory is created
/// with mode `0700` and files with mode `0600` on Unix.
pub struct FileAccountStore {
    base_dir: PathBuf,
}

impl FileAccountStore {
    /// Create a new store rooted at `base_dir`.
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Create a store under the directory named by `config`.
    pub fn from_config(config: &keyward_core::Config) -> Result<Self> {
        let base_dir = config
            .accounts_dir()
            .map_err(|e| AccountError::Storage(e.to_string()))?;
        Ok(Self::new(base_dir))
    }

    /// Root directory of this store.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Ensure the base directory exists with restrictive permissions.
    async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.base_dir).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o700);
            tokio::fs::set_permissions(&self.base_dir, perms).await?;
        }

        Ok(())
    }

    /// Resolve the path for a record file.
    fn record_path(&self, id: &str) -> PathBuf {
        self.base_dir.join(format!("{id}.json"))
    }
}

/// Write `data` to `path` atomically with mode 0600 on Unix.
///
/// Runs on the blocking pool so a dropped caller cannot interrupt it between
/// the temp write and the rename. The temp file is removed on failure.
async fn write_record_file(path: &Path, data: Vec<u8>) -> Result<()> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let temp_path = path.with_extension(format!("{}.tmp", keyward_core::id::short_id()));
        let written = replace_file(&temp_path, &path, &data);
        if written.is_err() {
            if let Err(e) = std::fs::remove_file(&temp_path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %temp_path.display(), "failed to remove temp file: {e}");
                }
            }
        }
        written
    })
    .await
    .map_err(|e| AccountError::Storage(format!("record write task failed: {e}")))??;
    Ok(())
}

fn replace_file(temp_path: &Path, path: &Path, data: &[u8]) -> std::io::Result<()> {
    std::fs::write(temp_path, data)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(temp_path, std::fs::Permissions::from_mode(0o600))?;
    }

    std::fs::rename(temp_path, path)
}

#[async_trait]
impl AccountStore for FileAccountStore {
    async fn save(&self, record: &StoredAccount) -> Result<()> {
        validate_id(&record.id)?;
        self.ensure_dir().await?;

        let json = serde_json::to_string_pretty(record)?;
        let path = self.record_path(&record.id);
        debug!(account_id = %record.id, path = %path.display(), "writing account record");
        write_record_file(&path, json.into_bytes()).await
    }

    async fn load(&self, id: &str) -> Result<StoredAccount> {
        validate_id(id)?;

        let path = self.record_path(id);
        let data = match tokio::fs::read_to_string(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AccountError::NotFound(id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let record: StoredAccount = serde_json::from_str(&data)?;
        if record.id != id {
            return Err(AccountError::Storage(format!(
                "record at {} belongs to {}",
                path.display(),
                record.id
            )));
        }
        Ok(record)
    }

    async fn remove(&self, id: &str) -> Result<()> {
        validate_id(id)?;

        let path = self.record_path(id);
        debug!(account_id = id, path = %path.display(), "deleting account record");
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AccountError::NotFound(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self) -> Result<Vec<StoredAccount>> {
        if !self.base_dir.exists() {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.base_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            match tokio::fs::read_to_string(&path).await {
                Ok(data) => match serde_json::from_str::<StoredAccount>(&data) {
                    Ok(record) => records.push(record),
                    Err(e) => {
                        warn!(path = %path.display(), "skipping malformed account record: {e}");
                    }
                },
                Err(e) => {
                    warn!(path = %path.display(), "could not read account record: {e}");
                }
            }
        }

        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }
}

/// An in-memory account store. Contents vanish with the process.
#[derive(Default)]
pub struct MemoryAccountStore {
    records: RwLock<HashMap<String, StoredAccount>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn save(&self, record: &StoredAccount) -> Result<()> {
        validate_id(&record.id)?;
        self.records
            .write()
            .await
            .insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn load(&self, id: &str) -> Result<StoredAccount> {
        self.records
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| AccountError::NotFound(id.to_string()))
    }

    async fn remove(&self, id: &str) -> Result<()> {
        self.records
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| AccountError::NotFound(id.to_string()))
    }

    async fn list(&self) -> Result<Vec<StoredAccount>> {
        let mut records: Vec<StoredAccount> = self.records.read().await.values().cloned().collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }
}

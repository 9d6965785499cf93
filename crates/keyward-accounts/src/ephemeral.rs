//! Volatile per-process store of unlocked signing keys.
//!
//! An entry exists exactly while an account is unlocked. Entries are never
//! serialized or handed out; callers sign through [`EphemeralStore::with_key`]
//! inside the crate. With a TTL configured, entries older than the TTL read as
//! absent and are dropped on the next access.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use ed25519_dalek::SigningKey;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tokio::time::Instant;
use tracing::debug;

/// A live unlocked key.
struct Session {
    key: SigningKey,
    unlocked_at: Instant,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("key", &"[REDACTED]")
            .field("unlocked_at", &self.unlocked_at)
            .finish()
    }
}

/// Shared store of unlocked sessions, partitioned by account id.
///
/// Holds at most one entry per id: `put` replaces, `clear` removes. Each
/// mutation happens under a single write lock so readers never see a
/// half-replaced entry.
pub struct EphemeralStore {
    sessions: RwLock<HashMap<String, Session>>,
    transitions: parking_lot::Mutex<HashMap<String, Arc<Mutex<()>>>>,
    ttl: Option<Duration>,
}

impl EphemeralStore {
    /// Create a store whose sessions expire after `ttl` (`None` = never).
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            transitions: parking_lot::Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Session lifetime, if any.
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    fn is_expired(&self, session: &Session) -> bool {
        self.ttl
            .is_some_and(|ttl| session.unlocked_at.elapsed() >= ttl)
    }

    /// Acquire the per-account transition guard.
    ///
    /// Unlock and lock hold this across their whole sequence so put/clear
    /// pairs for one id are linearized.
    pub async fn transition(&self, id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut transitions = self.transitions.lock();
            transitions.entry(id.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Acquire the transition guard of every known id, in id order.
    ///
    /// Waits out in-flight unlocks and locks. Ids first seen after the
    /// snapshot are not covered.
    pub async fn transition_all(&self) -> Vec<OwnedMutexGuard<()>> {
        let mut locks: Vec<(String, Arc<Mutex<()>>)> = self
            .transitions
            .lock()
            .iter()
            .map(|(id, lock)| (id.clone(), lock.clone()))
            .collect();
        locks.sort_by(|a, b| a.0.cmp(&b.0));

        let mut guards = Vec::with_capacity(locks.len());
        for (_, lock) in locks {
            guards.push(lock.lock_owned().await);
        }
        guards
    }

    /// Store the unlocked key for `id`, replacing any previous entry.
    pub async fn put(&self, id: &str, key: SigningKey) {
        let session = Session {
            key,
            unlocked_at: Instant::now(),
        };
        let replaced = self
            .sessions
            .write()
            .await
            .insert(id.to_string(), session)
            .is_some();
        debug!(account_id = id, replaced, "session stored");
    }

    /// Run `f` against the live key for `id`, if there is one.
    pub(crate) async fn with_key<R>(&self, id: &str, f: impl FnOnce(&SigningKey) -> R) -> Option<R> {
        let mut sessions = self.sessions.write().await;
        if sessions.get(id).is_some_and(|s| self.is_expired(s)) {
            sessions.remove(id);
            debug!(account_id = id, "session expired");
            return None;
        }
        sessions.get(id).map(|s| f(&s.key))
    }

    /// Whether a live entry exists for `id`.
    pub async fn contains(&self, id: &str) -> bool {
        self.with_key(id, |_| ()).await.is_some()
    }

    /// Remove the entry for `id`. Returns whether a live entry was removed.
    ///
    /// Idempotent: clearing an absent id is a no-op.
    pub async fn clear(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id);
        let was_live = removed.is_some_and(|s| !self.is_expired(&s));
        debug!(account_id = id, was_live, "session cleared");
        was_live
    }

    /// Remove every entry, returning the ids that were live.
    pub async fn clear_all(&self) -> Vec<String> {
        let drained: Vec<(String, Session)> = self.sessions.write().await.drain().collect();
        let mut live: Vec<String> = drained
            .into_iter()
            .filter(|(_, s)| !self.is_expired(s))
            .map(|(id, _)| id)
            .collect();
        live.sort();
        debug!(count = live.len(), "all sessions cleared");
        live
    }

    /// Drop the transition guard bookkeeping for a removed account.
    pub fn forget(&self, id: &str) {
        self.transitions.lock().remove(id);
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| !self.is_expired(s));
        sessions.len()
    }

    /// Whether there are no live entries.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for EphemeralStore {
    fn default() -> Self {
        Self::new(None)
    }
}

impl fmt::Debug for EphemeralStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EphemeralStore")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

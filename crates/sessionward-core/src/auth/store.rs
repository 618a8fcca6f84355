use std::sync::{Arc, Mutex, PoisonError, RwLock};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use super::record::{CredentialPatch, CredentialRecord, PendingLoginInput};
use super::storage::DurableStore;

#[derive(Debug, Default)]
struct StoreState {
    record: CredentialRecord,
    pending: PendingLoginInput,
}

struct Inner {
    state: RwLock<StoreState>,
    /// Serializes mutations so durable writes land in the same order as
    /// the in-memory updates they reflect.
    write_order: Mutex<()>,
    durable: Arc<dyn DurableStore>,
    key: String,
}

/// Owner of the current [`CredentialRecord`].
///
/// Clone is cheap and every clone refers to the same record. Each call is
/// atomic with respect to every other call: readers see either the record
/// before a merge or after it, never a mix.
#[derive(Clone)]
pub struct CredentialStore {
    inner: Arc<Inner>,
}

impl CredentialStore {
    /// Open the store and rehydrate it from `durable` under `key`.
    ///
    /// Unreadable or corrupt stored data is logged and treated as "no
    /// session"; only a failing backend read is an error.
    pub fn open(durable: Arc<dyn DurableStore>, key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        let stored = durable
            .load(&key)
            .with_context(|| format!("Failed to load stored session '{}'", key))?;

        let record = match stored {
            Some(contents) => match serde_json::from_str::<CredentialRecord>(&contents) {
                Ok(record) => {
                    debug!(subject = %record.subject_id, "Session rehydrated");
                    record
                }
                Err(e) => {
                    warn!(error = %e, "Stored session is corrupt, starting empty");
                    CredentialRecord::default()
                }
            },
            None => {
                debug!("No stored session found");
                CredentialRecord::default()
            }
        };

        Ok(Self {
            inner: Arc::new(Inner {
                state: RwLock::new(StoreState {
                    record,
                    pending: PendingLoginInput::default(),
                }),
                write_order: Mutex::new(()),
                durable,
                key,
            }),
        })
    }

    /// Snapshot of the current record
    pub fn read(&self) -> CredentialRecord {
        self.inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .record
            .clone()
    }

    /// Current token; empty when there is no session
    pub fn token(&self) -> String {
        self.inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .record
            .token
            .clone()
    }

    /// Merge `patch` into the record and persist the result.
    pub fn merge_update(&self, patch: CredentialPatch) {
        let _order = self.inner.write_order.lock().unwrap_or_else(PoisonError::into_inner);
        let snapshot = {
            let mut state = self.inner.state.write().unwrap_or_else(PoisonError::into_inner);
            state.record.merge(patch);
            state.record.clone()
        };
        self.persist(&snapshot);
    }

    /// Reset the credential fields to the empty record.
    ///
    /// Pending login input is left alone. Clearing an empty store is a no-op
    /// apart from the durable removal.
    pub fn clear(&self) {
        let _order = self.inner.write_order.lock().unwrap_or_else(PoisonError::into_inner);
        self.inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .record = CredentialRecord::default();

        if let Err(e) = self.inner.durable.remove(&self.inner.key) {
            warn!(error = %e, "Failed to remove stored session");
        }
        debug!("Session cleared");
    }

    /// Merge into the pending login input. Never persisted.
    pub fn set_pending_login_input(&self, patch: PendingLoginInput) {
        self.inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .pending
            .merge(patch);
    }

    pub fn pending_login_input(&self) -> PendingLoginInput {
        self.inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .pending
            .clone()
    }

    fn persist(&self, record: &CredentialRecord) {
        let result = serde_json::to_string(record)
            .context("Failed to serialize session")
            .and_then(|contents| self.inner.durable.save(&self.inner.key, &contents));

        if let Err(e) = result {
            warn!(error = %e, "Failed to persist session");
        }
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("key", &self.inner.key)
            .finish_non_exhaustive()
    }
}

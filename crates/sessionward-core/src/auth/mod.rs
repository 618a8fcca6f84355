//! Session state and credential classification.
//!
//! This module provides:
//! - `CredentialStore`: the single owner of the current session record,
//!   rehydrated from durable storage on open
//! - `validate`: total classification of a token as absent, valid, expired
//!   or malformed
//! - `DurableStore`: the persistence seam, with file, keychain and
//!   in-memory backends

pub mod record;
pub mod storage;
pub mod store;
pub mod validator;

pub use record::{CredentialPatch, CredentialRecord, PendingLoginInput, NO_SUBJECT};
pub use storage::{DurableStore, FileStore, KeyringStore, MemoryStore};
pub use store::CredentialStore;
pub use validator::{validate, validate_at, CredentialStatus};

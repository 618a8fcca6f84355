use serde::{Deserialize, Serialize};

use super::validator::{self, CredentialStatus};

/// Subject identifier held by an empty record
pub const NO_SUBJECT: &str = "none";

/// The authenticated session as seen by the client.
///
/// An empty `token` means there is no session. The record is replaced
/// field-by-field through [`CredentialPatch`], never wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecord {
    pub subject_id: String,
    pub display_name: String,
    pub token: String,
}

impl Default for CredentialRecord {
    fn default() -> Self {
        Self {
            subject_id: NO_SUBJECT.to_string(),
            display_name: String::new(),
            token: String::new(),
        }
    }
}

impl CredentialRecord {
    /// Apply every field present in `patch`, keeping the rest.
    pub fn merge(&mut self, patch: CredentialPatch) {
        if let Some(subject_id) = patch.subject_id {
            self.subject_id = subject_id;
        }
        if let Some(display_name) = patch.display_name {
            self.display_name = display_name;
        }
        if let Some(token) = patch.token {
            self.token = token;
        }
    }

    /// Classify the held token against the current clock
    pub fn status(&self) -> CredentialStatus {
        validator::validate(&self.token)
    }

    /// True when no credential field differs from the empty record
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Partial update for [`CredentialRecord`]. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialPatch {
    pub subject_id: Option<String>,
    pub display_name: Option<String>,
    pub token: Option<String>,
}

impl CredentialPatch {
    /// Patch carrying all three credential fields, as returned by a login
    pub fn session(
        subject_id: impl Into<String>,
        display_name: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            subject_id: Some(subject_id.into()),
            display_name: Some(display_name.into()),
            token: Some(token.into()),
        }
    }

    pub fn display_name(display_name: impl Into<String>) -> Self {
        Self {
            display_name: Some(display_name.into()),
            ..Self::default()
        }
    }

    pub fn token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..Self::default()
        }
    }
}

/// Login form contents entered but not yet confirmed by the server.
///
/// Only kept so a failed login can re-fill the form. Never used for
/// authorization and never written to durable storage.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct PendingLoginInput {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl PendingLoginInput {
    pub fn merge(&mut self, patch: PendingLoginInput) {
        if patch.username.is_some() {
            self.username = patch.username;
        }
        if patch.password.is_some() {
            self.password = patch.password;
        }
    }
}

impl std::fmt::Debug for PendingLoginInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingLoginInput")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::table::RouteTable;
use crate::auth::{validate_at, CredentialRecord, CredentialStatus};

/// What to do with one navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    RedirectTo(String),
}

/// Decides every navigation from the target's route flag and a credential
/// snapshot. Holds no state between attempts.
#[derive(Debug, Clone)]
pub struct NavigationGuard {
    table: Arc<RouteTable>,
}

impl NavigationGuard {
    pub fn new(table: Arc<RouteTable>) -> Self {
        Self { table }
    }

    pub fn check(&self, target: &str, credential: &CredentialRecord) -> GuardDecision {
        self.check_at(target, credential, Utc::now())
    }

    /// Same as [`check`](Self::check) against a fixed clock.
    ///
    /// Absent, expired and malformed credentials all redirect to the same
    /// fallback; the distinction only shows up in the logs.
    pub fn check_at(
        &self,
        target: &str,
        credential: &CredentialRecord,
        now: DateTime<Utc>,
    ) -> GuardDecision {
        if !self.table.requires_auth(target) {
            debug!(path = target, "Public route, allowing");
            return GuardDecision::Allow;
        }

        match validate_at(&credential.token, now) {
            CredentialStatus::Valid => GuardDecision::Allow,
            status => {
                debug!(
                    path = target,
                    ?status,
                    fallback = self.table.fallback(),
                    "Denying navigation"
                );
                GuardDecision::RedirectTo(self.table.fallback().to_string())
            }
        }
    }
}

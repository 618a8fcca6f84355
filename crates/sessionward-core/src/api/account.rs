//! Account endpoints that produce or retire a credential.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::client::ApiClient;
use super::error::ApiError;
use crate::auth::{CredentialPatch, CredentialRecord, PendingLoginInput};

#[derive(Debug, Serialize)]
struct AccountCredentials<'a> {
    username: &'a str,
    password: &'a str,
}

/// Payload of a successful login
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub id: i64,
    pub username: String,
    pub jwt: String,
}

/// Public profile with game statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub game_total_counts: i64,
    pub game_person_counts: i64,
    pub game_ai_counts: i64,
    pub game_success_counts: i64,
    pub game_fail_counts: i64,
    pub game_dead_heat_counts: i64,
}

impl ApiClient {
    /// Log in and store the returned session.
    ///
    /// The entered credentials are kept as pending login input first so a
    /// failed attempt can re-fill the form.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<CredentialRecord, ApiError> {
        self.store().set_pending_login_input(PendingLoginInput {
            username: Some(username.to_string()),
            password: Some(password.to_string()),
        });

        let response: LoginResponse = self
            .post("/user/login", &AccountCredentials { username, password })
            .await?;

        self.store().merge_update(CredentialPatch::session(
            response.id.to_string(),
            response.username,
            response.jwt,
        ));
        info!(subject = response.id, "Login successful");
        Ok(self.store().read())
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let _: Value = self
            .post("/user/register", &AccountCredentials { username, password })
            .await?;
        info!(username = username, "Registration successful");
        Ok(())
    }

    /// Fetch a profile and refresh the stored display name from it
    pub async fn fetch_profile(&self, subject_id: &str) -> Result<UserProfile, ApiError> {
        let profile: UserProfile = self.get(&format!("/user/{}", subject_id)).await?;
        if self.store().read().subject_id == subject_id {
            self.store()
                .merge_update(CredentialPatch::display_name(profile.username.clone()));
        }
        Ok(profile)
    }

    /// Delete the account server-side, then drop the local session
    pub async fn delete_account(&self, subject_id: &str) -> Result<(), ApiError> {
        let _: Value = self.delete(&format!("/user/{}", subject_id)).await?;
        self.store().clear();
        info!(subject = subject_id, "Account deleted");
        Ok(())
    }

    /// Forget the local session. No request is made.
    pub fn logout(&self) {
        self.store().clear();
        info!("Logged out");
    }
}

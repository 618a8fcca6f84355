//! Request pipeline around every outbound API call.
//!
//! Each call goes through two stages:
//! - pre-send: attach the stored token as the `jwt` header, even when empty
//! - post-receive: classify the response into a [`ResponseOutcome`], emit
//!   the matching effects, and hand a failure back to the caller
//!
//! Validation of the token is not done here. An expired token is still sent
//! and the server decides.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::HeaderValue;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::effects::{EffectSender, Severity};
use super::envelope::ResponseEnvelope;
use super::error::{ApiError, ResponseOutcome};
use crate::auth::CredentialStore;
use crate::config::Config;

// ============================================================================
// Constants
// ============================================================================

/// Header carrying the credential on every request
pub const TOKEN_HEADER: &str = "jwt";

/// Notification shown when no response arrives
pub const UNREACHABLE_MESSAGE: &str = "Server is not accessible, please try again later.";

/// Notification shown when the server rejects a call without a message
pub const FALLBACK_MESSAGE: &str = "Unknown exception, please contact the administrator";

/// API client wrapping every call in the pre-send and post-receive stages.
/// Clone is cheap - reqwest::Client and the store are both shared handles.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    store: CredentialStore,
    effects: EffectSender,
    fallback_route: String,
    clear_on_unauthorized: bool,
}

impl ApiClient {
    /// Create a client for `config.base_url` reading credentials from `store`
    pub fn new(config: &Config, store: CredentialStore, effects: EffectSender) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            store,
            effects,
            fallback_route: config.fallback_route.clone(),
            clear_on_unauthorized: config.clear_on_unauthorized,
        })
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    // ===== Pipeline =====

    /// Run one request through both stages and return its classification.
    ///
    /// Effects for failures are emitted before this returns.
    pub async fn send(&self, method: Method, path: &str, body: Option<Value>) -> ResponseOutcome {
        let url = self.url(path);
        debug!(%method, url = %url, "Sending request");

        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let outcome = Self::receive(self.attach_credential(request).send().await).await;
        self.react(&outcome, &url);
        outcome
    }

    /// Pre-send stage: attach the current token, whatever its state.
    fn attach_credential(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self.store.token();
        let value = HeaderValue::from_str(&token).unwrap_or_else(|_| {
            warn!("Stored token is not a valid header value, sending empty credential");
            HeaderValue::from_static("")
        });
        request.header(TOKEN_HEADER, value)
    }

    /// Post-receive stage, transport half: read the body or give up.
    async fn receive(result: reqwest::Result<reqwest::Response>) -> ResponseOutcome {
        let response = match result {
            Ok(response) => response,
            Err(e) if e.is_builder() => {
                warn!(error = %e, "Request could not be built");
                return ResponseOutcome::ApplicationError(FALLBACK_MESSAGE.to_string());
            }
            Err(e) => {
                warn!(error = %e, timeout = e.is_timeout(), "No response received");
                return ResponseOutcome::NetworkUnreachable;
            }
        };

        let status = response.status();
        match response.bytes().await {
            Ok(body) => classify_response(status, &body),
            Err(e) => {
                warn!(error = %e, %status, "Failed to read response body");
                ResponseOutcome::NetworkUnreachable
            }
        }
    }

    /// Post-receive stage, reaction half: notify, and on rejection de-authenticate.
    fn react(&self, outcome: &ResponseOutcome, url: &str) {
        match outcome {
            ResponseOutcome::Success(_) => {
                debug!(url = %url, "Request succeeded");
            }
            ResponseOutcome::NetworkUnreachable => {
                self.effects.notify(UNREACHABLE_MESSAGE, Severity::Error);
            }
            ResponseOutcome::ApplicationError(message) => {
                warn!(url = %url, message = %message, "Request rejected");
                self.effects.notify(message.as_str(), Severity::Error);
            }
            ResponseOutcome::Unauthorized(message) => {
                info!(url = %url, "Credential rejected by server, leaving session");
                self.effects.notify(message.as_str(), Severity::Error);
                if self.clear_on_unauthorized {
                    self.store.clear();
                }
                self.effects.navigate(self.fallback_route.as_str());
            }
        }
    }

    // ===== Typed helpers =====

    /// Send and decode the success payload into `T`.
    ///
    /// A payload that does not fit `T` is reported like any other
    /// application error.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, ApiError> {
        let payload = self.send(method, path, body).await.into_result()?;
        match serde_json::from_value(payload) {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!(error = %e, path = path, "Unexpected payload shape");
                self.effects.notify(FALLBACK_MESSAGE, Severity::Error);
                Err(ApiError::Application(format!("Invalid payload: {}", e)))
            }
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.call(Method::GET, path, None).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = match serde_json::to_value(body) {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, path = path, "Failed to serialize request body");
                self.effects.notify(FALLBACK_MESSAGE, Severity::Error);
                return Err(ApiError::Application(format!("Invalid request body: {}", e)));
            }
        };
        self.call(Method::POST, path, Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.call(Method::DELETE, path, None).await
    }
}

/// Classify a received response by HTTP status and envelope.
///
/// Success needs both a 2xx status and the success code. Anything else is
/// unauthorized on 401 and an application error otherwise.
pub fn classify_response(status: StatusCode, body: &[u8]) -> ResponseOutcome {
    let envelope = serde_json::from_slice::<ResponseEnvelope>(body).ok();

    if status.is_success() {
        if let Some(envelope) = envelope.as_ref().filter(|e| e.is_success()) {
            return ResponseOutcome::Success(envelope.data.clone().unwrap_or(Value::Null));
        }
    }

    let message = envelope
        .as_ref()
        .and_then(ResponseEnvelope::message)
        .unwrap_or(FALLBACK_MESSAGE)
        .to_string();

    if status == StatusCode::UNAUTHORIZED {
        ResponseOutcome::Unauthorized(message)
    } else {
        ResponseOutcome::ApplicationError(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::effects::{effect_channel, Effect};
    use crate::auth::{CredentialPatch, MemoryStore};
    use serde_json::json;
    use std::sync::Arc;

    fn body(value: Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[test]
    fn test_success_needs_code_and_2xx() {
        let ok = body(json!({"code": 1, "msg": "success", "data": {"id": 1}}));
        assert_eq!(
            classify_response(StatusCode::OK, &ok),
            ResponseOutcome::Success(json!({"id": 1}))
        );
        // A success envelope behind an error status is still a failure
        assert!(!classify_response(StatusCode::INTERNAL_SERVER_ERROR, &ok).is_success());
    }

    #[test]
    fn test_success_without_data_is_null_payload() {
        let ok = body(json!({"code": 1, "msg": "success"}));
        assert_eq!(
            classify_response(StatusCode::OK, &ok),
            ResponseOutcome::Success(Value::Null)
        );
    }

    #[test]
    fn test_application_error_uses_server_message() {
        let rejected = body(json!({"code": 0, "msg": "Username already in use"}));
        assert_eq!(
            classify_response(StatusCode::OK, &rejected),
            ResponseOutcome::ApplicationError("Username already in use".to_string())
        );
    }

    #[test]
    fn test_unauthorized_with_and_without_body() {
        let with_msg = body(json!({"code": 0, "msg": "session expired"}));
        assert_eq!(
            classify_response(StatusCode::UNAUTHORIZED, &with_msg),
            ResponseOutcome::Unauthorized("session expired".to_string())
        );
        assert_eq!(
            classify_response(StatusCode::UNAUTHORIZED, b""),
            ResponseOutcome::Unauthorized(FALLBACK_MESSAGE.to_string())
        );
    }

    #[test]
    fn test_unparseable_body_falls_back() {
        assert_eq!(
            classify_response(StatusCode::OK, b"<html>oops</html>"),
            ResponseOutcome::ApplicationError(FALLBACK_MESSAGE.to_string())
        );
        assert_eq!(
            classify_response(StatusCode::BAD_GATEWAY, b""),
            ResponseOutcome::ApplicationError(FALLBACK_MESSAGE.to_string())
        );
    }

    #[test]
    fn test_url_joining() {
        let store = CredentialStore::open(Arc::new(MemoryStore::new()), "k").unwrap();
        let (effects, _rx) = effect_channel();
        let config = Config {
            base_url: "http://localhost:8080/api/".to_string(),
            ..Config::default()
        };
        let client = ApiClient::new(&config, store, effects).unwrap();
        assert_eq!(client.url("/user/login"), "http://localhost:8080/api/user/login");
        assert_eq!(client.url("user/7"), "http://localhost:8080/api/user/7");
    }

    #[tokio::test]
    async fn test_unauthorized_reaction_clears_and_redirects() {
        let store = CredentialStore::open(Arc::new(MemoryStore::new()), "k").unwrap();
        store.merge_update(CredentialPatch::session("u1", "alice", "a.b.c"));
        let (effects, mut rx) = effect_channel();
        let client = ApiClient::new(&Config::default(), store.clone(), effects).unwrap();

        client.react(&ResponseOutcome::Unauthorized("session expired".into()), "test");

        assert!(store.read().is_empty());
        assert_eq!(
            rx.recv().await,
            Some(Effect::Notify {
                message: "session expired".to_string(),
                severity: Severity::Error
            })
        );
        assert_eq!(
            rx.recv().await,
            Some(Effect::Navigate {
                path: "/introduction".to_string()
            })
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unauthorized_can_keep_stale_credential() {
        let store = CredentialStore::open(Arc::new(MemoryStore::new()), "k").unwrap();
        store.merge_update(CredentialPatch::token("a.b.c"));
        let (effects, _rx) = effect_channel();
        let config = Config {
            clear_on_unauthorized: false,
            ..Config::default()
        };
        let client = ApiClient::new(&config, store.clone(), effects).unwrap();

        client.react(&ResponseOutcome::Unauthorized(FALLBACK_MESSAGE.into()), "test");

        assert_eq!(store.token(), "a.b.c");
    }
}

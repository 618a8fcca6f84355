use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tracing::{debug, warn};

use super::guard::{GuardDecision, NavigationGuard};
use super::table::{normalize_path, RouteTable};
use crate::auth::CredentialStore;

/// Maximum number of redirects followed for one navigation.
/// Static redirects plus one guard redirect never come close in a sane table.
pub const MAX_REDIRECTS: usize = 10;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    #[error("Redirect loop while navigating to {target}: {}", .hops.join(" -> "))]
    RedirectLoop { target: String, hops: Vec<String> },
}

/// Result of a committed navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub requested: String,
    pub committed: String,
    /// Every location passed through after `requested`, ending at `committed`
    pub redirects: Vec<String>,
}

impl Navigation {
    pub fn was_redirected(&self) -> bool {
        !self.redirects.is_empty()
    }
}

/// The one place the current location changes.
///
/// Every transition runs the guard, including transitions produced by a
/// redirect, so there is no path around it.
pub struct Navigator {
    table: Arc<RouteTable>,
    guard: NavigationGuard,
    store: CredentialStore,
    current: Mutex<Option<String>>,
}

impl Navigator {
    pub fn new(table: Arc<RouteTable>, store: CredentialStore) -> Self {
        Self {
            guard: NavigationGuard::new(Arc::clone(&table)),
            table,
            store,
            current: Mutex::new(None),
        }
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Location of the last committed navigation
    pub fn current(&self) -> Option<String> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Navigate to `target`, following static and guard redirects.
    ///
    /// The credential is re-read on every hop. The location only changes
    /// once a hop is allowed.
    pub fn navigate(&self, target: &str) -> Result<Navigation, NavigationError> {
        let requested = normalize_path(target);
        let mut path = requested.clone();
        let mut redirects = Vec::new();

        loop {
            let next = match self.table.resolve(&path).and_then(|r| r.redirect.clone()) {
                Some(redirect) => redirect,
                None => match self.guard.check(&path, &self.store.read()) {
                    GuardDecision::Allow => break,
                    GuardDecision::RedirectTo(fallback) => fallback,
                },
            };

            if redirects.len() >= MAX_REDIRECTS {
                let mut hops = vec![requested.clone()];
                hops.extend(redirects);
                warn!(path = %requested, "Redirect loop detected");
                return Err(NavigationError::RedirectLoop {
                    target: requested,
                    hops,
                });
            }

            debug!(from = %path, to = %next, "Redirecting");
            path = normalize_path(&next);
            redirects.push(path.clone());
        }

        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(path.clone());
        debug!(path = %path, "Navigation committed");

        Ok(Navigation {
            requested,
            committed: path,
            redirects,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{CredentialPatch, MemoryStore};
    use crate::routing::table::RouteDescriptor;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    fn store() -> CredentialStore {
        CredentialStore::open(Arc::new(MemoryStore::new()), "nav-test").unwrap()
    }

    fn navigator(store: CredentialStore) -> Navigator {
        let table = RouteTable::new(
            vec![
                RouteDescriptor::new("/").public().redirect_to("/introduction"),
                RouteDescriptor::new("/introduction").public(),
                RouteDescriptor::new("/main").with_children(vec![
                    RouteDescriptor::new("").redirect_to("/main/game"),
                    RouteDescriptor::new("game"),
                ]),
                RouteDescriptor::new("/ping").public().redirect_to("/pong"),
                RouteDescriptor::new("/pong").public().redirect_to("/ping"),
            ],
            "/introduction",
        )
        .unwrap();
        Navigator::new(Arc::new(table), store)
    }

    fn never_expiring_token() -> String {
        format!("e30.{}.sig", URL_SAFE_NO_PAD.encode(r#"{"userId":1}"#))
    }

    #[test]
    fn test_denied_navigation_lands_on_fallback() {
        let nav = navigator(store());
        let result = nav.navigate("/main/game").unwrap();
        assert_eq!(result.committed, "/introduction");
        assert_eq!(result.redirects, vec!["/introduction".to_string()]);
        assert_eq!(nav.current().as_deref(), Some("/introduction"));
    }

    #[test]
    fn test_static_redirects_then_guard() {
        let nav = navigator(store());
        let result = nav.navigate("/main").unwrap();
        assert_eq!(
            result.redirects,
            vec!["/main/game".to_string(), "/introduction".to_string()]
        );
    }

    #[test]
    fn test_root_redirects_to_introduction() {
        let nav = navigator(store());
        let result = nav.navigate("/").unwrap();
        assert_eq!(result.committed, "/introduction");
        assert!(result.was_redirected());
    }

    #[test]
    fn test_valid_session_reaches_protected_route() {
        let store = store();
        store.merge_update(CredentialPatch::session("1", "alice", never_expiring_token()));
        let nav = navigator(store);

        let result = nav.navigate("/main").unwrap();
        assert_eq!(result.committed, "/main/game");
        assert_eq!(nav.current().as_deref(), Some("/main/game"));
    }

    #[test]
    fn test_guard_sees_latest_store_contents() {
        let store = store();
        store.merge_update(CredentialPatch::token(never_expiring_token()));
        let nav = navigator(store.clone());
        assert_eq!(nav.navigate("/main/game").unwrap().committed, "/main/game");

        store.clear();
        assert_eq!(nav.navigate("/main/game").unwrap().committed, "/introduction");
    }

    #[test]
    fn test_redirect_loop_is_reported_and_location_kept() {
        let nav = navigator(store());
        nav.navigate("/introduction").unwrap();

        let err = nav.navigate("/ping").unwrap_err();
        let NavigationError::RedirectLoop { target, hops } = err;
        assert_eq!(target, "/ping");
        assert_eq!(hops.len(), MAX_REDIRECTS + 1);
        assert_eq!(nav.current().as_deref(), Some("/introduction"));
    }
}

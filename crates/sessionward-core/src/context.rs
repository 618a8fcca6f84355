//! Explicit construction of the session layer.
//!
//! Everything that reads or writes the session gets the same
//! `CredentialStore` handle from here. The store is rehydrated before the
//! API client or the navigator exist, so neither can observe an empty store
//! that is about to be filled from disk.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::debug;

use crate::api::{effect_channel, ApiClient, Effect, Severity};
use crate::auth::{CredentialStore, DurableStore, FileStore, KeyringStore};
use crate::config::{Config, StorageBackend};
use crate::routing::{
    application_routes, Navigation, NavigationError, Navigator, RouteDescriptor, RouteTable,
};

pub struct SessionContext {
    pub config: Config,
    pub store: CredentialStore,
    pub api: ApiClient,
    pub navigator: Navigator,
}

impl SessionContext {
    /// Build the context on the configured storage backend and the
    /// application's route table.
    pub fn init(config: Config) -> Result<(Self, mpsc::UnboundedReceiver<Effect>)> {
        let durable: Arc<dyn DurableStore> = match config.storage_backend {
            StorageBackend::File => Arc::new(FileStore::new(config.storage_dir()?)),
            StorageBackend::Keyring => Arc::new(KeyringStore),
        };
        Self::build(config, durable, application_routes())
    }

    /// Build the context from explicit parts
    pub fn build(
        config: Config,
        durable: Arc<dyn DurableStore>,
        routes: Vec<RouteDescriptor>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<Effect>)> {
        let store = CredentialStore::open(durable, config.storage_key.clone())?;
        let table = RouteTable::new(routes, &config.fallback_route)
            .context("Invalid route table")?;

        let (effects, rx) = effect_channel();
        let api = ApiClient::new(&config, store.clone(), effects)?;
        let navigator = Navigator::new(Arc::new(table), store.clone());
        debug!(base_url = %config.base_url, "Session context ready");

        Ok((
            Self {
                config,
                store,
                api,
                navigator,
            },
            rx,
        ))
    }

    /// Carry out one effect emitted by the request pipeline.
    ///
    /// Navigations go through the navigator (and so through the guard);
    /// notifications are handed to `notify`.
    pub fn apply(
        &self,
        effect: Effect,
        mut notify: impl FnMut(&str, Severity),
    ) -> Result<Option<Navigation>, NavigationError> {
        match effect {
            Effect::Notify { message, severity } => {
                notify(&message, severity);
                Ok(None)
            }
            Effect::Navigate { path } => self.navigator.navigate(&path).map(Some),
        }
    }
}

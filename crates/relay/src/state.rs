//! Shared handler state.

use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use notify::Notifier;
use relay_config::ConfigStore;

use crate::pages::{PageError, Pages};

/// State shared by all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Relay settings
    pub store: ConfigStore,
    /// Card rendering and delivery
    pub notifier: Arc<Notifier>,
    /// HTML page templates
    pub pages: Arc<Pages>,
    /// Cookie signing key
    key: Key,
}

impl AppState {
    /// Build the state, compiling the page templates.
    pub fn new(store: ConfigStore, notifier: Notifier, key: Key) -> Result<Self, PageError> {
        Ok(Self {
            store,
            notifier: Arc::new(notifier),
            pages: Arc::new(Pages::new()?),
            key,
        })
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.key.clone()
    }
}

//! Shared, lock-guarded settings store.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::ConfigError;
use crate::repository::ConfigRepository;
use crate::settings::{parse_template, Settings, SettingsUpdate};

/// In-memory settings backed by a [`ConfigRepository`].
///
/// Cloning is cheap; all clones share the same record.
#[derive(Clone)]
pub struct ConfigStore {
    current: Arc<RwLock<Settings>>,
    repository: Arc<dyn ConfigRepository>,
}

impl ConfigStore {
    /// Load the record from `repository`.
    ///
    /// Callers are expected to treat a failure here as fatal.
    pub async fn load(repository: Arc<dyn ConfigRepository>) -> Result<Self, ConfigError> {
        let settings = repository.load().await?;
        info!(
            location = %repository.location(),
            webhook_configured = !settings.webhook_url.is_empty(),
            "Configuration loaded"
        );

        Ok(Self {
            current: Arc::new(RwLock::new(settings)),
            repository,
        })
    }

    /// Copy of the current record.
    pub async fn snapshot(&self) -> Settings {
        self.current.read().await.clone()
    }

    /// Field by persisted key, or `default` when absent.
    pub async fn get(&self, key: &str, default: Value) -> Value {
        self.current.read().await.get(key).unwrap_or(default)
    }

    /// Apply an admin update and persist it.
    ///
    /// The template is validated before anything changes, and memory is only
    /// updated once the repository accepted the new record. On error both the
    /// stored and in-memory record are left as they were.
    pub async fn save(&self, update: SettingsUpdate) -> Result<Settings, ConfigError> {
        let card_template = parse_template(&update.template).inspect_err(|e| {
            warn!(error = %e, "Rejected card template");
        })?;

        let mut current = self.current.write().await;
        let mut next = current.clone();
        next.webhook_url = update.webhook_url.trim().to_string();
        next.firing_title = optional(update.firing_title);
        next.resolved_title = optional(update.resolved_title);
        next.card_template = card_template;

        if let Err(e) = self.repository.save(&next).await {
            warn!(
                location = %self.repository.location(),
                error = %e,
                "Failed to persist configuration"
            );
            return Err(e);
        }

        *current = next.clone();
        info!(location = %self.repository.location(), "Configuration saved");
        Ok(next)
    }
}

fn optional(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

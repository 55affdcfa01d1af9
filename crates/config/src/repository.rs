//! Persistence backends for [`Settings`].

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::ConfigError;
use crate::settings::{to_pretty_json, validate_template, Settings};

/// Storage interface for the settings record.
#[async_trait]
pub trait ConfigRepository: Send + Sync {
    /// Human-readable location, used in logs.
    fn location(&self) -> String;

    /// Read the stored record.
    async fn load(&self) -> Result<Settings, ConfigError>;

    /// Replace the stored record.
    async fn save(&self, settings: &Settings) -> Result<(), ConfigError>;
}

/// JSON file on local disk.
pub struct FileRepository {
    path: PathBuf,
}

impl FileRepository {
    /// Create a repository backed by the file at `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl ConfigRepository for FileRepository {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    async fn load(&self) -> Result<Settings, ConfigError> {
        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|source| ConfigError::Read {
                path: self.path.clone(),
                source,
            })?;

        let settings: Settings =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: self.path.clone(),
                source,
            })?;
        validate_template(&settings.card_template)?;

        debug!(path = %self.path.display(), "Loaded config file");
        Ok(settings)
    }

    async fn save(&self, settings: &Settings) -> Result<(), ConfigError> {
        let content = to_pretty_json(settings).map_err(ConfigError::Serialize)?;

        // Write next to the target and rename so a failed write never truncates it
        let staging = self.staging_path();
        fs::write(&staging, content)
            .await
            .map_err(|source| ConfigError::Write {
                path: staging.clone(),
                source,
            })?;
        fs::rename(&staging, &self.path)
            .await
            .map_err(|source| ConfigError::Write {
                path: self.path.clone(),
                source,
            })?;

        debug!(path = %self.path.display(), "Wrote config file");
        Ok(())
    }
}

/// In-memory record, for embedding and tests.
pub struct MemoryRepository {
    settings: Mutex<Option<Settings>>,
    read_only: bool,
}

impl MemoryRepository {
    /// Create a repository holding `settings`.
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Mutex::new(Some(settings)),
            read_only: false,
        }
    }

    /// Create a repository whose saves always fail.
    #[must_use]
    pub fn read_only(settings: Settings) -> Self {
        Self {
            settings: Mutex::new(Some(settings)),
            read_only: true,
        }
    }

    /// Currently stored record.
    pub async fn stored(&self) -> Option<Settings> {
        self.settings.lock().await.clone()
    }
}

#[async_trait]
impl ConfigRepository for MemoryRepository {
    fn location(&self) -> String {
        "memory".to_string()
    }

    async fn load(&self) -> Result<Settings, ConfigError> {
        self.settings
            .lock()
            .await
            .clone()
            .ok_or_else(|| ConfigError::Read {
                path: PathBuf::from("memory"),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no settings stored"),
            })
    }

    async fn save(&self, settings: &Settings) -> Result<(), ConfigError> {
        if self.read_only {
            return Err(ConfigError::Write {
                path: PathBuf::from("memory"),
                source: std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "repository is read-only",
                ),
            });
        }
        *self.settings.lock().await = Some(settings.clone());
        Ok(())
    }
}

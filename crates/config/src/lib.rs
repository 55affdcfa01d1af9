//! Settings store for the Feishu alert relay.
//!
//! The relay keeps one flat record (webhook URL, card titles, card template
//! and admin credentials) in a JSON file. [`ConfigStore`] loads it once at
//! startup, serves copies to request handlers and writes admin updates back
//! through a [`ConfigRepository`].

pub mod error;
pub mod repository;
pub mod settings;
pub mod store;

pub use error::ConfigError;
pub use repository::{ConfigRepository, FileRepository, MemoryRepository};
pub use settings::{
    parse_template, to_pretty_json, validate_template, Settings, SettingsUpdate,
    DEFAULT_FIRING_TITLE, DEFAULT_RESOLVED_TITLE,
};
pub use store::ConfigStore;

//! Error types for the notification system.

use thiserror::Error;

/// Errors that can occur when sending notifications.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Webhook URL is missing or still the example placeholder
    #[error("Channel not configured: {0}")]
    NotConfigured(String),

    /// HTTP request failed (connect, timeout, ...)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Webhook answered with a non-success status
    #[error("Webhook returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// Webhook accepted the request but reported an error code
    #[error("Webhook rejected the message (code {code}): {message}")]
    Rejected { code: i64, message: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised while rendering a card from the template.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    /// A template string names a placeholder that is not supplied
    #[error("unknown placeholder {{{name}}} in template")]
    UnknownPlaceholder { name: String },

    /// A template string has an unbalanced brace
    #[error("malformed placeholder in {template:?}: {reason}")]
    MalformedPlaceholder {
        template: String,
        reason: &'static str,
    },

    /// The template has no `card.elements` array
    #[error("card template has no \"card.elements\" array")]
    MissingElements,
}

/// Errors from rendering and delivering a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Channel(#[from] ChannelError),
}

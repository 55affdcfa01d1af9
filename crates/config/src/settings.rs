//! The persisted settings record.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ConfigError;

/// Header title used for firing notifications when none is configured.
pub const DEFAULT_FIRING_TITLE: &str = "🚨 告警已触发";

/// Header title used for resolved notifications when none is configured.
pub const DEFAULT_RESOLVED_TITLE: &str = "✅ 告警已恢复";

/// Relay settings as stored in `config.json`.
///
/// Keys the relay does not know about are kept in [`Settings::extra`] and
/// written back untouched on save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Feishu custom bot webhook URL
    #[serde(rename = "FEISHU_WEBHOOK_URL", default)]
    pub webhook_url: String,

    /// Header title for firing alerts
    #[serde(
        rename = "FIRING_TITLE",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub firing_title: Option<String>,

    /// Header title for resolved alerts
    #[serde(
        rename = "RESOLVED_TITLE",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub resolved_title: Option<String>,

    /// Feishu interactive card template (`card.config` + `card.elements`)
    #[serde(rename = "FEISHU_CARD_TEMPLATE")]
    pub card_template: Value,

    /// Admin username
    #[serde(rename = "USERNAME", default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Admin password, compared in plain text
    #[serde(rename = "PASSWORD", default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Unrecognized keys
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Settings {
    /// Firing header title, falling back to [`DEFAULT_FIRING_TITLE`].
    #[must_use]
    pub fn firing_title(&self) -> &str {
        non_empty(self.firing_title.as_deref()).unwrap_or(DEFAULT_FIRING_TITLE)
    }

    /// Resolved header title, falling back to [`DEFAULT_RESOLVED_TITLE`].
    #[must_use]
    pub fn resolved_title(&self) -> &str {
        non_empty(self.resolved_title.as_deref()).unwrap_or(DEFAULT_RESOLVED_TITLE)
    }

    /// Check submitted credentials against the configured admin account.
    ///
    /// Always fails when no username or password is configured.
    #[must_use]
    pub fn check_credentials(&self, username: &str, password: &str) -> bool {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(expected_user), Some(expected_pass)) => {
                expected_user == username && expected_pass == password
            }
            _ => false,
        }
    }

    /// Look up a field by its persisted key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(mut fields)) => fields.remove(key),
            _ => None,
        }
    }
}

/// Fields submitted from the admin page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    pub webhook_url: String,
    pub firing_title: String,
    pub resolved_title: String,
    /// Card template as raw JSON text
    pub template: String,
}

/// Parse and shape-check a card template submitted as JSON text.
pub fn parse_template(raw: &str) -> Result<Value, ConfigError> {
    let template: Value = serde_json::from_str(raw).map_err(ConfigError::TemplateParse)?;
    validate_template(&template)?;
    Ok(template)
}

/// Ensure a card template carries a `card` object with an `elements` array.
pub fn validate_template(template: &Value) -> Result<(), ConfigError> {
    let card = template
        .get("card")
        .and_then(Value::as_object)
        .ok_or_else(|| ConfigError::TemplateShape("missing \"card\" object".to_string()))?;

    match card.get("elements") {
        Some(Value::Array(_)) => {}
        Some(_) => {
            return Err(ConfigError::TemplateShape(
                "\"card.elements\" must be an array".to_string(),
            ))
        }
        None => {
            return Err(ConfigError::TemplateShape(
                "missing \"card.elements\" array".to_string(),
            ))
        }
    }

    if let Some(config) = card.get("config") {
        if !config.is_object() {
            return Err(ConfigError::TemplateShape(
                "\"card.config\" must be an object".to_string(),
            ));
        }
    }

    Ok(())
}

/// Serialize with four-space indentation, keeping non-ASCII text as is.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    // serde_json only ever emits UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

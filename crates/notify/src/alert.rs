//! Alertmanager webhook types.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Alertmanager webhook payload.
///
/// Reference: <https://prometheus.io/docs/alerting/latest/configuration/#webhook_config>
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    /// Status: "firing" or "resolved"; an explicit `null` reads as empty
    #[serde(default = "default_status", deserialize_with = "null_as_default")]
    pub status: String,
    /// Receiver that matched this group
    #[serde(default)]
    pub receiver: Option<String>,
    /// Unique identifier for this group of alerts
    #[serde(default)]
    pub group_key: Option<String>,
    /// Labels common to all alerts
    #[serde(default)]
    pub common_labels: BTreeMap<String, String>,
    /// List of alerts in this notification
    #[serde(default, deserialize_with = "null_as_default")]
    pub alerts: Vec<Alert>,
}

fn default_status() -> String {
    Status::Firing.as_str().to_string()
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Individual alert from Alertmanager.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// Per-alert status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Alert labels
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Alert annotations
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    /// When the alert started firing, as sent (ISO-8601)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<String>,
    /// When the alert was resolved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<String>,
    /// Link back to the alert source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator_url: Option<String>,
    /// Unique fingerprint for this alert
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

impl Alert {
    /// Get the alert name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.labels.get("alertname").map_or("未知", String::as_str)
    }

    /// Get the severity.
    #[must_use]
    pub fn severity(&self) -> &str {
        self.labels.get("severity").map_or("info", String::as_str)
    }

    /// Get the instance label.
    #[must_use]
    pub fn instance(&self) -> &str {
        self.labels.get("instance").map_or("N/A", String::as_str)
    }

    /// Get the description annotation.
    #[must_use]
    pub fn description(&self) -> &str {
        self.annotations
            .get("description")
            .map_or("无描述", String::as_str)
    }

    /// Get the summary annotation.
    #[must_use]
    pub fn summary(&self) -> &str {
        self.annotations.get("summary").map_or("", String::as_str)
    }
}

/// Notification status, driving card color and title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Firing,
    Resolved,
}

impl Status {
    /// Interpret an Alertmanager status string.
    ///
    /// Anything other than `"firing"` counts as resolved.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        if label == "firing" {
            Self::Firing
        } else {
            Self::Resolved
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Firing => "firing",
            Self::Resolved => "resolved",
        }
    }

    /// Feishu card header template color.
    #[must_use]
    pub const fn color(&self) -> &'static str {
        match self {
            Self::Firing => "red",
            Self::Resolved => "green",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_defaults() {
        let payload: WebhookPayload = serde_json::from_value(json!({})).unwrap();
        assert_eq!(payload.status, "firing");
        assert!(payload.alerts.is_empty());
    }

    #[test]
    fn test_null_fields_read_as_empty() {
        let payload: WebhookPayload =
            serde_json::from_value(json!({"status": null, "alerts": null})).unwrap();
        assert!(payload.alerts.is_empty());
        assert_eq!(payload.status, "");
        assert_eq!(Status::from_label(&payload.status), Status::Resolved);
    }

    #[test]
    fn test_alertmanager_payload() {
        let payload: WebhookPayload = serde_json::from_value(json!({
            "version": "4",
            "groupKey": "{}:{alertname=\"HighCPU\"}",
            "status": "resolved",
            "receiver": "feishu",
            "alerts": [{
                "status": "resolved",
                "labels": {"alertname": "HighCPU", "instance": "node-1:9100"},
                "annotations": {"summary": "CPU busy"},
                "startsAt": "2024-01-01T00:00:00Z",
                "endsAt": "2024-01-01T00:05:00Z",
                "fingerprint": "abc123"
            }]
        }))
        .unwrap();

        assert_eq!(Status::from_label(&payload.status), Status::Resolved);
        let alert = &payload.alerts[0];
        assert_eq!(alert.name(), "HighCPU");
        assert_eq!(alert.instance(), "node-1:9100");
        assert_eq!(alert.severity(), "info");
        assert_eq!(alert.description(), "无描述");
        assert_eq!(alert.summary(), "CPU busy");
        assert_eq!(alert.starts_at.as_deref(), Some("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn test_status_colors() {
        assert_eq!(Status::from_label("firing").color(), "red");
        assert_eq!(Status::from_label("resolved").color(), "green");
        assert_eq!(Status::from_label("unknown"), Status::Resolved);
    }
}

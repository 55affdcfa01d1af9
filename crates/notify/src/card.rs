//! Feishu interactive card rendering.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use relay_config::Settings;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::alert::{Alert, Status};
use crate::error::RenderError;
use crate::placeholder::{substitute, Placeholders};

/// Offset used when displaying alert start times (UTC+8).
const DISPLAY_OFFSET_SECS: i32 = 8 * 3600;

/// Display format for alert start times.
const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render one card for a batch of alerts.
///
/// Every alert gets its own substituted copy of the template's
/// `card.elements`; the copies are concatenated in alert order. The stored
/// template is never modified.
pub fn render(
    alerts: &[Alert],
    status: Status,
    settings: &Settings,
) -> Result<CardMessage, RenderError> {
    let card = settings
        .card_template
        .get("card")
        .ok_or(RenderError::MissingElements)?;
    let template_elements = card
        .get("elements")
        .and_then(Value::as_array)
        .ok_or(RenderError::MissingElements)?;

    let card_color = status.color();
    let header_title = match status {
        Status::Firing => settings.firing_title(),
        Status::Resolved => settings.resolved_title(),
    };

    let mut elements = Vec::with_capacity(template_elements.len() * alerts.len());
    for alert in alerts {
        let vars = Placeholders::new()
            .with("alertname", alert.name())
            .with("severity", alert.severity())
            .with("instance", alert.instance())
            .with("description", alert.description())
            .with("summary", alert.summary())
            .with("start_time", format_start_time(alert.starts_at.as_deref()))
            .with("status", status.as_str())
            .with("card_color", card_color)
            .with("header_title", header_title);

        for element in template_elements {
            elements.push(substitute(element, &vars)?);
        }
    }

    Ok(CardMessage {
        msg_type: "interactive".to_string(),
        card: Card {
            config: card.get("config").cloned(),
            header: CardHeader {
                template: card_color.to_string(),
                title: CardText {
                    content: header_title.to_string(),
                    tag: "plain_text".to_string(),
                },
            },
            elements,
        },
    })
}

/// Format an alert start time for display in UTC+8.
///
/// Timestamps with an offset are converted; naive timestamps are read as
/// UTC. Anything unparsable is returned unchanged, and a missing value
/// renders as `N/A`.
#[must_use]
pub fn format_start_time(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return "N/A".to_string();
    };
    let Some(offset) = FixedOffset::east_opt(DISPLAY_OFFSET_SECS) else {
        return raw.to_string();
    };

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return ts.with_timezone(&offset).format(DISPLAY_FORMAT).to_string();
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return naive
            .and_utc()
            .with_timezone(&offset)
            .format(DISPLAY_FORMAT)
            .to_string();
    }

    raw.to_string()
}

// =============================================================================
// Feishu API types
// =============================================================================

/// Body posted to a Feishu custom bot webhook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardMessage {
    pub msg_type: String,
    pub card: Card,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
    pub header: CardHeader,
    pub elements: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardHeader {
    /// Header color
    pub template: String,
    pub title: CardText,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardText {
    pub content: String,
    pub tag: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn settings(elements: Value) -> Settings {
        serde_json::from_value(json!({
            "FEISHU_WEBHOOK_URL": "https://open.feishu.cn/open-apis/bot/v2/hook/abc",
            "FEISHU_CARD_TEMPLATE": {
                "card": {
                    "config": {"wide_screen_mode": true},
                    "elements": elements
                }
            }
        }))
        .unwrap()
    }

    fn alert(name: &str, starts_at: &str) -> Alert {
        Alert {
            labels: BTreeMap::from([
                ("alertname".to_string(), name.to_string()),
                ("severity".to_string(), "critical".to_string()),
                ("instance".to_string(), "node-1:9100".to_string()),
            ]),
            annotations: BTreeMap::from([(
                "description".to_string(),
                "CPU above 90%".to_string(),
            )]),
            starts_at: Some(starts_at.to_string()),
            ..Alert::default()
        }
    }

    #[test]
    fn test_start_time_conversion() {
        assert_eq!(
            format_start_time(Some("2024-01-01T00:00:00Z")),
            "2024-01-01 08:00:00"
        );
        assert_eq!(
            format_start_time(Some("2024-01-01T20:30:15.123456789Z")),
            "2024-01-02 04:30:15"
        );
        assert_eq!(
            format_start_time(Some("2024-01-01T10:00:00+02:00")),
            "2024-01-01 16:00:00"
        );
        assert_eq!(
            format_start_time(Some("2024-01-01T00:00:00")),
            "2024-01-01 08:00:00"
        );
    }

    #[test]
    fn test_start_time_passthrough() {
        assert_eq!(format_start_time(Some("yesterday")), "yesterday");
        assert_eq!(format_start_time(Some("")), "");
        assert_eq!(format_start_time(None), "N/A");
    }

    #[test]
    fn test_render_firing_card() {
        let settings = settings(json!([
            {"tag": "div", "text": {"tag": "lark_md", "content": "**{alertname}** on {instance}"}},
            {"tag": "div", "text": {"tag": "lark_md", "content": "{start_time} | {severity} | {description}"}}
        ]));

        let card = render(
            &[alert("HighCPU", "2024-01-01T00:00:00Z")],
            Status::Firing,
            &settings,
        )
        .unwrap();

        assert_eq!(card.msg_type, "interactive");
        assert_eq!(card.card.header.template, "red");
        assert_eq!(card.card.header.title.content, "🚨 告警已触发");
        assert_eq!(card.card.header.title.tag, "plain_text");
        assert_eq!(card.card.config, Some(json!({"wide_screen_mode": true})));
        assert_eq!(card.card.elements.len(), 2);
        assert_eq!(
            card.card.elements[0]["text"]["content"],
            "**HighCPU** on node-1:9100"
        );
        assert_eq!(
            card.card.elements[1]["text"]["content"],
            "2024-01-01 08:00:00 | critical | CPU above 90%"
        );
    }

    #[test]
    fn test_render_resolved_defaults() {
        let settings = settings(json!([
            {"tag": "markdown", "content": "{header_title} / {card_color} / {alertname} / {instance} / {description} / {severity}"}
        ]));

        let card = render(&[Alert::default()], Status::Resolved, &settings).unwrap();

        assert_eq!(card.card.header.template, "green");
        assert_eq!(card.card.header.title.content, "✅ 告警已恢复");
        assert_eq!(
            card.card.elements[0]["content"],
            "✅ 告警已恢复 / green / 未知 / N/A / 无描述 / info"
        );
    }

    #[test]
    fn test_elements_concatenated_per_alert() {
        let settings = settings(json!([
            {"tag": "div", "text": {"content": "{alertname}"}},
            {"tag": "hr"}
        ]));
        let alerts = [
            alert("First", "2024-01-01T00:00:00Z"),
            alert("Second", "2024-01-01T00:00:00Z"),
            alert("Third", "2024-01-01T00:00:00Z"),
        ];

        let card = render(&alerts, Status::Firing, &settings).unwrap();

        assert_eq!(card.card.elements.len(), 6);
        assert_eq!(card.card.elements[0]["text"]["content"], "First");
        assert_eq!(card.card.elements[2]["text"]["content"], "Second");
        assert_eq!(card.card.elements[4]["text"]["content"], "Third");
        assert_eq!(card.card.elements[5], json!({"tag": "hr"}));
    }

    #[test]
    fn test_render_leaves_template_untouched() {
        let settings = settings(json!([{"tag": "div", "text": {"content": "{alertname}"}}]));
        let before = settings.card_template.clone();

        for name in ["A", "B"] {
            let card = render(
                &[alert(name, "2024-01-01T00:00:00Z")],
                Status::Firing,
                &settings,
            )
            .unwrap();
            assert_eq!(card.card.elements[0]["text"]["content"], name);
        }

        assert_eq!(settings.card_template, before);
    }

    #[test]
    fn test_unknown_placeholder_fails_batch() {
        let settings = settings(json!([{"tag": "div", "text": {"content": "{namespace}"}}]));

        let err = render(
            &[alert("HighCPU", "2024-01-01T00:00:00Z")],
            Status::Firing,
            &settings,
        )
        .unwrap_err();
        assert_eq!(
            err,
            RenderError::UnknownPlaceholder {
                name: "namespace".to_string()
            }
        );
    }

    #[test]
    fn test_configured_titles() {
        let mut settings = settings(json!([]));
        settings.firing_title = Some("生产环境告警".to_string());
        settings.resolved_title = Some("生产环境恢复".to_string());

        let firing = render(&[], Status::Firing, &settings).unwrap();
        let resolved = render(&[], Status::Resolved, &settings).unwrap();
        assert_eq!(firing.card.header.title.content, "生产环境告警");
        assert_eq!(resolved.card.header.title.content, "生产环境恢复");
        assert!(firing.card.elements.is_empty());
    }

    #[test]
    fn test_missing_elements() {
        let mut settings = settings(json!([]));
        settings.card_template = json!({"card": {"config": {}}});

        assert_eq!(
            render(&[Alert::default()], Status::Firing, &settings),
            Err(RenderError::MissingElements)
        );
    }
}

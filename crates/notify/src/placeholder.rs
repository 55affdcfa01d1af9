//! Named placeholder substitution over JSON card templates.
//!
//! Template strings use `{name}` placeholders; `{{` and `}}` produce literal
//! braces. A conversion or format spec after the name (`{name!r}`,
//! `{name:>8}`) is accepted but not applied, so `{name:>8}` inserts the
//! bare unpadded value.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::RenderError;

/// Values available to template strings for one alert.
#[derive(Debug, Clone, Default)]
pub struct Placeholders {
    values: BTreeMap<&'static str, String>,
}

impl Placeholders {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a placeholder value.
    #[must_use]
    pub fn with(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.values.insert(name, value.into());
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

/// Produce a substituted copy of `node`.
///
/// Object keys and non-string leaves are copied as is.
pub fn substitute(node: &Value, vars: &Placeholders) -> Result<Value, RenderError> {
    Ok(match node {
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(key, value)| Ok((key.clone(), substitute(value, vars)?)))
                .collect::<Result<Map<String, Value>, RenderError>>()?,
        ),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| substitute(item, vars))
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Value::String(text) => Value::String(format_str(text, vars)?),
        other => other.clone(),
    })
}

/// Substitute placeholders in a single template string.
pub fn format_str(template: &str, vars: &Placeholders) -> Result<String, RenderError> {
    let malformed = |reason| RenderError::MalformedPlaceholder {
        template: template.to_string(),
        reason,
    };

    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '{' => {
                let mut field = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some('{') => return Err(malformed("nested '{' in placeholder")),
                        Some(ch) => field.push(ch),
                        None => return Err(malformed("unclosed '{'")),
                    }
                }

                let name = field.split([':', '!']).next().unwrap_or_default();
                let value = vars
                    .get(name)
                    .ok_or_else(|| RenderError::UnknownPlaceholder {
                        name: name.to_string(),
                    })?;
                out.push_str(value);
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '}' => return Err(malformed("single '}' outside a placeholder")),
            _ => out.push(c),
        }
    }

    Ok(out)
}

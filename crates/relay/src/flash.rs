//! One-shot status messages carried to the next page in a signed cookie.

use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};
use serde::{Deserialize, Serialize};
use tracing::warn;

const FLASH_COOKIE: &str = "flash";

/// Message category, used as a CSS class on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Success,
    Error,
    Info,
}

/// A message shown once on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub category: Category,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            category: Category::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            category: Category::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            category: Category::Info,
            message: message.into(),
        }
    }
}

/// Queue `flash` for the next page render.
#[must_use]
pub fn push(jar: SignedCookieJar, flash: Flash) -> SignedCookieJar {
    let mut pending = read(&jar);
    pending.push(flash);

    match serde_json::to_vec(&pending) {
        Ok(encoded) => {
            let cookie = Cookie::build((FLASH_COOKIE, hex::encode(encoded)))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax);
            jar.add(cookie)
        }
        Err(e) => {
            warn!(error = %e, "Failed to encode flash message");
            jar
        }
    }
}

/// Drain queued messages.
#[must_use]
pub fn take(jar: SignedCookieJar) -> (SignedCookieJar, Vec<Flash>) {
    let pending = read(&jar);
    if pending.is_empty() {
        return (jar, pending);
    }
    (jar.remove(Cookie::build(FLASH_COOKIE).path("/")), pending)
}

fn read(jar: &SignedCookieJar) -> Vec<Flash> {
    jar.get(FLASH_COOKIE)
        .and_then(|cookie| hex::decode(cookie.value()).ok())
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .unwrap_or_default()
}

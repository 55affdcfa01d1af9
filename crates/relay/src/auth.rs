//! Admin session handling.
//!
//! A session is a signed cookie holding the admin username. It is only
//! honoured while that name still matches the configured `USERNAME`.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};
use tracing::debug;

use crate::flash::{self, Flash};
use crate::state::AppState;

const SESSION_COOKIE: &str = "session";

/// Shown after an unauthenticated request is sent to the login page.
pub const LOGIN_REQUIRED: &str = "请登录以访问此页面。";

/// Proof that the request carries a valid admin session.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub username: String,
}

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = SignedCookieJar::from_headers(&parts.headers, Key::from_ref(state));

        if let Some(username) = session_user(&jar) {
            let settings = state.store.snapshot().await;
            if settings.username.as_deref() == Some(username.as_str()) {
                return Ok(Self { username });
            }
        }

        debug!(path = %parts.uri.path(), "Unauthenticated admin request");
        let jar = flash::push(jar, Flash::info(LOGIN_REQUIRED));
        Err((jar, Redirect::to("/login")).into_response())
    }
}

/// Start a session for `username`.
#[must_use]
pub fn login(jar: SignedCookieJar, username: &str) -> SignedCookieJar {
    let cookie = Cookie::build((SESSION_COOKIE, hex::encode(username)))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    jar.add(cookie)
}

/// End the current session.
#[must_use]
pub fn logout(jar: SignedCookieJar) -> SignedCookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

fn session_user(jar: &SignedCookieJar) -> Option<String> {
    let cookie = jar.get(SESSION_COOKIE)?;
    let bytes = hex::decode(cookie.value()).ok()?;
    String::from_utf8(bytes).ok()
}

//! HTTP surface: Alertmanager webhook, admin pages and session routes.

use std::collections::BTreeMap;
use std::slice;

use anyhow::Result;
use axum::{
    body::Bytes,
    extract::{rejection::FormRejection, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use axum_extra::extract::cookie::SignedCookieJar;
use chrono::{SecondsFormat, Utc};
use notify::{Alert, ChannelError, NotifyError, RenderError, Status, WebhookPayload};
use relay_config::{to_pretty_json, ConfigError, SettingsUpdate};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::auth::{self, AdminSession};
use crate::flash::{self, Flash};
use crate::pages::{AdminPage, IndexPage, LoginPage};
use crate::state::AppState;

const INVALID_CREDENTIALS: &str = "无效的凭据";

/// Build the HTTP router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/webhook", post(webhook_handler))
        .route("/login", get(login_page_handler).post(login_handler))
        .route("/logout", get(logout_handler))
        .route("/admin", get(admin_handler))
        .route("/save", post(save_handler))
        .route("/test", post(test_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server and run until `ctrl-c`.
///
/// # Errors
///
/// Returns an error if the server fails to bind or serve.
pub async fn run_server(state: AppState, addr: &str) -> Result<()> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Feishu relay listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutting down");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Webhook
// ============================================================================

/// Webhook response body.
#[derive(Debug, Serialize)]
struct WebhookResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

/// Failures that turn a webhook call into a 500.
#[derive(Debug, Error)]
enum WebhookError {
    #[error("invalid webhook payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Alertmanager webhook handler.
async fn webhook_handler(State(state): State<AppState>, body: Bytes) -> Response {
    match process_webhook(&state, &body).await {
        Ok(()) => (
            StatusCode::OK,
            Json(WebhookResponse {
                status: "success",
                message: None,
            }),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to process webhook request");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(WebhookResponse {
                    status: "error",
                    message: Some(e.to_string()),
                }),
            )
                .into_response()
        }
    }
}

async fn process_webhook(state: &AppState, body: &[u8]) -> Result<(), WebhookError> {
    let payload: WebhookPayload = serde_json::from_slice(body)?;
    info!(
        alert_count = payload.alerts.len(),
        status = %payload.status,
        receiver = payload.receiver.as_deref().unwrap_or_default(),
        "Received alert webhook"
    );

    if payload.alerts.is_empty() {
        debug!("Webhook carried no alerts, nothing to send");
        return Ok(());
    }

    let settings = state.store.snapshot().await;
    let status = Status::from_label(&payload.status);

    match state
        .notifier
        .notify(&settings, &payload.alerts, status)
        .await
    {
        Ok(()) => Ok(()),
        Err(NotifyError::Render(e)) => Err(e.into()),
        // Delivery is best effort; the notifier already logged the cause
        Err(NotifyError::Channel(_)) => Ok(()),
    }
}

// ============================================================================
// Public pages
// ============================================================================

async fn index_handler(State(state): State<AppState>) -> Response {
    state.pages.render("index", &IndexPage { title: "飞书告警转发" })
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

// ============================================================================
// Session
// ============================================================================

#[derive(Debug, Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

async fn login_page_handler(State(state): State<AppState>, jar: SignedCookieJar) -> Response {
    let (jar, flashes) = flash::take(jar);
    let page = state.pages.render(
        "login",
        &LoginPage {
            title: "登录",
            flashes,
        },
    );
    (jar, page).into_response()
}

async fn login_handler(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let settings = state.store.snapshot().await;

    if settings.check_credentials(&form.username, &form.password) {
        info!(username = %form.username, "Admin logged in");
        let jar = auth::login(jar, &form.username);
        return (jar, Redirect::to("/admin")).into_response();
    }

    warn!(username = %form.username, "Rejected login attempt");
    let (jar, mut flashes) = flash::take(jar);
    flashes.push(Flash::error(INVALID_CREDENTIALS));
    let page = state.pages.render(
        "login",
        &LoginPage {
            title: "登录",
            flashes,
        },
    );
    (jar, page).into_response()
}

async fn logout_handler(session: AdminSession, jar: SignedCookieJar) -> Response {
    info!(username = %session.username, "Admin logged out");
    (auth::logout(jar), Redirect::to("/login")).into_response()
}

// ============================================================================
// Admin
// ============================================================================

async fn admin_handler(
    State(state): State<AppState>,
    session: AdminSession,
    jar: SignedCookieJar,
) -> Response {
    let settings = state.store.snapshot().await;
    let (jar, mut flashes) = flash::take(jar);

    let template_content = match to_pretty_json(&settings.card_template) {
        Ok(text) => text,
        Err(e) => {
            error!(error = %e, "Failed to format card template");
            flashes.push(Flash::error(format!("模板格式化失败: {e}")));
            String::new()
        }
    };

    let page = state.pages.render(
        "admin",
        &AdminPage {
            title: "告警管理",
            flashes,
            username: session.username,
            webhook_url: settings.webhook_url.clone(),
            firing_title: settings.firing_title().to_string(),
            resolved_title: settings.resolved_title().to_string(),
            template_content,
        },
    );
    (jar, page).into_response()
}

async fn save_handler(
    State(state): State<AppState>,
    session: AdminSession,
    jar: SignedCookieJar,
    form: Result<Form<SettingsUpdate>, FormRejection>,
) -> Response {
    let Form(update) = match form {
        Ok(form) => form,
        Err(rejection) => {
            warn!(error = %rejection, "Rejected malformed settings form");
            let message =
                Flash::error(format!("保存配置时出错: {}", rejection.body_text()));
            return (flash::push(jar, message), Redirect::to("/admin")).into_response();
        }
    };

    let message = match state.store.save(update).await {
        Ok(_) => {
            info!(username = %session.username, "Configuration updated from admin page");
            Flash::success("配置已成功保存！")
        }
        Err(ConfigError::TemplateParse(e)) => Flash::error(format!("模板的JSON格式无效。{e}")),
        Err(ConfigError::TemplateShape(reason)) => {
            Flash::error(format!("模板结构无效: {reason}"))
        }
        Err(e) => Flash::error(format!("保存配置时出错: {e}")),
    };

    (flash::push(jar, message), Redirect::to("/admin")).into_response()
}

async fn test_handler(
    State(state): State<AppState>,
    session: AdminSession,
    jar: SignedCookieJar,
) -> Response {
    info!(username = %session.username, "Sending test notification");

    let settings = state.store.snapshot().await;
    let alert = sample_alert();
    let message = match state
        .notifier
        .notify(&settings, slice::from_ref(&alert), Status::Firing)
        .await
    {
        Ok(()) => Flash::success("测试通知已成功发送！"),
        Err(NotifyError::Channel(ChannelError::NotConfigured(_))) => {
            Flash::error("发送测试通知失败: 飞书 Webhook URL 未正确配置。")
        }
        Err(e) => Flash::error(format!("发送测试通知失败: {e}")),
    };

    (flash::push(jar, message), Redirect::to("/admin")).into_response()
}

/// Synthetic alert used by the admin test button.
fn sample_alert() -> Alert {
    Alert {
        status: Some(Status::Firing.as_str().to_string()),
        labels: BTreeMap::from([
            ("alertname".to_string(), "测试告警".to_string()),
            ("severity".to_string(), "critical".to_string()),
            ("instance".to_string(), "localhost:9090".to_string()),
        ]),
        annotations: BTreeMap::from([(
            "description".to_string(),
            "这是一个来自管理页面的测试告警。".to_string(),
        )]),
        starts_at: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)),
        ..Alert::default()
    }
}

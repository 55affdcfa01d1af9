//! Server-rendered HTML pages.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use handlebars::Handlebars;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::flash::Flash;

/// Errors raised while compiling or rendering a page.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("failed to compile page template: {0}")]
    Template(#[from] Box<handlebars::TemplateError>),

    #[error("failed to render page: {0}")]
    Render(#[from] handlebars::RenderError),
}

/// Compiled page templates.
pub struct Pages {
    registry: Handlebars<'static>,
}

impl Pages {
    pub fn new() -> Result<Self, PageError> {
        let mut registry = Handlebars::new();

        for (name, source) in [
            ("head", include_str!("../templates/head.hbs")),
            ("flashes", include_str!("../templates/flashes.hbs")),
            ("index", include_str!("../templates/index.hbs")),
            ("login", include_str!("../templates/login.hbs")),
            ("admin", include_str!("../templates/admin.hbs")),
        ] {
            registry
                .register_template_string(name, source)
                .map_err(Box::new)?;
        }

        Ok(Self { registry })
    }

    /// Render `name` to a string.
    pub fn render_to_string<T: Serialize>(&self, name: &str, data: &T) -> Result<String, PageError> {
        Ok(self.registry.render(name, data)?)
    }

    /// Render `name` as an HTML response, or a 500 if rendering fails.
    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> Response {
        match self.render_to_string(name, data) {
            Ok(body) => Html(body).into_response(),
            Err(e) => {
                error!(page = name, error = %e, "Failed to render page");
                (StatusCode::INTERNAL_SERVER_ERROR, "页面渲染失败").into_response()
            }
        }
    }
}

/// Landing page data.
#[derive(Debug, Serialize)]
pub struct IndexPage {
    pub title: &'static str,
}

/// Login page data.
#[derive(Debug, Serialize)]
pub struct LoginPage {
    pub title: &'static str,
    pub flashes: Vec<Flash>,
}

/// Admin page data.
#[derive(Debug, Serialize)]
pub struct AdminPage {
    pub title: &'static str,
    pub flashes: Vec<Flash>,
    pub username: String,
    pub webhook_url: String,
    pub firing_title: String,
    pub resolved_title: String,
    pub template_content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pages_compile_and_escape() {
        let pages = Pages::new().unwrap();

        let html = pages
            .render_to_string(
                "admin",
                &AdminPage {
                    title: "告警管理",
                    flashes: vec![Flash::success("配置已成功保存！")],
                    username: "admin".to_string(),
                    webhook_url: "https://open.feishu.cn/open-apis/bot/v2/hook/abc".to_string(),
                    firing_title: "🚨 告警已触发".to_string(),
                    resolved_title: "✅ 告警已恢复".to_string(),
                    template_content: "{\"card\": \"<b>\"}".to_string(),
                },
            )
            .unwrap();

        assert!(html.contains("配置已成功保存！"));
        assert!(html.contains("flash success"));
        assert!(html.contains("&lt;b&gt;"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn test_login_page() {
        let pages = Pages::new().unwrap();
        let html = pages
            .render_to_string(
                "login",
                &LoginPage {
                    title: "登录",
                    flashes: vec![Flash::error("无效的凭据")],
                },
            )
            .unwrap();

        assert!(html.contains("无效的凭据"));
        assert!(html.contains("name=\"username\""));
        assert!(html.contains("name=\"password\""));
    }
}

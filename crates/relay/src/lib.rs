//! Relay Prometheus Alertmanager webhooks to Feishu.
//!
//! Routes:
//!
//! - `POST /webhook`: Alertmanager receiver, renders and sends one card per call
//! - `GET /`: landing page
//! - `GET|POST /login`, `GET /logout`: admin session
//! - `GET /admin`, `POST /save`: view and edit the relay settings
//! - `POST /test`: send a sample firing alert
//! - `GET /health`: liveness probe

pub mod auth;
pub mod flash;
pub mod pages;
pub mod server;
pub mod state;

pub use server::{build_router, run_server};
pub use state::AppState;

//! Web server adapter.
//!
//! Axum server with an HTMX-friendly frontend over the portfolio ledger.
//! All application routes sit behind axum-login; only the login page and
//! static assets are public.

mod auth;
mod error;
mod handlers;
mod templates;

pub use auth::{Backend, Credentials, User};
pub use error::WebError;
pub use handlers::*;
pub use templates::*;

use axum::{
    routing::{get, post},
    Router,
};
use axum_login::{login_required, AuthManagerLayerBuilder};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_sessions::cookie::Key;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::ports::config_port::ConfigPort;
use crate::ports::ledger_port::LedgerPort;
use crate::ports::quote_port::QuotePort;

pub type AuthSession = axum_login::AuthSession<Backend>;

pub struct AppState {
    pub ledger: Arc<dyn LedgerPort + Send + Sync>,
    pub quotes: Arc<dyn QuotePort + Send + Sync>,
    pub config: Arc<dyn ConfigPort + Send + Sync>,
}

/// Signing key for session cookies: `[auth] session_secret` as hex, or an
/// ephemeral key when absent (sessions then die with the process).
fn session_key(config: &dyn ConfigPort) -> Key {
    config
        .get_string("auth", "session_secret")
        .and_then(|hex_str| hex::decode(hex_str.trim()).ok())
        .and_then(|bytes| Key::try_from(bytes.as_slice()).ok())
        .unwrap_or_else(Key::generate)
}

fn app_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::dashboard))
        .route("/trades", get(handlers::trades_page).post(handlers::create_trade))
        .route("/trades/{id}/close", post(handlers::close_trade))
        .route("/trades/{id}/delete", post(handlers::delete_trade))
        .route("/cash", get(handlers::cash_page).post(handlers::create_cash))
        .route("/cash/{id}/delete", post(handlers::delete_cash))
        .route(
            "/sectors",
            get(handlers::sectors_page).post(handlers::set_sector_target),
        )
        .route("/risk", get(handlers::risk_page))
        .route("/levels/{symbol}", get(handlers::levels_page))
        .route("/export/trades.csv", get(handlers::export_trades_csv))
        .route("/export/cash.csv", get(handlers::export_cash_csv))
        .route("/import/trades", post(handlers::import_trades))
        .route("/import/cash", post(handlers::import_cash))
}

pub async fn build_router(state: AppState) -> Router {
    let lifetime_hours = state.config.get_int("auth", "session_lifetime", 24).max(1);

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_expiry(Expiry::OnInactivity(time::Duration::hours(lifetime_hours)))
        .with_signed(session_key(state.config.as_ref()));

    let backend = Backend::from_config(state.config.as_ref());
    let auth_layer = AuthManagerLayerBuilder::new(backend, session_layer).build();

    app_routes()
        .route_layer(login_required!(Backend, login_url = "/login"))
        .route("/login", get(handlers::login_form).post(handlers::login))
        .route("/logout", post(handlers::logout))
        .nest_service("/static", ServeDir::new("static"))
        .fallback(handlers::not_found)
        .layer(auth_layer)
        .with_state(Arc::new(state))
}

/// Router without the auth layer, for exercising handlers directly in tests.
pub fn build_test_router(state: AppState) -> Router {
    app_routes()
        .fallback(handlers::not_found)
        .with_state(Arc::new(state))
}

fn is_htmx_request(headers: &axum::http::HeaderMap) -> bool {
    headers.get("HX-Request").is_some()
}

//! esagate - a session-gated viewer for one esa.io team
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Authorization gate (middleware)              │
//! │  - public paths pass through                                │
//! │  - no session: start esa OAuth2 login                       │
//! │  - session: attach AuthenticatedIdentity                    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Handlers (Axum)                         │
//! │  - /posts/:id, /members/:id redirects                       │
//! │  - category listing (query translation + rendering)         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    esa API (reqwest)                         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: HTTP handlers
//! - `auth`: esa OAuth, signed-cookie sessions, authorization gate
//! - `esa`: upstream API client
//! - `render`: HTML views
//! - `config`: Configuration management
//! - `error`: Error types

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod esa;
pub mod render;

use std::sync::Arc;

/// Application state shared across all handlers
///
/// Read-only after startup; per-user state lives in the session cookie.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Signed-cookie session store
    pub sessions: auth::SessionStore,

    /// esa OAuth2 handshake
    pub oauth: Arc<auth::OAuthHandshake>,

    /// esa API client
    pub esa: Arc<esa::EsaClient>,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Errors
    /// Returns error if the provider endpoints cannot be derived from the
    /// configuration or the HTTP client cannot be built
    pub fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("esagate/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(config.esa.timeout_seconds))
            .build()
            .map_err(|e| error::AppError::Internal(e.into()))?;

        let provider = auth::OAuth2ProviderConfig::from_config(&config)?;
        tracing::info!(callback = %provider.callback_url, "OAuth2 provider configured");

        let api_endpoint = url::Url::parse(&config.esa.api_endpoint).map_err(|e| {
            error::AppError::Config(format!("'esa.api_endpoint' is invalid url: {e}"))
        })?;
        let esa = esa::EsaClient::new(http_client.clone(), &api_endpoint, &config.team)?;

        Ok(Self {
            sessions: auth::SessionStore::new(config.session_secret.clone(), config.cookie_secure),
            oauth: Arc::new(auth::OAuthHandshake::new(
                provider,
                http_client,
                config.cookie_secure,
            )),
            esa: Arc::new(esa),
            config: Arc::new(config),
        })
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::{Router, middleware};
    use tower_http::trace::TraceLayer;

    Router::new()
        .merge(api::health_router())
        .merge(auth::auth_router())
        .merge(api::browse_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

//! esa OAuth flow
//!
//! Implements the OAuth 2.0 authorization code flow with esa.io.

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use base64::{Engine as _, engine::general_purpose};
use rand::RngCore;
use serde::Deserialize;
use url::Url;

use super::session::{AuthenticatedIdentity, Session};
use crate::AppState;
use crate::config::AppConfig;
use crate::error::AppError;

/// Path esa redirects back to after the user approves the login
pub const CALLBACK_PATH: &str = "/auth/esa/callback";

/// Cookie holding the CSRF `state` nonce while the handshake is in flight
pub const STATE_COOKIE_NAME: &str = "_esagate_oauth_state";

const STATE_COOKIE_PATH: &str = "/auth";
const STATE_COOKIE_MAX_AGE_MINUTES: i64 = 10;
const ESA_SCOPE: &str = "read";

/// Create authentication router
///
/// Routes:
/// - GET /auth/esa/callback - OAuth callback
/// - GET /logout - Logout
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route(CALLBACK_PATH, get(esa_callback))
        .route("/logout", get(logout))
}

// =============================================================================
// Provider configuration
// =============================================================================

/// The single OAuth2 provider this gateway logs in against
///
/// Built once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct OAuth2ProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Absolute URL of [`CALLBACK_PATH`] on this gateway
    pub callback_url: Url,
    pub scope: String,
    pub authorize_url: Url,
    pub token_url: Url,
    /// Endpoint returning the logged-in user's profile
    pub user_url: Url,
}

impl OAuth2ProviderConfig {
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let redirect_host = Url::parse(&config.oauth2.redirect_host).map_err(|e| {
            AppError::Config(format!("'oauth2.redirect_host' is invalid url: {e}"))
        })?;
        let api = Url::parse(&config.esa.api_endpoint)
            .map_err(|e| AppError::Config(format!("'esa.api_endpoint' is invalid url: {e}")))?;

        Ok(Self {
            client_id: config.oauth2.client_id.clone(),
            client_secret: config.oauth2.client_secret.clone(),
            callback_url: join_path(&redirect_host, CALLBACK_PATH),
            scope: ESA_SCOPE.to_string(),
            authorize_url: join_path(&api, "/oauth/authorize"),
            token_url: join_path(&api, "/oauth/token"),
            user_url: join_path(&api, "/v1/user"),
        })
    }
}

/// Append `suffix` to the path of `base`, keeping any prefix path
fn join_path(base: &Url, suffix: &str) -> Url {
    let mut url = base.clone();
    let prefix = base.path().trim_end_matches('/');
    url.set_path(&format!("{}/{}", prefix, suffix.trim_start_matches('/')));
    url
}

// =============================================================================
// Handshake
// =============================================================================

/// Query parameters esa sends to the callback
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    /// Authorization code
    pub code: Option<String>,
    /// CSRF state token
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// esa token response
#[derive(Debug, Deserialize)]
struct EsaTokenResponse {
    access_token: String,
}

/// esa user info
#[derive(Debug, Deserialize)]
struct EsaUser {
    id: u64,
    #[serde(default)]
    name: String,
    screen_name: String,
    icon: Option<String>,
    email: Option<String>,
}

/// Drives the authorization code exchange against [`OAuth2ProviderConfig`]
#[derive(Clone)]
pub struct OAuthHandshake {
    provider: OAuth2ProviderConfig,
    http: reqwest::Client,
    secure_cookies: bool,
}

impl OAuthHandshake {
    pub fn new(provider: OAuth2ProviderConfig, http: reqwest::Client, secure_cookies: bool) -> Self {
        Self {
            provider,
            http,
            secure_cookies,
        }
    }

    pub fn provider(&self) -> &OAuth2ProviderConfig {
        &self.provider
    }

    /// Start a login
    ///
    /// # Steps
    /// 1. Generate CSRF state token
    /// 2. Store state in cookie
    /// 3. Redirect to esa with client_id, redirect_uri, scope, state
    pub fn begin_auth(&self, jar: CookieJar) -> (CookieJar, Redirect) {
        let state = generate_csrf_state();
        let location = self.authorization_url(&state);

        let cookie = Cookie::build((STATE_COOKIE_NAME, state))
            .path(STATE_COOKIE_PATH)
            .http_only(true)
            .secure(self.secure_cookies)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::minutes(STATE_COOKIE_MAX_AGE_MINUTES))
            .build();

        (jar.add(cookie), Redirect::temporary(location.as_str()))
    }

    /// Provider authorization URL for the given `state`
    pub fn authorization_url(&self, state: &str) -> Url {
        let mut url = self.provider.authorize_url.clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.provider.client_id)
            .append_pair("redirect_uri", self.provider.callback_url.as_str())
            .append_pair("scope", &self.provider.scope)
            .append_pair("state", state);
        url
    }

    /// Finish a login from the callback request
    ///
    /// # Steps
    /// 1. Reject provider-reported errors
    /// 2. Verify CSRF state
    /// 3. Exchange code for access token
    /// 4. Fetch user info from esa
    pub async fn complete_auth(
        &self,
        jar: &CookieJar,
        params: CallbackParams,
    ) -> Result<AuthenticatedIdentity, AppError> {
        if let Some(error) = params.error {
            return Err(AppError::Authentication(
                params.error_description.unwrap_or(error),
            ));
        }

        verify_csrf_state(params.state.as_deref(), jar)?;

        let code = params
            .code
            .filter(|code| !code.is_empty())
            .ok_or_else(|| AppError::Authentication("missing authorization code".to_string()))?;

        let access_token = self.exchange_code(&code).await?;
        let user = self.fetch_user(&access_token).await?;

        tracing::info!(screen_name = %user.screen_name, "esa login completed");

        Ok(AuthenticatedIdentity {
            access_token,
            user_id: user.id,
            name: user.name,
            screen_name: user.screen_name,
            icon: user.icon,
            email: user.email,
        })
    }

    /// Forget any in-flight handshake
    pub fn logout(&self, jar: CookieJar) -> CookieJar {
        jar.add(clear_state_cookie())
    }

    async fn exchange_code(&self, code: &str) -> Result<String, AppError> {
        let response = self
            .http
            .post(self.provider.token_url.clone())
            .form(&[
                ("grant_type", "authorization_code"),
                ("client_id", self.provider.client_id.as_str()),
                ("client_secret", self.provider.client_secret.as_str()),
                ("redirect_uri", self.provider.callback_url.as_str()),
                ("code", code),
            ])
            .send()
            .await
            .map_err(|e| AppError::Authentication(format!("token exchange failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Authentication(format!(
                "token exchange failed: {status}: {body}"
            )));
        }

        let token: EsaTokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Authentication(format!("token exchange failed: {e}")))?;

        Ok(token.access_token)
    }

    async fn fetch_user(&self, access_token: &str) -> Result<EsaUser, AppError> {
        let response = self
            .http
            .get(self.provider.user_url.clone())
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::Authentication(format!("fetching user failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Authentication(format!(
                "fetching user failed: {status}: {body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Authentication(format!("fetching user failed: {e}")))
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /auth/esa/callback
///
/// On success stores the user in the session and redirects to `/`.
/// On failure responds 401 without touching the session.
async fn esa_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let result = state.oauth.complete_auth(&jar, params).await;
    let jar = state.oauth.logout(jar);

    match result {
        Ok(user) => {
            let jar = state.sessions.save(jar, &Session::for_user(user))?;
            Ok((jar, Redirect::temporary("/")).into_response())
        }
        Err(error) => Ok((jar, error).into_response()),
    }
}

/// GET /logout
///
/// Clears the handshake state and the session.
async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let jar = state.oauth.logout(jar);
    let jar = state.sessions.delete(jar);
    tracing::debug!("Session cleared");
    (jar, StatusCode::OK)
}

// =============================================================================
// Helpers
// =============================================================================

/// Generate a random CSRF state token
fn generate_csrf_state() -> String {
    let mut bytes = [0_u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Verify CSRF state from cookie matches callback state
fn verify_csrf_state(state: Option<&str>, jar: &CookieJar) -> Result<(), AppError> {
    let expected = jar
        .get(STATE_COOKIE_NAME)
        .map(|cookie| cookie.value())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::Authentication("missing oauth state cookie".to_string()))?;

    match state {
        Some(state) if state == expected => Ok(()),
        _ => Err(AppError::Authentication(
            "state token mismatch".to_string(),
        )),
    }
}

fn clear_state_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build((STATE_COOKIE_NAME, ""))
        .path(STATE_COOKIE_PATH)
        .http_only(true)
        .build();
    cookie.make_removal();
    cookie
}

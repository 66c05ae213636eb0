//! Authorization gate
//!
//! Every route passes through [`require_auth`]; only the `/auth` subtree and
//! the paths in [`PUBLIC_PATHS`] are reachable without a session.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;

use super::session::AuthenticatedIdentity;
use crate::AppState;
use crate::error::AppError;

/// Subtree that bypasses the gate, matched on whole segments
pub const PUBLIC_PATH_PREFIX: &str = "/auth";

/// Exact paths that bypass the gate
pub const PUBLIC_PATHS: [&str; 3] = ["/logout", "/favicon.ico", "/ping"];

/// Check whether `path` is on the allow-list
///
/// `/auth` and anything below `/auth/` are public; the other entries only
/// match exactly, so categories like `/authors` or `/pingpong` stay gated.
pub fn is_public_path(path: &str) -> bool {
    let in_auth_subtree = path
        .strip_prefix(PUBLIC_PATH_PREFIX)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'));

    in_auth_subtree || PUBLIC_PATHS.contains(&path)
}

/// Middleware to require authentication
///
/// - Public paths are forwarded unchanged.
/// - Without a user in the session, the OAuth2 login is started and the
///   incoming request is dropped.
/// - Otherwise the user is added to the request extensions.
///
/// # Usage
/// ```ignore
/// let app = Router::new()
///     .route("/", ...)
///     .layer(middleware::from_fn_with_state(state, require_auth));
/// ```
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    if is_public_path(request.uri().path()) {
        return next.run(request).await;
    }

    match state.sessions.get(&jar).user {
        Some(user) => {
            tracing::debug!(screen_name = %user.screen_name, "Session accepted");
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        None => {
            tracing::debug!(path = %request.uri().path(), "No session, starting esa login");
            state.oauth.begin_auth(jar).into_response()
        }
    }
}

/// Extractor for current authenticated user
///
/// Only succeeds behind [`require_auth`].
///
/// # Usage
/// ```ignore
/// async fn handler(
///     CurrentUser(user): CurrentUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {}", user.screen_name)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthenticatedIdentity);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedIdentity>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| AppError::Authentication("authentication required".to_string()))
    }
}

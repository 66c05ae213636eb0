//! esa OAuth authentication
//!
//! Handles:
//! - esa OAuth flow
//! - Session management
//! - Authentication middleware

mod middleware;
mod oauth;
pub mod session;

pub use middleware::{CurrentUser, PUBLIC_PATH_PREFIX, PUBLIC_PATHS, is_public_path, require_auth};
pub use oauth::{
    CALLBACK_PATH, CallbackParams, OAuth2ProviderConfig, OAuthHandshake, STATE_COOKIE_NAME,
    auth_router,
};
pub use session::{
    AuthenticatedIdentity, SESSION_COOKIE_NAME, Session, SessionStore, create_session_token,
    verify_session_token,
};

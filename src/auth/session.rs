//! Session management
//!
//! Uses HMAC-signed tokens stored in a single cookie.
//! No server-side session storage needed.

use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use base64::{Engine as _, engine::general_purpose};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::AppError;

/// Name of the session cookie
pub const SESSION_COOKIE_NAME: &str = "_esagate_session";

/// Session lifetime in days
pub const SESSION_MAX_AGE_DAYS: i64 = 30;

type HmacSha256 = Hmac<Sha256>;

/// The logged-in esa user, as returned by the OAuth2 handshake
///
/// Lives in the session cookie and, for a gated request, in the
/// request extensions. Never stored server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedIdentity {
    /// Bearer token for the esa API
    pub access_token: String,
    /// esa user ID
    pub user_id: u64,
    /// Display name
    pub name: String,
    /// esa screen name
    pub screen_name: String,
    /// Avatar URL
    pub icon: Option<String>,
    pub email: Option<String>,
}

/// Decoded session cookie
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Authenticated user, `None` for an anonymous or logged-out session
    pub user: Option<AuthenticatedIdentity>,
    /// When session was created
    pub created_at: DateTime<Utc>,
    /// When session expires
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Fresh session without a user
    pub fn empty() -> Self {
        let now = Utc::now();
        Self {
            user: None,
            created_at: now,
            expires_at: now + Duration::days(SESSION_MAX_AGE_DAYS),
        }
    }

    /// Fresh session carrying `user`
    pub fn for_user(user: AuthenticatedIdentity) -> Self {
        Self {
            user: Some(user),
            ..Self::empty()
        }
    }

    /// Check if session is expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

/// Signed-cookie session store
///
/// Cheap to clone; the secret is shared read-only by all requests.
#[derive(Clone)]
pub struct SessionStore {
    secret: String,
    secure: bool,
}

impl SessionStore {
    pub fn new(secret: impl Into<String>, secure: bool) -> Self {
        Self {
            secret: secret.into(),
            secure,
        }
    }

    /// Read the session from the request cookies
    ///
    /// Never fails: a missing, tampered, malformed or expired cookie yields
    /// an empty session.
    pub fn get(&self, jar: &CookieJar) -> Session {
        let Some(cookie) = jar.get(SESSION_COOKIE_NAME) else {
            return Session::empty();
        };

        match verify_session_token(cookie.value(), &self.secret) {
            Ok(session) => session,
            Err(error) => {
                tracing::debug!(%error, "Discarding invalid session cookie");
                Session::empty()
            }
        }
    }

    /// Sign `session` and add it to the response cookies
    pub fn save(&self, jar: CookieJar, session: &Session) -> Result<CookieJar, AppError> {
        let token = create_session_token(session, &self.secret)?;
        Ok(jar.add(self.session_cookie(token)))
    }

    /// Expire the session cookie, logging the user out
    pub fn delete(&self, jar: CookieJar) -> CookieJar {
        let mut cookie = self.session_cookie(String::new());
        cookie.make_removal();
        jar.add(cookie)
    }

    fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE_NAME, token))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::days(SESSION_MAX_AGE_DAYS))
            .build()
    }
}

/// Create a signed session token
///
/// Token format: base64(payload).base64(hmac_sha256(payload))
pub fn create_session_token(session: &Session, secret: &str) -> Result<String, AppError> {
    let payload = serde_json::to_string(session).map_err(|e| AppError::Internal(e.into()))?;
    let payload_b64 = general_purpose::URL_SAFE_NO_PAD.encode(payload.as_bytes());

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid session secret: {e}")))?;
    mac.update(payload_b64.as_bytes());
    let signature = mac.finalize().into_bytes();
    let signature_b64 = general_purpose::URL_SAFE_NO_PAD.encode(signature);

    Ok(format!("{}.{}", payload_b64, signature_b64))
}

/// Verify and decode a session token
///
/// # Errors
/// Returns `AppError::SessionIntegrity` if the signature is invalid, the
/// token is malformed, or the session has expired
pub fn verify_session_token(token: &str, secret: &str) -> Result<Session, AppError> {
    let (payload_b64, signature_b64) = token.split_once('.').ok_or(AppError::SessionIntegrity)?;

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| AppError::SessionIntegrity)?;
    mac.update(payload_b64.as_bytes());

    let expected_signature = general_purpose::URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| AppError::SessionIntegrity)?;

    mac.verify_slice(&expected_signature)
        .map_err(|_| AppError::SessionIntegrity)?;

    let payload_bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| AppError::SessionIntegrity)?;

    let session: Session =
        serde_json::from_slice(&payload_bytes).map_err(|_| AppError::SessionIntegrity)?;

    if session.is_expired() {
        return Err(AppError::SessionIntegrity);
    }

    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn identity() -> AuthenticatedIdentity {
        AuthenticatedIdentity {
            access_token: "esa-access-token".to_string(),
            user_id: 1,
            name: "Alice".to_string(),
            screen_name: "alice".to_string(),
            icon: Some("https://img.esa.io/alice.png".to_string()),
            email: None,
        }
    }

    fn jar_with(token: &str) -> CookieJar {
        CookieJar::new().add(Cookie::new(SESSION_COOKIE_NAME, token.to_string()))
    }

    #[test]
    fn token_round_trip_preserves_identity() {
        let token = create_session_token(&Session::for_user(identity()), SECRET).unwrap();
        let session = verify_session_token(&token, SECRET).unwrap();
        assert_eq!(session.user, Some(identity()));
    }

    #[test]
    fn changing_one_byte_invalidates_token() {
        let token = create_session_token(&Session::for_user(identity()), SECRET).unwrap();

        let mut bytes = token.into_bytes();
        bytes[3] = if bytes[3] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(bytes).unwrap();

        assert!(matches!(
            verify_session_token(&tampered, SECRET),
            Err(AppError::SessionIntegrity)
        ));
    }

    #[test]
    fn different_secret_invalidates_token() {
        let token = create_session_token(&Session::for_user(identity()), SECRET).unwrap();
        let other_secret = "1123456789abcdef0123456789abcdef";
        assert!(verify_session_token(&token, other_secret).is_err());
    }

    #[test]
    fn expired_session_is_rejected() {
        let mut session = Session::for_user(identity());
        session.expires_at = Utc::now() - Duration::seconds(1);
        let token = create_session_token(&session, SECRET).unwrap();
        assert!(verify_session_token(&token, SECRET).is_err());
    }

    #[test]
    fn store_get_without_cookie_is_empty() {
        let store = SessionStore::new(SECRET, false);
        assert!(store.get(&CookieJar::new()).user.is_none());
    }

    #[test]
    fn store_get_with_garbage_cookie_is_empty() {
        let store = SessionStore::new(SECRET, false);
        assert!(store.get(&jar_with("not-a-token")).user.is_none());
        assert!(store.get(&jar_with("a.b.c")).user.is_none());
    }

    #[test]
    fn store_save_then_get_round_trips() {
        let store = SessionStore::new(SECRET, true);
        let jar = store
            .save(CookieJar::new(), &Session::for_user(identity()))
            .unwrap();

        let cookie = jar.get(SESSION_COOKIE_NAME).expect("session cookie set");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(
            cookie.max_age(),
            Some(time::Duration::days(SESSION_MAX_AGE_DAYS))
        );

        let next_request = jar_with(cookie.value());
        assert_eq!(store.get(&next_request).user, Some(identity()));
    }

    #[test]
    fn store_delete_expires_cookie() {
        let store = SessionStore::new(SECRET, false);
        let token = create_session_token(&Session::for_user(identity()), SECRET).unwrap();

        let jar = store.delete(jar_with(&token));
        let cookie = jar.get(SESSION_COOKIE_NAME).expect("removal cookie set");
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
        assert!(store.get(&jar_with(cookie.value())).user.is_none());
    }
}

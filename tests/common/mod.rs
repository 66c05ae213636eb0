//! Common test utilities for E2E tests
//!
//! `TestServer` runs the real router against a mock esa API bound on a
//! random local port.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    Form, Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use esagate::{AppState, config};
use tokio::net::TcpListener;

pub const TEAM: &str = "acme";
pub const SESSION_SECRET: &str = "test-secret-key-32-bytes-long!!!";
pub const GOOD_CODE: &str = "good-code";
pub const ACCESS_TOKEN: &str = "esa-access-token";

/// Calls observed by the mock esa API
#[derive(Default)]
pub struct MockEsa {
    pub posts_calls: AtomicUsize,
    pub token_calls: AtomicUsize,
    pub last_posts_query: Mutex<Option<HashMap<String, String>>>,
}

impl MockEsa {
    pub fn posts_calls(&self) -> usize {
        self.posts_calls.load(Ordering::SeqCst)
    }

    pub fn last_posts_query(&self) -> HashMap<String, String> {
        self.last_posts_query
            .lock()
            .unwrap()
            .clone()
            .expect("posts endpoint was called")
    }
}

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub esa: Arc<MockEsa>,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        let esa = Arc::new(MockEsa::default());
        let esa_addr = spawn(mock_esa_router(esa.clone())).await;

        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            per_page: 5,
            team: TEAM.to_string(),
            session_secret: SESSION_SECRET.to_string(),
            cookie_secure: false,
            oauth2: config::OAuth2Config {
                client_id: "test-client-id".to_string(),
                client_secret: "test-client-secret".to_string(),
                redirect_host: "http://localhost:8080".to_string(),
            },
            esa: config::EsaConfig {
                api_endpoint: esa_addr,
                site_domain: "esa.io".to_string(),
                timeout_seconds: 5,
            },
            logging: config::LoggingConfig {
                format: "pretty".to_string(),
            },
        };
        config.validate().unwrap();

        let state = AppState::new(config).unwrap();
        let addr = spawn(esagate::build_router(state.clone())).await;

        // Redirects are asserted on, never followed
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        Self {
            addr,
            state,
            esa,
            client,
        }
    }

    /// Get base URL for requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// `Cookie` header value carrying a valid session
    pub fn session_cookie(&self) -> String {
        use esagate::auth::{
            AuthenticatedIdentity, SESSION_COOKIE_NAME, Session, create_session_token,
        };

        let session = Session::for_user(AuthenticatedIdentity {
            access_token: ACCESS_TOKEN.to_string(),
            user_id: 1,
            name: "Test User".to_string(),
            screen_name: "testuser".to_string(),
            icon: None,
            email: Some("testuser@example.com".to_string()),
        });

        let token = create_session_token(&session, SESSION_SECRET)
            .expect("Failed to create test session");
        format!("{SESSION_COOKIE_NAME}={token}")
    }

    /// GET `path` with a valid session cookie
    pub async fn get_authenticated(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .header("Cookie", self.session_cookie())
            .send()
            .await
            .expect("request succeeds")
    }
}

/// `Location` header of a response
pub fn location(response: &reqwest::Response) -> String {
    response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .expect("location header")
        .to_string()
}

/// All `Set-Cookie` header values of a response
pub fn set_cookies(response: &reqwest::Response) -> Vec<String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok().map(ToString::to_string))
        .collect()
}

/// Value of cookie `name` from the `Set-Cookie` headers, if set
pub fn cookie_value(response: &reqwest::Response, name: &str) -> Option<String> {
    set_cookies(response).into_iter().find_map(|header| {
        let pair = header.split(';').next()?;
        let (key, value) = pair.split_once('=')?;
        (key.trim() == name).then(|| value.to_string())
    })
}

async fn spawn(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

// =============================================================================
// Mock esa API
// =============================================================================

fn mock_esa_router(esa: Arc<MockEsa>) -> Router {
    Router::new()
        .route("/oauth/token", post(mock_token))
        .route("/v1/user", get(mock_user))
        .route(&format!("/v1/teams/{TEAM}/posts"), get(mock_posts))
        .with_state(esa)
}

fn bearer_matches(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .is_some_and(|h| h == format!("Bearer {ACCESS_TOKEN}"))
}

async fn mock_token(
    State(esa): State<Arc<MockEsa>>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    esa.token_calls.fetch_add(1, Ordering::SeqCst);

    let valid = form.get("grant_type").map(String::as_str) == Some("authorization_code")
        && form.get("client_id").map(String::as_str) == Some("test-client-id")
        && form.get("client_secret").map(String::as_str) == Some("test-client-secret")
        && form.get("code").map(String::as_str) == Some(GOOD_CODE);

    if !valid {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": "invalid_grant" })),
        )
            .into_response();
    }

    Json(serde_json::json!({
        "access_token": ACCESS_TOKEN,
        "token_type": "Bearer",
        "scope": "read",
        "created_at": 1_430_000_000
    }))
    .into_response()
}

async fn mock_user(headers: HeaderMap) -> Response {
    if !bearer_matches(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    Json(serde_json::json!({
        "id": 1,
        "name": "Test User",
        "screen_name": "testuser",
        "created_at": "2014-05-10T11:50:07+09:00",
        "updated_at": "2016-04-17T12:35:16+09:00",
        "icon": "https://img.esa.io/uploads/testuser.png",
        "email": "testuser@example.com"
    }))
    .into_response()
}

async fn mock_posts(
    State(esa): State<Arc<MockEsa>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    esa.posts_calls.fetch_add(1, Ordering::SeqCst);
    *esa.last_posts_query.lock().unwrap() = Some(query.clone());

    if !bearer_matches(&headers) {
        return (StatusCode::UNAUTHORIZED, r#"{"error":"unauthorized"}"#).into_response();
    }

    let q = query.get("q").cloned().unwrap_or_default();

    if q.contains("broken") {
        return (StatusCode::SERVICE_UNAVAILABLE, "maintenance").into_response();
    }

    if q.contains("nothing") {
        return Json(serde_json::json!({
            "posts": [],
            "prev_page": null,
            "next_page": null,
            "total_count": 0,
            "page": 1,
            "per_page": 5,
            "max_per_page": 100
        }))
        .into_response();
    }

    Json(serde_json::json!({
        "posts": [{
            "number": 7,
            "name": "Weekly sync",
            "full_name": "engineering/Weekly sync #meeting",
            "wip": false,
            "body_md": "Agenda :memo:",
            "body_html": "<p>Agenda :memo:</p>",
            "created_at": "2024-01-01T10:00:00+09:00",
            "message": "Update post.",
            "url": "https://acme.esa.io/posts/7",
            "updated_at": "2024-01-02T10:00:00+09:00",
            "tags": ["meeting"],
            "category": "engineering",
            "revision_number": 2,
            "created_by": {
                "myself": true,
                "name": "Test User",
                "screen_name": "testuser",
                "icon": "https://img.esa.io/uploads/testuser.png"
            },
            "updated_by": {
                "myself": true,
                "name": "Test User",
                "screen_name": "testuser",
                "icon": "https://img.esa.io/uploads/testuser.png"
            }
        }],
        "prev_page": 1,
        "next_page": 3,
        "total_count": 11,
        "page": 2,
        "per_page": 5,
        "max_per_page": 100
    }))
    .into_response()
}

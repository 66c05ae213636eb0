//! Catch-all listing handler
//!
//! `/{posts|members}/{id}` redirects to the esa site; every other path is
//! a category listing backed by one esa posts search.

use axum::{
    Router,
    extract::{RawQuery, State},
    http::Uri,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};

use super::query::{ListingParams, category_from_path, translate};
use super::redirect::{parse_redirect_target, redirect_location};
use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::esa;
use crate::render::{self, ListingView};

pub fn browse_router() -> Router<AppState> {
    Router::new()
        .route("/", get(browse))
        .route("/*path", get(browse))
}

/// GET /*
async fn browse(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    uri: Uri,
    RawQuery(raw_query): RawQuery,
) -> Result<Response, AppError> {
    let params = ListingParams::from_query(raw_query.as_deref());
    let team_domain = state.config.team_domain();

    if let Some((kind, id)) = parse_redirect_target(uri.path()) {
        let location = redirect_location(&team_domain, kind, id);
        tracing::debug!(%location, "Redirecting to esa");
        return Ok(Redirect::temporary(&location).into_response());
    }

    let category = category_from_path(uri.path());
    let query = translate(&category, &params, state.config.per_page);
    let page = state.esa.posts(&user.access_token, &query).await?;

    let view = ListingView {
        q: params.q.as_deref().unwrap_or_default(),
        category: &category,
        domain: &team_domain,
        stylesheet: esa::STYLESHEET,
        user: &user,
        posts: &page.posts,
        prev_page: page.prev_page,
        next_page: page.next_page,
    };

    let html = if page.is_empty() {
        render::not_found(&view)
    } else {
        render::index(&view)
    };

    Ok(Html(html).into_response())
}

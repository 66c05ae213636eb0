//! Inbound path/query to esa search translation
//!
//! `/engineering?q=foo&page=2` becomes the esa term `foo in:"engineering"`
//! on page 2. Pagination values pass through untouched in both directions.

use std::borrow::Cow;

use crate::esa::UpstreamQuery;

/// Query parameters of a listing request
#[derive(Debug, Default)]
pub struct ListingParams {
    /// Free-text search
    pub q: Option<String>,
    /// Page number; anything but a positive integer means "first page"
    pub page: Option<String>,
}

impl ListingParams {
    /// Parse a raw query string, keeping the first value of a repeated key
    ///
    /// Unknown keys are ignored and parsing never fails.
    pub fn from_query(raw: Option<&str>) -> Self {
        let mut params = Self::default();

        for (key, value) in url::form_urlencoded::parse(raw.unwrap_or_default().as_bytes()) {
            let slot = match key.as_ref() {
                "q" => &mut params.q,
                "page" => &mut params.page,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }

        params
    }
}

/// Category named by the request path (`/a/b` -> `a/b`), percent-decoded
pub fn category_from_path(path: &str) -> String {
    let raw = path.trim_start_matches('/');
    urlencoding::decode(raw)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| raw.to_string())
}

/// Fold a category into the search term as an `in:` qualifier
///
/// An empty `q` still yields the separating space: ` in:"cat"`.
pub fn search_term(q: &str, category: &str) -> String {
    if category.is_empty() {
        q.to_string()
    } else {
        format!("{q} in:\"{category}\"")
    }
}

pub fn parse_page(page: Option<&str>) -> Option<u32> {
    page.and_then(|page| page.trim().parse::<u32>().ok())
        .filter(|page| *page > 0)
}

/// Build the upstream call for a listing request
pub fn translate(category: &str, params: &ListingParams, per_page: u32) -> UpstreamQuery {
    UpstreamQuery {
        term: search_term(params.q.as_deref().unwrap_or_default(), category),
        page: parse_page(params.page.as_deref()),
        per_page,
    }
}

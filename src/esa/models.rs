//! esa API response models
//!
//! Only the fields the listing needs; unknown fields are ignored and
//! missing ones fall back to their defaults.

use serde::Deserialize;

/// Post author or last editor
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Author {
    pub myself: bool,
    pub name: String,
    pub screen_name: String,
    pub icon: String,
}

/// A single esa post
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Post {
    pub number: u64,
    pub name: String,
    pub full_name: String,
    pub wip: bool,
    pub body_md: String,
    /// Rendered by esa; sanitized again before display
    pub body_html: String,
    pub created_at: String,
    pub message: String,
    pub url: String,
    pub updated_at: String,
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub revision_number: u64,
    pub created_by: Author,
    pub updated_by: Author,
}

/// One page of `GET /v1/teams/:team/posts`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostsPage {
    pub posts: Vec<Post>,
    pub prev_page: Option<u32>,
    pub next_page: Option<u32>,
    pub total_count: u64,
    pub page: u32,
    pub per_page: u32,
    pub max_per_page: u32,
}

impl PostsPage {
    /// No posts on this page; the caller renders the not-found view
    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

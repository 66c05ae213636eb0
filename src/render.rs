//! HTML views
//!
//! Two pages: the post listing and the "no posts" page. Both are plain
//! string builders over a fixed set of helpers (`escape`, `emoji`,
//! `page_link`, `format_time`).

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::auth::AuthenticatedIdentity;
use crate::esa::Post;

const EMOJI_BASE_URL: &str = "https://assets.esa.io/images/emoji";

// A tag or a `:name:` shortcode; tags are matched so they can be passed through
static EMOJI_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<[^>]*>|:([[:alnum:]]+):").expect("EMOJI_PATTERN is a valid regex")
});

/// Everything a view needs for one request
pub struct ListingView<'a> {
    /// Search text as the user typed it
    pub q: &'a str,
    pub category: &'a str,
    /// Team site host, e.g. `acme.esa.io`
    pub domain: &'a str,
    pub stylesheet: &'a str,
    pub user: &'a AuthenticatedIdentity,
    pub posts: &'a [Post],
    pub prev_page: Option<u32>,
    pub next_page: Option<u32>,
}

/// Post listing
pub fn index(view: &ListingView<'_>) -> String {
    let mut body = String::new();

    for post in view.posts {
        body.push_str(&format!(
            r#"<article class="post">
<h2><a href="http://{domain}/posts/{number}">{title}</a>{wip}</h2>
<p class="meta">#{number} {tags} updated by <img class="icon" src="{icon}" alt="" width="20" height="20"> {author} at {updated}</p>
<div class="markdown">{html}</div>
</article>
"#,
            domain = escape(view.domain),
            number = post.number,
            title = emoji(&escape(&post.full_name)),
            wip = if post.wip { r#" <span class="wip">WIP</span>"# } else { "" },
            tags = post
                .tags
                .iter()
                .map(|tag| format!(r#"<span class="tag">#{}</span>"#, escape(tag)))
                .collect::<Vec<_>>()
                .join(" "),
            icon = escape(&post.updated_by.icon),
            author = escape(&post.updated_by.screen_name),
            updated = escape(&format_time(&post.updated_at)),
            html = emoji(&ammonia::clean(&post.body_html)),
        ));
    }

    let mut pager = String::new();
    if let Some(page) = view.prev_page {
        pager.push_str(&format!(
            r#"<a class="prev" href="{}">&laquo; Prev</a> "#,
            escape(&page_link(view.q, page))
        ));
    }
    if let Some(page) = view.next_page {
        pager.push_str(&format!(
            r#"<a class="next" href="{}">Next &raquo;</a>"#,
            escape(&page_link(view.q, page))
        ));
    }

    layout(view, &format!("{body}<nav class=\"pager\">{pager}</nav>\n"))
}

/// Shown when the search matched nothing
pub fn not_found(view: &ListingView<'_>) -> String {
    let message = if view.q.is_empty() {
        "No posts found.".to_string()
    } else {
        format!("No posts matched &quot;{}&quot;.", escape(view.q))
    };

    layout(view, &format!("<p class=\"not-found\">{message}</p>\n"))
}

fn layout(view: &ListingView<'_>, content: &str) -> String {
    let title = if view.category.is_empty() {
        view.domain.to_string()
    } else {
        format!("{} - {}", view.category, view.domain)
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<link rel="stylesheet" href="{stylesheet}">
</head>
<body>
<header>
<form method="get" action=""><input type="search" name="q" value="{q}"><button type="submit">Search</button></form>
<p class="breadcrumb"><a href="/">{domain}</a> / {category}</p>
<p class="user">{user} <a href="/logout">Logout</a></p>
</header>
<main>
{content}</main>
</body>
</html>
"#,
        title = escape(&title),
        stylesheet = escape(view.stylesheet),
        q = escape(view.q),
        domain = escape(view.domain),
        category = escape(view.category),
        user = escape(&view.user.screen_name),
    )
}

/// HTML-escape text for element content and double-quoted attributes
pub fn escape(text: &str) -> Cow<'_, str> {
    html_escape::encode_double_quoted_attribute(text)
}

/// Replace `:name:` shortcodes with esa emoji images
///
/// Only touches text outside of tags, so attribute values stay intact.
pub fn emoji(html: &str) -> String {
    EMOJI_PATTERN
        .replace_all(html, |caps: &Captures<'_>| match caps.get(1) {
            Some(name) => {
                let name = name.as_str();
                format!(
                    r#"<img class="emoji" title=":{name}:" alt=":{name}:" src="{EMOJI_BASE_URL}/{name}.png">"#
                )
            }
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Relative link to another page of the current listing
pub fn page_link(q: &str, page: u32) -> String {
    if q.is_empty() {
        format!("?page={page}")
    } else {
        format!("?q={}&page={page}", urlencoding::encode(q))
    }
}

/// `2015-05-09T11:54:50+09:00` -> `2015-05-09 11:54`; unparsable input is kept
pub fn format_time(timestamp: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(timestamp)
        .map(|time| time.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| timestamp.to_string())
}

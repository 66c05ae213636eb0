//! Redirects from `/posts/:id` and `/members/:id` to the team's esa site

/// Path kinds that map one-to-one onto esa site pages
const REDIRECT_KINDS: [&str; 2] = ["posts", "members"];

/// Match `/{posts|members}/{id}`; `id` is everything after the second slash
pub fn parse_redirect_target(path: &str) -> Option<(&'static str, &str)> {
    let rest = path.strip_prefix('/')?;
    let (kind, id) = rest.split_once('/')?;

    if id.is_empty() {
        return None;
    }

    REDIRECT_KINDS
        .iter()
        .find(|candidate| **candidate == kind)
        .map(|kind| (*kind, id))
}

/// Location on the esa site, e.g. `http://acme.esa.io/posts/123`
pub fn redirect_location(team_domain: &str, kind: &str, id: &str) -> String {
    format!("http://{team_domain}/{kind}/{id}")
}

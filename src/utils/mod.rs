//! Utility functions and helpers.

pub mod http;

use url::Url;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// URL of a 1-based listing page.
///
/// Page 1 is the bare base URL when `omit_on_first` is set; every other
/// page appends `param=N` to the base URL's query.
pub fn page_url(base: &Url, param: &str, page: u32, omit_on_first: bool) -> String {
    if page == 1 && omit_on_first {
        return base.to_string();
    }

    let mut url = base.clone();
    url.query_pairs_mut().append_pair(param, &page.to_string());
    url.to_string()
}

/// Trim and collapse internal whitespace runs to single spaces.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

//! Viewer-request URI rewriting for a prerendered static site
//!
//! Maps clean URLs onto the object keys produced by the site build:
//! - `/` and the empty path resolve to `index.html`
//! - asset paths nested under a prefix are cut back to their asset marker
//! - extension-less page paths get an `.html` suffix

/// Well-known asset markers, checked in this order
pub const STATIC_ASSET_MARKERS: [&str; 4] = ["/_app/", "/_data.json", "/style.css", "/favicon.png"];

/// Rewrite a viewer request URI
///
/// Every check runs against the query-stripped path of the original URI, so a
/// later marker overwrites an earlier one and the `.html` rule overwrites any
/// marker rewrite. When no rule applies the URI is returned as given,
/// query string included.
///
/// # Examples
/// ```
/// use edgehost::edge::rewrite_uri;
/// assert_eq!(rewrite_uri("/"), "/index.html");
/// assert_eq!(rewrite_uri("/about/"), "/about.html");
/// assert_eq!(rewrite_uri("/api/users"), "/api/users");
/// ```
pub fn rewrite_uri(uri: &str) -> String {
    let path = strip_query(uri);

    if path.is_empty() || path == "/" {
        return format!("{path}index.html");
    }

    let mut rewritten = None;
    for marker in STATIC_ASSET_MARKERS {
        if let Some(start) = path.find(marker) {
            rewritten = Some(&path[start..]);
        }
    }

    if wants_html_suffix(path) {
        let page = path.strip_suffix('/').unwrap_or(path);
        return format!("{page}.html");
    }

    rewritten.unwrap_or(uri).to_string()
}

/// Path portion of a URI, everything before the first `?`
pub fn strip_query(uri: &str) -> &str {
    uri.split_once('?').map_or(uri, |(path, _)| path)
}

/// Whether a page path should be served from its `.html` object
fn wants_html_suffix(path: &str) -> bool {
    !path.is_empty()
        && path != "/"
        && !path.contains("api")
        && !path.contains("callback")
        && !path.ends_with(".html")
        && !path.contains('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_paths() {
        assert_eq!(rewrite_uri("/"), "/index.html");
        assert_eq!(rewrite_uri(""), "index.html");
        assert_eq!(rewrite_uri("/?lang=en"), "/index.html");
        assert_eq!(rewrite_uri("?lang=en"), "index.html");
    }

    #[test]
    fn test_page_paths_get_html_suffix() {
        assert_eq!(rewrite_uri("/about"), "/about.html");
        assert_eq!(rewrite_uri("/about/"), "/about.html");
        assert_eq!(rewrite_uri("/blog/2024/post"), "/blog/2024/post.html");
    }

    #[test]
    fn test_query_dropped_when_rewritten() {
        assert_eq!(rewrite_uri("/foo?x=1"), "/foo.html");
        assert_eq!(rewrite_uri("/docs/?page=2&sort=asc"), "/docs.html");
    }

    #[test]
    fn test_excluded_paths_unchanged() {
        assert_eq!(rewrite_uri("/api/users"), "/api/users");
        assert_eq!(rewrite_uri("/auth/callback"), "/auth/callback");
        assert_eq!(rewrite_uri("/report.html"), "/report.html");
        assert_eq!(rewrite_uri("/robots.txt"), "/robots.txt");
    }

    #[test]
    fn test_unchanged_uri_keeps_query() {
        assert_eq!(rewrite_uri("/report.html?v=3"), "/report.html?v=3");
        assert_eq!(rewrite_uri("/api/users?page=1"), "/api/users?page=1");
    }

    #[test]
    fn test_asset_marker_strips_prefix() {
        assert_eq!(rewrite_uri("/_app/chunks/foo.js"), "/_app/chunks/foo.js");
        assert_eq!(
            rewrite_uri("/blog/post/_app/immutable/entry.js"),
            "/_app/immutable/entry.js"
        );
        assert_eq!(rewrite_uri("/nested/favicon.png"), "/favicon.png");
        assert_eq!(rewrite_uri("/en/style.css?v=2"), "/style.css");
        assert_eq!(rewrite_uri("/about/_data.json"), "/_data.json");
    }

    #[test]
    fn test_later_marker_wins() {
        // "/style.css" is checked after "/_app/" and re-reads the original path
        assert_eq!(rewrite_uri("/x/_app/y/style.css"), "/style.css");
    }

    #[test]
    fn test_html_rule_overrides_marker_rule() {
        // No dot anywhere, so the page rule discards the marker rewrite
        assert_eq!(rewrite_uri("/blog/_app/immutable"), "/blog/_app/immutable.html");
    }

    #[test]
    fn test_marker_with_api_segment() {
        assert_eq!(rewrite_uri("/api/_app/x.js"), "/_app/x.js");
    }

    #[test]
    fn test_single_trailing_slash_removed() {
        assert_eq!(rewrite_uri("/docs//"), "/docs/.html");
        assert_eq!(rewrite_uri("//"), "/.html");
    }

    #[test]
    fn test_deterministic() {
        for uri in ["/", "/a/b/", "/x.js?q", "/_app/", "weird", "/callback/x"] {
            assert_eq!(rewrite_uri(uri), rewrite_uri(uri));
        }
    }

    #[test]
    fn test_strip_query() {
        assert_eq!(strip_query("/a?b?c"), "/a");
        assert_eq!(strip_query("/a"), "/a");
        assert_eq!(strip_query("?"), "");
    }
}

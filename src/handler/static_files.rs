//! Static origin module
//!
//! Runs viewer-request functions, resolves the resulting object key against
//! the static roots and builds the cached response.

use crate::config::AppState;
use crate::distribution::CacheBehavior;
use crate::edge::{strip_query, ViewerRequest};
use crate::handler::router::RequestContext;
use crate::http::{self, cache, mime, CachePolicy};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// Serve a static object; returns the response and the object key looked up
pub async fn serve_object(
    ctx: &RequestContext<'_>,
    behavior: &CacheBehavior,
    state: &AppState,
) -> (Response<Full<Bytes>>, String) {
    let key = object_key(ctx, behavior, state);

    let mut response = match load_object(&state.static_roots, &key).await {
        Some((content, content_type)) => build_object_response(
            &content,
            content_type,
            ctx.if_none_match.as_deref(),
            behavior.cache_policy,
            ctx.is_head,
        ),
        None => http::build_404_response(),
    };

    if !behavior.function_associations.is_empty() {
        state.functions.run_viewer_response(response.headers_mut());
    }

    (response, key)
}

/// Object key for a request after viewer-request functions
fn object_key(ctx: &RequestContext<'_>, behavior: &CacheBehavior, state: &AppState) -> String {
    let mut request = ViewerRequest::new(ctx.uri);
    request
        .other
        .insert("method".to_string(), ctx.method.as_str().into());

    if !behavior.function_associations.is_empty() {
        request = state.functions.run_viewer_request(request);
    }

    let key = strip_query(&request.uri);
    let root_object = &state.plan.default_root_object;
    if key == "/" && !root_object.is_empty() {
        format!("/{root_object}")
    } else {
        key.to_string()
    }
}

/// Load an object from the first static root that holds it
///
/// `key` is the percent-encoded request path; it is decoded before the
/// traversal check so encoded dot segments are rejected too.
pub async fn load_object(roots: &[PathBuf], key: &str) -> Option<(Vec<u8>, &'static str)> {
    let Ok(decoded) = urlencoding::decode(key) else {
        logger::log_debug(&format!("Object key is not valid UTF-8 once decoded: {key}"));
        return None;
    };
    let relative = sanitize_key(&decoded)?;

    for root in roots {
        let Ok(root_canonical) = root.canonicalize() else {
            logger::log_warning(&format!(
                "Static root not found or inaccessible: {}",
                root.display()
            ));
            continue;
        };

        let file_path = root.join(&relative);
        // Missing objects are routine, keep looking
        let Ok(file_canonical) = file_path.canonicalize() else {
            continue;
        };
        if !file_canonical.starts_with(&root_canonical) {
            logger::log_warning(&format!(
                "Object key escapes static root: {key} -> {}",
                file_canonical.display()
            ));
            return None;
        }
        if !file_canonical.is_file() {
            continue;
        }

        match fs::read(&file_canonical).await {
            Ok(content) => {
                let content_type =
                    mime::get_content_type(file_canonical.extension().and_then(|e| e.to_str()));
                return Some((content, content_type));
            }
            Err(e) => {
                logger::log_error(&format!(
                    "Failed to read object '{}': {e}",
                    file_canonical.display()
                ));
                return None;
            }
        }
    }

    None
}

/// Relative path for an object key; `None` for keys that climb out of the root
fn sanitize_key(key: &str) -> Option<PathBuf> {
    let trimmed = key.trim_start_matches('/');
    if trimmed.is_empty() {
        return None;
    }

    let mut relative = PathBuf::new();
    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(relative)
}

/// Build object response with `ETag` validation
fn build_object_response(
    data: &[u8],
    content_type: &str,
    if_none_match: Option<&str>,
    cache_policy: CachePolicy,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let etag = cache::generate_etag(data);

    if cache::check_etag_match(if_none_match, &etag) {
        return http::build_304_response(&etag, cache_policy);
    }

    http::response::build_cached_response(
        Bytes::copy_from_slice(data),
        content_type,
        &etag,
        cache_policy,
        is_head,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_key() {
        assert_eq!(sanitize_key("/about.html"), Some(PathBuf::from("about.html")));
        assert_eq!(
            sanitize_key("/_app/./x.js"),
            Some(PathBuf::from("_app/x.js"))
        );
        assert_eq!(sanitize_key("/../etc/passwd"), None);
        assert_eq!(sanitize_key("/a/../../b"), None);
        assert_eq!(sanitize_key("/"), None);
    }

    #[tokio::test]
    async fn test_load_object_searches_roots_in_order() {
        let client = tempfile::tempdir().unwrap();
        let prerendered = tempfile::tempdir().unwrap();
        std::fs::write(client.path().join("style.css"), "body{}").unwrap();
        std::fs::write(prerendered.path().join("style.css"), "shadowed").unwrap();
        std::fs::write(prerendered.path().join("about.html"), "about").unwrap();

        let roots = vec![client.path().to_path_buf(), prerendered.path().to_path_buf()];

        let (content, content_type) = load_object(&roots, "/style.css").await.unwrap();
        assert_eq!(content, b"body{}");
        assert_eq!(content_type, "text/css");

        let (content, _) = load_object(&roots, "/about.html").await.unwrap();
        assert_eq!(content, b"about");

        assert!(load_object(&roots, "/nope.html").await.is_none());
    }

    #[tokio::test]
    async fn test_load_object_decodes_key() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("about us.html"), "about").unwrap();
        std::fs::write(root.path().join("café.html"), "cafe").unwrap();
        let roots = vec![root.path().to_path_buf()];

        let (content, _) = load_object(&roots, "/about%20us.html").await.unwrap();
        assert_eq!(content, b"about");
        let (content, _) = load_object(&roots, "/caf%C3%A9.html").await.unwrap();
        assert_eq!(content, b"cafe");

        assert!(load_object(&roots, "/%2e%2e/etc/passwd").await.is_none());
        assert!(load_object(&roots, "/a/%2E%2E%2F%2E%2E/b").await.is_none());
        assert!(load_object(&roots, "/%FF.html").await.is_none());
    }

    #[tokio::test]
    async fn test_load_object_skips_directories_and_missing_roots() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("docs")).unwrap();

        let roots = vec![PathBuf::from("/nonexistent/edgehost-root"), root.path().to_path_buf()];
        assert!(load_object(&roots, "/docs").await.is_none());
    }

    #[test]
    fn test_etag_revalidation() {
        let data = b"cached";
        let etag = cache::generate_etag(data);
        let resp = build_object_response(
            data,
            "text/plain",
            Some(&etag),
            CachePolicy::CachingOptimized,
            false,
        );
        assert_eq!(resp.status(), 304);
    }
}

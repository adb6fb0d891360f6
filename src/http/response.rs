//! HTTP response building module
//!
//! Builders for the status responses the edge produces itself, decoupled
//! from origin handling.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

use super::cache::CachePolicy;
use crate::distribution::{AllowedMethods, CorsPreflight};

/// Build 304 Not Modified response
pub fn build_304_response(etag: &str, cache_policy: CachePolicy) -> Response<Full<Bytes>> {
    Response::builder()
        .status(304)
        .header("ETag", etag)
        .header("Cache-Control", cache_policy.to_header_value())
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("304", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Full<Bytes>> {
    build_text_response(404, "404 Not Found")
}

/// Build 405 Method Not Allowed response
pub fn build_405_response(allowed: AllowedMethods) -> Response<Full<Bytes>> {
    Response::builder()
        .status(405)
        .header("Content-Type", "text/plain")
        .header("Allow", allowed.allow_header())
        .body(Full::new(Bytes::from("405 Method Not Allowed")))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            Response::new(Full::new(Bytes::from("405 Method Not Allowed")))
        })
}

/// Build OPTIONS response for a static behaviour
pub fn build_options_response(allowed: AllowedMethods) -> Response<Full<Bytes>> {
    Response::builder()
        .status(204)
        .header("Allow", allowed.allow_header())
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("OPTIONS", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build CORS preflight response for an API behaviour
pub fn build_preflight_response(cors: &CorsPreflight) -> Response<Full<Bytes>> {
    Response::builder()
        .status(204)
        .header("Access-Control-Allow-Origin", cors.allow_origins.as_str())
        .header("Access-Control-Allow-Methods", cors.allow_methods.as_str())
        .header("Access-Control-Allow-Headers", cors.allow_headers.as_str())
        .header("Access-Control-Max-Age", cors.max_age_secs)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("preflight", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 413 Payload Too Large response
pub fn build_413_response() -> Response<Full<Bytes>> {
    build_text_response(413, "413 Payload Too Large")
}

/// Build 502 Bad Gateway response
pub fn build_502_response() -> Response<Full<Bytes>> {
    build_text_response(502, "502 Bad Gateway")
}

/// Build success response with cache control
pub fn build_cached_response(
    data: Bytes,
    content_type: &str,
    etag: &str,
    cache_policy: CachePolicy,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = data.len();
    let body = if is_head { Bytes::new() } else { data };

    Response::builder()
        .status(200)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length)
        .header("ETag", etag)
        .header("Cache-Control", cache_policy.to_header_value())
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

fn build_text_response(status: u16, text: &'static str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from(text)))
        .unwrap_or_else(|e| {
            log_build_error(&status.to_string(), &e);
            Response::new(Full::new(Bytes::from(text)))
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_head_response_has_no_body_but_keeps_length() {
        let resp = build_cached_response(
            Bytes::from_static(b"hello"),
            "text/plain",
            "\"e\"",
            CachePolicy::CachingOptimized,
            true,
        );
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["content-length"], "5");
        assert_eq!(resp.headers()["cache-control"], "public, max-age=86400");
    }

    #[test]
    fn test_405_lists_allowed_methods() {
        let resp = build_405_response(AllowedMethods::GetHeadOptions);
        assert_eq!(resp.status(), 405);
        assert_eq!(resp.headers()["allow"], "GET, HEAD, OPTIONS");
    }

    #[test]
    fn test_preflight_headers() {
        let resp = build_preflight_response(&CorsPreflight::default());
        assert_eq!(resp.status(), 204);
        assert_eq!(resp.headers()["access-control-allow-origin"], "*");
        assert_eq!(resp.headers()["access-control-max-age"], "86400");
    }
}

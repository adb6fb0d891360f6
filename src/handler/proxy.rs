//! API origin module
//!
//! Forwards requests matched by an API behaviour to the configured server
//! origin, applying the behaviour's origin request policy.

use crate::config::AppState;
use crate::distribution::CacheBehavior;
use crate::http;
use crate::logger;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{self, HeaderMap, HeaderName, HeaderValue};
use hyper::{Request, Response, Uri};
use std::net::SocketAddr;

/// Hop-by-hop headers never relayed back to the viewer
const HOP_BY_HOP: [HeaderName; 4] = [
    header::CONNECTION,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    header::TE,
];

/// Forward a request to the API origin and relay its response
pub async fn forward<B>(
    req: Request<B>,
    behavior: &CacheBehavior,
    state: &AppState,
    remote_addr: SocketAddr,
) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let Some(origin) = state.config.site.api_origin.as_deref() else {
        logger::log_warning(&format!(
            "No API origin configured for {}",
            req.uri().path()
        ));
        return http::build_502_response();
    };

    let max_body_size = state.config.http.max_body_size;
    if let Some(resp) = check_body_size(req.headers(), max_body_size) {
        return resp;
    }

    let target = match origin_uri(origin, req.uri()) {
        Ok(uri) => uri,
        Err(e) => {
            logger::log_error(&format!("Cannot build origin URI from '{origin}': {e}"));
            return http::build_502_response();
        }
    };

    let (parts, body) = req.into_parts();
    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    let body = match Limited::new(body, limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.is::<LengthLimitError>() => return http::build_413_response(),
        Err(e) => {
            logger::log_warning(&format!("Failed to read request body: {e}"));
            return http::build_502_response();
        }
    };

    let mut builder = Request::builder().method(parts.method).uri(target);
    if let Some(headers) = builder.headers_mut() {
        *headers = forwarded_headers(&parts.headers, behavior, remote_addr);
    }
    let upstream_req = match builder.body(Full::new(body)) {
        Ok(r) => r,
        Err(e) => {
            logger::log_error(&format!("Failed to build origin request: {e}"));
            return http::build_502_response();
        }
    };

    let upstream = match state.origin_client.request(upstream_req).await {
        Ok(resp) => resp,
        Err(e) => {
            logger::log_error(&format!("API origin request failed: {e}"));
            return http::build_502_response();
        }
    };

    let (mut parts, body) = upstream.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            logger::log_error(&format!("Failed to read API origin response: {e}"));
            return http::build_502_response();
        }
    };

    for name in &HOP_BY_HOP {
        parts.headers.remove(name);
    }
    Response::from_parts(parts, Full::new(body))
}

/// Join the origin base with the viewer's path and full query string
pub fn origin_uri(origin: &str, viewer_uri: &Uri) -> Result<Uri, hyper::http::Error> {
    let base = origin.trim_end_matches('/');
    let path_and_query = viewer_uri
        .path_and_query()
        .map_or("/", |pq| pq.as_str());
    Ok(format!("{base}{path_and_query}").parse::<Uri>()?)
}

/// Headers sent to the origin under the behaviour's request policy
pub fn forwarded_headers(
    incoming: &HeaderMap,
    behavior: &CacheBehavior,
    remote_addr: SocketAddr,
) -> HeaderMap {
    let policy = &behavior.origin_request_policy;
    let mut headers = HeaderMap::new();

    for (name, value) in incoming {
        if policy.forwards_header(name.as_str()) || *name == header::CONTENT_TYPE {
            headers.append(name.clone(), value.clone());
        }
    }

    let client_ip = remote_addr.ip().to_string();
    let forwarded_for = match incoming
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        Some(chain) => format!("{chain}, {client_ip}"),
        None => client_ip,
    };
    if let Ok(value) = HeaderValue::from_str(&forwarded_for) {
        headers.insert("x-forwarded-for", value);
    }

    headers
}

/// Reject requests whose declared body exceeds the limit
fn check_body_size(headers: &HeaderMap, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let content_length = headers.get(header::CONTENT_LENGTH)?;
    match content_length.to_str().ok().and_then(|s| s.parse::<u64>().ok()) {
        Some(size) if size > max_body_size => {
            logger::log_warning(&format!(
                "Request body too large: {size} bytes (max: {max_body_size})"
            ));
            Some(http::build_413_response())
        }
        Some(_) => None,
        None => {
            logger::log_warning("Invalid Content-Length value, skipping size check");
            None
        }
    }
}

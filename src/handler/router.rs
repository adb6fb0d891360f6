//! Request routing dispatch module
//!
//! Entry point for viewer requests: picks the cache behaviour, enforces its
//! method policy and hands the request to the matching origin.

use crate::config::AppState;
use crate::distribution::{CacheBehavior, OriginKind};
use crate::handler::{proxy, static_files};
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Request context for the static origin
pub struct RequestContext<'a> {
    /// Path and query as sent by the viewer
    pub uri: &'a str,
    pub method: &'a Method,
    pub is_head: bool,
    pub if_none_match: Option<String>,
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    remote_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let started = Instant::now();
    let mut entry = access_entry(&req, remote_addr);

    let behavior = state.plan.select_behavior(req.uri().path());
    entry.origin = match behavior.origin {
        OriginKind::Static => "static",
        OriginKind::Api => "api",
    };

    let response = dispatch(req, behavior, &state, remote_addr, &mut entry).await;

    if state.access_log_enabled() {
        entry.status = response.status().as_u16();
        entry.body_bytes = usize::try_from(response.body().size_hint().lower()).unwrap_or(0);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

async fn dispatch<B>(
    req: Request<B>,
    behavior: &CacheBehavior,
    state: &Arc<AppState>,
    remote_addr: SocketAddr,
    entry: &mut AccessLogEntry,
) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let method = req.method();
    if !behavior.allowed_methods.allows(method) {
        logger::log_warning(&format!(
            "Method {method} not allowed for {}",
            req.uri().path()
        ));
        return http::build_405_response(behavior.allowed_methods);
    }

    match behavior.origin {
        OriginKind::Static => {
            if *method == Method::OPTIONS {
                return http::build_options_response(behavior.allowed_methods);
            }
            let uri = req
                .uri()
                .path_and_query()
                .map_or_else(|| req.uri().path(), |pq| pq.as_str());
            let ctx = RequestContext {
                uri,
                method,
                is_head: *method == Method::HEAD,
                if_none_match: header_string(&req, "if-none-match"),
            };
            let (response, object_key) = static_files::serve_object(&ctx, behavior, state).await;
            entry.object_key = Some(object_key);
            response
        }
        OriginKind::Api => {
            if *method == Method::OPTIONS {
                return http::build_preflight_response(&state.plan.api_cors);
            }
            proxy::forward(req, behavior, state, remote_addr).await
        }
    }
}

fn access_entry<B>(req: &Request<B>, remote_addr: SocketAddr) -> AccessLogEntry {
    let mut entry = AccessLogEntry::new(
        remote_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = match req.version() {
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        _ => "1.1",
    }
    .to_string();
    entry.referer = header_string(req, "referer");
    entry.user_agent = header_string(req, "user-agent");
    entry
}

fn header_string<B>(req: &Request<B>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

//! Edge function associations
//!
//! Functions attach to static cache behaviours and run on the viewer side of
//! the cache: request functions before the object lookup, response functions
//! before the response goes back to the viewer.

use std::collections::BTreeMap;
use std::sync::Arc;

use hyper::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use super::event::ViewerRequest;
use super::rewrite::rewrite_uri;
use crate::config::{RequestFunctionKind, SiteConfig};
use crate::error::{Error, Result};
use crate::logger;

/// Point in the viewer exchange where a function runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FunctionEventType {
    ViewerRequest,
    ViewerResponse,
}

pub trait EdgeFunction: Send + Sync {
    fn name(&self) -> &str;

    fn event_type(&self) -> FunctionEventType;

    fn on_viewer_request(&self, request: ViewerRequest) -> ViewerRequest {
        request
    }

    fn on_viewer_response(&self, _headers: &mut HeaderMap) {}
}

/// Clean-URL rewrite for prerendered static sites
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticSiteRewrite;

impl EdgeFunction for StaticSiteRewrite {
    fn name(&self) -> &str {
        "static-site-rewrite"
    }

    fn event_type(&self) -> FunctionEventType {
        FunctionEventType::ViewerRequest
    }

    fn on_viewer_request(&self, mut request: ViewerRequest) -> ViewerRequest {
        let rewritten = rewrite_uri(&request.uri);
        logger::log_rewrite(&request.uri, &rewritten);
        request.uri = rewritten;
        request
    }
}

/// Sets fixed headers on every viewer response
#[derive(Debug, Clone)]
pub struct ResponseHeaders {
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl ResponseHeaders {
    pub fn from_config(headers: &BTreeMap<String, String>) -> Result<Self> {
        let headers = headers
            .iter()
            .map(|(name, value)| {
                let name = HeaderName::from_bytes(name.as_bytes())
                    .map_err(|e| Error::Site(format!("invalid response header name '{name}': {e}")))?;
                let value = HeaderValue::from_str(value)
                    .map_err(|e| Error::Site(format!("invalid value for header '{name}': {e}")))?;
                Ok((name, value))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { headers })
    }
}

impl EdgeFunction for ResponseHeaders {
    fn name(&self) -> &str {
        "response-headers"
    }

    fn event_type(&self) -> FunctionEventType {
        FunctionEventType::ViewerResponse
    }

    fn on_viewer_response(&self, headers: &mut HeaderMap) {
        for (name, value) in &self.headers {
            headers.insert(name.clone(), value.clone());
        }
    }
}

/// Functions attached to the static behaviours of a distribution
#[derive(Clone, Default)]
pub struct FunctionAssociations {
    functions: Vec<Arc<dyn EdgeFunction>>,
}

impl std::fmt::Debug for FunctionAssociations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.functions.iter().map(|func| (func.name(), func.event_type())))
            .finish()
    }
}

impl FunctionAssociations {
    /// Select functions for a site
    ///
    /// The rewrite is attached when asked for, or implicitly when the site
    /// serves static content by default and no request function was chosen.
    pub fn for_site(site: &SiteConfig) -> Result<Self> {
        let mut functions: Vec<Arc<dyn EdgeFunction>> = Vec::new();

        let rewrite = match site.request_function {
            RequestFunctionKind::StaticRewrite => true,
            RequestFunctionKind::None => false,
            RequestFunctionKind::Auto => site.default_static_behaviour,
        };
        if rewrite {
            functions.push(Arc::new(StaticSiteRewrite));
        }

        if !site.response_headers.is_empty() {
            functions.push(Arc::new(ResponseHeaders::from_config(&site.response_headers)?));
        }

        Ok(Self { functions })
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// `(name, event type)` of each association, in attachment order
    pub fn describe(&self) -> Vec<(String, FunctionEventType)> {
        self.functions
            .iter()
            .map(|func| (func.name().to_string(), func.event_type()))
            .collect()
    }

    pub fn run_viewer_request(&self, request: ViewerRequest) -> ViewerRequest {
        self.functions
            .iter()
            .filter(|func| func.event_type() == FunctionEventType::ViewerRequest)
            .fold(request, |request, func| func.on_viewer_request(request))
    }

    pub fn run_viewer_response(&self, headers: &mut HeaderMap) {
        for func in self
            .functions
            .iter()
            .filter(|func| func.event_type() == FunctionEventType::ViewerResponse)
        {
            func.on_viewer_response(headers);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(default_static: bool, kind: RequestFunctionKind) -> SiteConfig {
        SiteConfig {
            default_static_behaviour: default_static,
            request_function: kind,
            ..SiteConfig::default()
        }
    }

    #[test]
    fn test_auto_rewrite_follows_default_static_behaviour() {
        let assoc = FunctionAssociations::for_site(&site(true, RequestFunctionKind::Auto)).unwrap();
        assert_eq!(
            assoc.describe(),
            vec![("static-site-rewrite".to_string(), FunctionEventType::ViewerRequest)]
        );

        let assoc = FunctionAssociations::for_site(&site(false, RequestFunctionKind::Auto)).unwrap();
        assert!(assoc.is_empty());
    }

    #[test]
    fn test_explicit_request_function_choice() {
        let assoc =
            FunctionAssociations::for_site(&site(false, RequestFunctionKind::StaticRewrite)).unwrap();
        assert!(!assoc.is_empty());

        let assoc = FunctionAssociations::for_site(&site(true, RequestFunctionKind::None)).unwrap();
        assert!(assoc.is_empty());
    }

    #[test]
    fn test_run_viewer_request() {
        let assoc = FunctionAssociations::for_site(&site(true, RequestFunctionKind::Auto)).unwrap();
        let mut request = ViewerRequest::new("/about/");
        request.other.insert("method".into(), "GET".into());

        let out = assoc.run_viewer_request(request);
        assert_eq!(out.uri, "/about.html");
        assert_eq!(out.other["method"], "GET");
    }

    #[test]
    fn test_response_headers_function() {
        let mut config = site(true, RequestFunctionKind::Auto);
        config
            .response_headers
            .insert("X-Frame-Options".into(), "DENY".into());
        let assoc = FunctionAssociations::for_site(&config).unwrap();
        assert_eq!(assoc.describe().len(), 2);

        let mut headers = HeaderMap::new();
        assoc.run_viewer_response(&mut headers);
        assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");

        // Response functions never touch the request
        let out = assoc.run_viewer_request(ViewerRequest::new("/a.js"));
        assert_eq!(out.uri, "/a.js");
    }

    #[test]
    fn test_invalid_response_header_rejected() {
        let mut config = site(false, RequestFunctionKind::None);
        config
            .response_headers
            .insert("bad header".into(), "x".into());
        assert!(FunctionAssociations::for_site(&config).is_err());
    }
}

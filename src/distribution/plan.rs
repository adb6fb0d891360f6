//! Distribution plan
//!
//! Derives everything the hosting stack needs from a [`SiteConfig`]:
//! domains, certificate, DNS aliases, cache behaviours and outputs.
//! Nothing here talks to a provider; the plan is data.

use hyper::Method;
use serde::{Deserialize, Serialize};

use super::pattern::match_behavior;
use crate::config::SiteConfig;
use crate::edge::{FunctionAssociations, FunctionEventType};
use crate::error::Result;
use crate::http::CachePolicy;

/// Edge certificates must live in this region
pub const CERTIFICATE_REGION: &str = "us-east-1";

/// Headers forwarded to the API origin besides cookies and query strings
pub const API_FORWARDED_HEADERS: [&str; 8] = [
    "Origin",
    "Accept-Charset",
    "Accept",
    "Access-Control-Request-Method",
    "Access-Control-Request-Headers",
    "Referer",
    "Accept-Language",
    "Accept-Datetime",
];

/// Server-side function timeout (15 minutes)
pub const SERVER_FUNCTION_TIMEOUT_SECS: u32 = 900;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginKind {
    /// Object storage holding the build output
    Static,
    /// HTTP API in front of the server-side function
    Api,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewerProtocolPolicy {
    RedirectToHttps,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllowedMethods {
    GetHeadOptions,
    All,
}

impl AllowedMethods {
    pub fn allows(self, method: &Method) -> bool {
        match self {
            Self::GetHeadOptions => {
                matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
            }
            Self::All => true,
        }
    }

    pub const fn allow_header(self) -> &'static str {
        match self {
            Self::GetHeadOptions => "GET, HEAD, OPTIONS",
            Self::All => "GET, HEAD, OPTIONS, PUT, POST, PATCH, DELETE",
        }
    }
}

/// What the edge forwards to an origin on a cache miss
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginRequestPolicy {
    pub name: String,
    pub forward_all_cookies: bool,
    pub forward_all_query_strings: bool,
    pub headers: Vec<String>,
}

impl OriginRequestPolicy {
    /// Managed policy used for the static origin
    pub fn user_agent_referer() -> Self {
        Self {
            name: "user-agent-referer-headers".to_string(),
            forward_all_cookies: false,
            forward_all_query_strings: false,
            headers: vec!["User-Agent".to_string(), "Referer".to_string()],
        }
    }

    /// Policy used for the API origin
    pub fn api() -> Self {
        Self {
            name: "api-origin-request".to_string(),
            forward_all_cookies: true,
            forward_all_query_strings: true,
            headers: API_FORWARDED_HEADERS.iter().map(ToString::to_string).collect(),
        }
    }

    pub fn forwards_header(&self, name: &str) -> bool {
        (self.forward_all_cookies && name.eq_ignore_ascii_case("cookie"))
            || self.headers.iter().any(|h| h.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionAssociationPlan {
    pub function: String,
    pub event_type: FunctionEventType,
}

/// One cache behaviour; `path_pattern` is `None` for the default behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheBehavior {
    pub path_pattern: Option<String>,
    pub origin: OriginKind,
    pub compress: bool,
    pub viewer_protocol_policy: ViewerProtocolPolicy,
    pub allowed_methods: AllowedMethods,
    pub cache_policy: CachePolicy,
    pub origin_request_policy: OriginRequestPolicy,
    pub function_associations: Vec<FunctionAssociationPlan>,
}

impl CacheBehavior {
    pub fn static_site(path_pattern: Option<String>, functions: Vec<FunctionAssociationPlan>) -> Self {
        Self {
            path_pattern,
            origin: OriginKind::Static,
            compress: true,
            viewer_protocol_policy: ViewerProtocolPolicy::RedirectToHttps,
            allowed_methods: AllowedMethods::GetHeadOptions,
            cache_policy: CachePolicy::CachingOptimized,
            origin_request_policy: OriginRequestPolicy::user_agent_referer(),
            function_associations: functions,
        }
    }

    pub fn api(path_pattern: Option<String>) -> Self {
        Self {
            path_pattern,
            origin: OriginKind::Api,
            compress: true,
            viewer_protocol_policy: ViewerProtocolPolicy::RedirectToHttps,
            allowed_methods: AllowedMethods::All,
            cache_policy: CachePolicy::CachingDisabled,
            origin_request_policy: OriginRequestPolicy::api(),
            function_associations: Vec::new(),
        }
    }
}

/// CORS preflight answered in front of the API origin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorsPreflight {
    pub allow_headers: String,
    pub allow_methods: String,
    pub allow_origins: String,
    pub max_age_secs: u32,
}

impl Default for CorsPreflight {
    fn default() -> Self {
        Self {
            allow_headers: "*".to_string(),
            allow_methods: "*".to_string(),
            allow_origins: "*".to_string(),
            max_age_secs: 86_400,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Certificate {
    /// Existing certificate referenced by ARN
    Imported { arn: String },
    /// New certificate validated through DNS in the hosted zone
    Requested {
        domain_name: String,
        subject_alternative_names: Vec<String>,
        validation_zone: String,
        region: String,
    },
}

/// Alias record pointing a name at the distribution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    pub name: String,
    pub record_type: String,
    pub zone: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerFunctionPlan {
    pub memory_size: u32,
    pub log_retention_days: u32,
    pub timeout_secs: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionPlan {
    pub stack_name: String,
    pub hosted_zone: Option<String>,
    pub domain_names: Vec<String>,
    pub default_root_object: String,
    pub server_function: ServerFunctionPlan,
    pub static_sources: Vec<String>,
    pub invalidation_paths: Vec<String>,
    pub certificate: Option<Certificate>,
    pub dns_records: Vec<DnsRecord>,
    pub api_cors: CorsPreflight,
    pub default_behavior: CacheBehavior,
    pub behaviors: Vec<CacheBehavior>,
}

impl DistributionPlan {
    pub fn from_site(site: &SiteConfig) -> Result<Self> {
        site.validate()?;
        let functions = FunctionAssociations::for_site(site)?;
        Ok(Self::with_functions(site, &functions))
    }

    /// Build the plan for an already-selected set of functions
    pub fn with_functions(site: &SiteConfig, functions: &FunctionAssociations) -> Self {
        let fqdn = site.fqdn.as_deref();
        let hosted_zone = site
            .zone_name
            .clone()
            .or_else(|| fqdn.map(hosted_zone_for));
        let domain_names = fqdn.map(domain_names_for).unwrap_or_default();

        let certificate = match (&site.certificate_arn, fqdn, &hosted_zone) {
            (Some(arn), _, _) => Some(Certificate::Imported { arn: arn.clone() }),
            (None, Some(fqdn), Some(zone)) => Some(Certificate::Requested {
                domain_name: fqdn.to_string(),
                subject_alternative_names: apex_of(fqdn).map(str::to_string).into_iter().collect(),
                validation_zone: zone.clone(),
                region: CERTIFICATE_REGION.to_string(),
            }),
            _ => None,
        };

        let dns_records = hosted_zone
            .as_ref()
            .map(|zone| {
                domain_names
                    .iter()
                    .map(|name| DnsRecord {
                        name: name.clone(),
                        record_type: "A".to_string(),
                        zone: zone.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let function_plans: Vec<FunctionAssociationPlan> = functions
            .describe()
            .into_iter()
            .map(|(function, event_type)| FunctionAssociationPlan {
                function,
                event_type,
            })
            .collect();

        let default_behavior = if site.default_static_behaviour {
            CacheBehavior::static_site(None, function_plans.clone())
        } else {
            CacheBehavior::api(None)
        };

        let behaviors = site
            .routes
            .iter()
            .map(|route| CacheBehavior::static_site(Some(route.clone()), function_plans.clone()))
            .chain(
                site.api_routes
                    .iter()
                    .map(|route| CacheBehavior::api(Some(route.clone()))),
            )
            .collect();

        Self {
            stack_name: site.stack_name.clone(),
            hosted_zone,
            domain_names,
            default_root_object: if site.default_static_behaviour {
                "index.html".to_string()
            } else {
                String::new()
            },
            server_function: ServerFunctionPlan {
                memory_size: site.server_function.memory_size,
                log_retention_days: site.server_function.log_retention_days,
                timeout_secs: SERVER_FUNCTION_TIMEOUT_SECS,
            },
            static_sources: site.static_dirs.clone(),
            invalidation_paths: vec!["/*".to_string()],
            certificate,
            dns_records,
            api_cors: CorsPreflight::default(),
            default_behavior,
            behaviors,
        }
    }

    /// Behaviour serving `path`: first matching pattern, else the default
    pub fn select_behavior(&self, path: &str) -> &CacheBehavior {
        match_behavior(path, &self.behaviors).unwrap_or(&self.default_behavior)
    }

    /// Public URL of the site, given the distribution's own domain
    pub fn app_url(&self, distribution_domain: &str) -> String {
        let host = self
            .domain_names
            .first()
            .map_or(distribution_domain, String::as_str);
        format!("https://{host}")
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Zone holding a name: everything after its first label
pub fn hosted_zone_for(fqdn: &str) -> String {
    fqdn.split_once('.')
        .map_or_else(|| fqdn.to_string(), |(_, zone)| zone.to_string())
}

/// Apex name of a `www.` host
pub fn apex_of(fqdn: &str) -> Option<&str> {
    fqdn.strip_prefix("www.").filter(|apex| !apex.is_empty())
}

/// Names the distribution answers for
pub fn domain_names_for(fqdn: &str) -> Vec<String> {
    std::iter::once(fqdn)
        .chain(apex_of(fqdn))
        .map(ToString::to_string)
        .collect()
}

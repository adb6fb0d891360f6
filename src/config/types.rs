// Configuration types module
// Defines all configuration-related data structures

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    #[serde(default)]
    pub site: SiteConfig,
}

/// Local listener configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// error, warn, info or debug
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Connection handling configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    /// Largest request body forwarded to the API origin
    pub max_body_size: u64,
}

/// Which viewer-request function static behaviours get
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RequestFunctionKind {
    /// Static rewrite only when static content is the default behaviour
    #[default]
    Auto,
    StaticRewrite,
    None,
}

/// Site being hosted: domain, origins and cache behaviours
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SiteConfig {
    pub stack_name: String,
    /// Fully qualified domain name the site is served on
    pub fqdn: Option<String>,
    /// Hosted zone; derived from `fqdn` when unset
    pub zone_name: Option<String>,
    /// Existing certificate to import instead of requesting one
    pub certificate_arn: Option<String>,
    /// Serve the static origin when no path pattern matches
    pub default_static_behaviour: bool,
    /// Path patterns served from the static origin
    pub routes: Vec<String>,
    /// Path patterns served from the API origin
    pub api_routes: Vec<String>,
    /// Static origin content, searched in order
    pub static_dirs: Vec<String>,
    /// Base URI of the server-side handler, e.g. `http://127.0.0.1:3000`
    pub api_origin: Option<String>,
    pub request_function: RequestFunctionKind,
    /// Headers set on every static response
    pub response_headers: BTreeMap<String, String>,
    pub server_function: ServerFunctionConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            stack_name: "edgehost".to_string(),
            fqdn: None,
            zone_name: None,
            certificate_arn: None,
            default_static_behaviour: false,
            routes: Vec::new(),
            api_routes: Vec::new(),
            static_dirs: Vec::new(),
            api_origin: None,
            request_function: RequestFunctionKind::Auto,
            response_headers: BTreeMap::new(),
            server_function: ServerFunctionConfig::default(),
        }
    }
}

/// Sizing of the server-side function behind the API origin
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct ServerFunctionConfig {
    /// Megabytes
    pub memory_size: u32,
    pub log_retention_days: u32,
}

impl Default for ServerFunctionConfig {
    fn default() -> Self {
        Self {
            memory_size: 128,
            log_retention_days: 7,
        }
    }
}

// Configuration module entry point
// Layered loading (file, environment, defaults) and runtime state

mod state;
mod types;

use std::net::SocketAddr;

use crate::error::{Error, Result};

// Re-export public types
pub use state::AppState;
pub use types::{
    Config, HttpConfig, LoggingConfig, PerformanceConfig, RequestFunctionKind, ServerConfig,
    ServerFunctionConfig, SiteConfig,
};

/// Default config file name (without extension)
pub const DEFAULT_CONFIG_PATH: &str = "edgehost";

/// Environment variable prefix, e.g. `EDGEHOST_SITE__FQDN`
pub const ENV_PREFIX: &str = "EDGEHOST";

impl Config {
    /// Load configuration from specified file path (extension optional)
    ///
    /// The file may be absent, in which case environment variables and
    /// defaults make up the whole configuration.
    pub fn load_from(config_path: &str) -> Result<Self> {
        Self::load_with_env(config_path, environment())
    }

    fn load_with_env(config_path: &str, env: config::Environment) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(env)
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.max_body_size", 10_485_760)? // 10MB
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.site.validate()?;
        Ok(cfg)
    }

    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse()
            .map_err(|source| Error::InvalidAddress { addr, source })
    }
}

/// `EDGEHOST_<SECTION>__<KEY>` overrides, lists comma separated
fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("site.routes")
        .with_list_parse_key("site.api_routes")
        .with_list_parse_key("site.static_dirs")
}

impl SiteConfig {
    /// Reject configurations the distribution could not be built from
    pub fn validate(&self) -> Result<()> {
        if let Some(fqdn) = &self.fqdn {
            if fqdn.split('.').filter(|label| !label.is_empty()).count() < 2 {
                return Err(Error::Site(format!(
                    "fqdn '{fqdn}' needs at least two labels"
                )));
            }
        }

        if let Some(pattern) = self
            .routes
            .iter()
            .chain(&self.api_routes)
            .find(|p| p.trim().is_empty())
        {
            return Err(Error::Site(format!("empty path pattern '{pattern}'")));
        }

        if self.server_function.memory_size == 0 {
            return Err(Error::Site("server function memory size must be positive".into()));
        }

        if let Some(origin) = &self.api_origin {
            let uri: hyper::Uri = origin
                .parse()
                .map_err(|e| Error::Site(format!("invalid api origin '{origin}': {e}")))?;
            if uri.scheme_str() != Some("http") || uri.authority().is_none() {
                return Err(Error::Site(format!(
                    "api origin '{origin}' must be an absolute http:// URI"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_without_file() {
        let cfg = Config::load_from("/nonexistent/edgehost-test-config").unwrap();
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.logging.access_log_format, "combined");
        assert_eq!(cfg.http.max_body_size, 10_485_760);
        assert_eq!(cfg.site.server_function.memory_size, 128);
        assert_eq!(cfg.site.server_function.log_retention_days, 7);
        assert_eq!(cfg.site.request_function, RequestFunctionKind::Auto);
        assert!(!cfg.site.default_static_behaviour);
    }

    #[test]
    fn test_load_site_from_file() {
        let file = write_config(
            r#"
[server]
port = 9090

[site]
stack_name = "blog"
fqdn = "www.example.com"
default_static_behaviour = true
routes = ["/_app/*", "/favicon.png"]
api_routes = ["/api/*"]
static_dirs = ["build/client", "build/prerendered"]
api_origin = "http://127.0.0.1:3000"
request_function = "static-rewrite"

[site.response_headers]
"x-frame-options" = "DENY"

[site.server_function]
memory_size = 512
"#,
        );
        let cfg = Config::load_from(file.path().to_str().unwrap()).unwrap();
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.site.stack_name, "blog");
        assert_eq!(cfg.site.fqdn.as_deref(), Some("www.example.com"));
        assert_eq!(cfg.site.routes, vec!["/_app/*", "/favicon.png"]);
        assert_eq!(cfg.site.static_dirs.len(), 2);
        assert_eq!(cfg.site.request_function, RequestFunctionKind::StaticRewrite);
        assert_eq!(cfg.site.response_headers["x-frame-options"], "DENY");
        assert_eq!(cfg.site.server_function.memory_size, 512);
        assert_eq!(cfg.site.server_function.log_retention_days, 7);
    }

    fn env_source(vars: &[(&str, &str)]) -> config::Environment {
        let map = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        environment().source(Some(map))
    }

    #[test]
    fn test_environment_overrides() {
        let env = env_source(&[
            ("EDGEHOST_SITE__FQDN", "www.env.example.com"),
            ("EDGEHOST_SITE__API_ROUTES", "/a/*,/b/*"),
            ("EDGEHOST_SERVER__PORT", "9100"),
        ]);
        let cfg = Config::load_with_env("/nonexistent/edgehost-test-config", env).unwrap();
        assert_eq!(cfg.site.fqdn.as_deref(), Some("www.env.example.com"));
        assert_eq!(cfg.site.api_routes, vec!["/a/*", "/b/*"]);
        assert_eq!(cfg.server.port, 9100);
    }

    #[test]
    fn test_environment_overrides_file() {
        let file = write_config(
            r#"
[site]
stack_name = "blog"
routes = ["/_app/*"]
"#,
        );
        let env = env_source(&[
            ("EDGEHOST_SITE__STACK_NAME", "shop"),
            ("EDGEHOST_SITE__ROUTES", "/_app/*,/favicon.png"),
            ("EDGEHOST__SITE__FQDN", "www.ignored.com"),
        ]);
        let cfg = Config::load_with_env(file.path().to_str().unwrap(), env).unwrap();
        assert_eq!(cfg.site.stack_name, "shop");
        assert_eq!(cfg.site.routes, vec!["/_app/*", "/favicon.png"]);
        assert_eq!(cfg.site.fqdn, None);
    }

    #[test]
    fn test_socket_addr() {
        let mut cfg = Config::load_from("/nonexistent/edgehost-test-config").unwrap();
        assert_eq!(cfg.get_socket_addr().unwrap().port(), 8080);
        cfg.server.host = "not an ip".to_string();
        assert!(matches!(
            cfg.get_socket_addr(),
            Err(Error::InvalidAddress { .. })
        ));
    }

    #[test]
    fn test_validate_fqdn() {
        let site = SiteConfig {
            fqdn: Some("localhost".into()),
            ..SiteConfig::default()
        };
        assert!(site.validate().is_err());

        let site = SiteConfig {
            fqdn: Some("app.example.com".into()),
            ..SiteConfig::default()
        };
        assert!(site.validate().is_ok());
    }

    #[test]
    fn test_validate_patterns_and_origin() {
        let site = SiteConfig {
            api_routes: vec!["  ".into()],
            ..SiteConfig::default()
        };
        assert!(site.validate().is_err());

        let site = SiteConfig {
            api_origin: Some("https://api.example.com".into()),
            ..SiteConfig::default()
        };
        assert!(site.validate().is_err());

        let site = SiteConfig {
            api_origin: Some("/relative".into()),
            ..SiteConfig::default()
        };
        assert!(site.validate().is_err());

        let site = SiteConfig {
            api_origin: Some("http://localhost:3000".into()),
            ..SiteConfig::default()
        };
        assert!(site.validate().is_ok());
    }

    #[test]
    fn test_validate_memory_size() {
        let mut site = SiteConfig::default();
        site.server_function.memory_size = 0;
        assert!(site.validate().is_err());
    }
}

// Application state module
// Everything a request handler needs, built once from the configuration

use http_body_util::Full;
use hyper::body::Bytes;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Notify;

use super::types::Config;
use crate::distribution::DistributionPlan;
use crate::edge::FunctionAssociations;
use crate::error::Result;

/// Client used to reach the API origin
pub type OriginClient = Client<HttpConnector, Full<Bytes>>;

/// Application state
pub struct AppState {
    pub config: Config,
    pub plan: DistributionPlan,
    pub functions: FunctionAssociations,
    /// Static origin content, searched in order
    pub static_roots: Vec<PathBuf>,
    pub origin_client: OriginClient,
    pub shutdown: Arc<Notify>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        config.site.validate()?;
        let functions = FunctionAssociations::for_site(&config.site)?;
        let plan = DistributionPlan::with_functions(&config.site, &functions);
        let static_roots = config.site.static_dirs.iter().map(PathBuf::from).collect();
        let origin_client = Client::builder(TokioExecutor::new()).build_http();

        Ok(Self {
            config,
            plan,
            functions,
            static_roots,
            origin_client,
            shutdown: Arc::new(Notify::new()),
        })
    }

    pub fn access_log_enabled(&self) -> bool {
        self.config.logging.access_log
    }
}

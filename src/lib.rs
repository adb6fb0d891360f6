//! `edgehost` hosts a prerendered web application the way a content-delivery
//! edge would.
//!
//! - [`edge`]: viewer-request URI rewrite, edge event model, function associations
//! - [`distribution`]: distribution plan (domains, certificate, DNS, cache behaviours)
//! - [`config`]: layered configuration and runtime state
//! - [`handler`]: behaviour dispatch, static origin, API origin proxy
//! - [`server`]: listener, accept loop, shutdown
//! - [`logger`], [`http`], [`error`]: ambient plumbing

pub mod config;
pub mod distribution;
pub mod edge;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;

pub use error::{Error, Result};

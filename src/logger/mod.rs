//! Logger module
//!
//! Provides logging utilities for the edge host including:
//! - Server lifecycle logging
//! - Access logging with multiple formats
//! - Level-filtered error, warning, info and debug logging
//! - File-based logging support
//!
//! Before [`init`] runs (CLI subcommands, tests) messages at info level and
//! above go straight to stdout/stderr and debug output is dropped.

mod format;
pub mod writer;

pub use format::AccessLogEntry;
pub use writer::LogLevel;

use crate::config::Config;
use crate::distribution::DistributionPlan;
use std::net::SocketAddr;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    let level = config.logging.level.parse().unwrap_or_else(|e| {
        eprintln!("[WARN] {e}, falling back to info");
        LogLevel::Info
    });
    writer::init(
        level,
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

fn write(level: LogLevel, message: &str) {
    match writer::get() {
        Some(w) => w.write(level, message),
        None if level <= LogLevel::Warn => eprintln!("{message}"),
        None if level == LogLevel::Info => println!("{message}"),
        None => {}
    }
}

fn write_access(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config, plan: &DistributionPlan) {
    write(LogLevel::Info, "======================================");
    write(LogLevel::Info, "Edge host started");
    write(LogLevel::Info, &format!("Listening on: http://{addr}"));
    write(LogLevel::Info, &format!("Stack: {}", plan.stack_name));
    write(LogLevel::Info, &format!("App URL: {}", plan.app_url(&addr.to_string())));
    write(LogLevel::Info, &format!("Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        write(LogLevel::Info, &format!("Worker threads: {workers}"));
    }
    for dir in &plan.static_sources {
        write(LogLevel::Info, &format!("Static source: {dir}"));
    }
    match &config.site.api_origin {
        Some(origin) => write(LogLevel::Info, &format!("API origin: {origin}")),
        None => write(LogLevel::Info, "API origin: none (API behaviours answer 502)"),
    }
    for behavior in &plan.behaviors {
        write(
            LogLevel::Info,
            &format!(
                "Behaviour: {} -> {:?}",
                behavior.path_pattern.as_deref().unwrap_or("*"),
                behavior.origin
            ),
        );
    }
    write(
        LogLevel::Info,
        &format!("Default behaviour -> {:?}", plan.default_behavior.origin),
    );
    write(LogLevel::Info, "======================================\n");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    write(LogLevel::Debug, &format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write(LogLevel::Error, &format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_error(message: &str) {
    write(LogLevel::Error, &format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write(LogLevel::Warn, &format!("[WARN] {message}"));
}

pub fn log_info(message: &str) {
    write(LogLevel::Info, &format!("[INFO] {message}"));
}

pub fn log_debug(message: &str) {
    write(LogLevel::Debug, &format!("[DEBUG] {message}"));
}

/// Diagnostic output of the viewer-request rewrite
pub fn log_rewrite(original: &str, rewritten: &str) {
    if writer::get().is_some_and(|w| w.enabled(LogLevel::Debug)) {
        log_debug(&format!("[Rewrite] {original} -> {rewritten}"));
    }
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_access(&entry.format(format));
}

pub fn log_shutdown(active_connections: usize) {
    write(
        LogLevel::Info,
        &format!("[Shutdown] Listener closed, {active_connections} connection(s) still active"),
    );
}

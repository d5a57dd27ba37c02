//! Logger module
//!
//! Provides logging utilities for the framework including:
//! - Server lifecycle logging
//! - Route loading results
//! - Request and access logging
//! - Error and warning logging
//!
//! Every line is `[<timestamp>] [LEVEL] message`, echoed to the console and
//! appended to the configured log file.

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::Config;
use chrono::{SecondsFormat, Utc};
use std::net::SocketAddr;
use writer::Stream;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.features.enable_logging,
        Some(config.paths.log_file.as_str()),
    )
}

fn stamp(level: &str, message: &str) -> String {
    format!(
        "[{}] [{level}] {message}",
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
    )
}

fn write(stream: Stream, line: &str) {
    match writer::get() {
        Some(w) => w.write(stream, line),
        None => writer::write_console(stream, line),
    }
}

pub fn log_info(message: &str) {
    write(Stream::Stdout, &stamp("INFO", message));
}

pub fn log_warning(message: &str) {
    write(Stream::Stderr, &stamp("WARN", message));
}

pub fn log_error(message: &str) {
    write(Stream::Stderr, &stamp("ERROR", message));
}

pub fn log_logging_initialized() {
    log_info("Logging initialized");
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    log_info(&format!("Server running at http://{addr}"));
    if let Some(workers) = config.server.workers {
        log_info(&format!("Worker threads: {workers}"));
    }
    if config.features.enable_docs {
        log_info(&format!("API docs at http://{addr}/docs"));
    }
}

pub fn log_request(method: &str, uri: &str) {
    log_info(&format!("{method} {uri}"));
}

pub fn log_not_found(method: &str, path: &str) {
    log_warning(&format!("{method} {path} - 404 Not Found"));
}

pub fn log_route_loaded(path: &str) {
    log_info(&format!("Loaded route: {path}"));
}

pub fn log_route_failed(file: &str, err: &impl std::fmt::Display) {
    log_error(&format!("Failed to load route {file}: {err}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    log_error(&format!("Failed to serve connection: {err:?}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write(Stream::Stdout, &entry.format(format));
}

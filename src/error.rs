//! Error types
//!
//! Route loading failures are logged and skipped; dispatch failures become
//! structured JSON error responses.

use hyper::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

use crate::routing::HttpMethod;

/// A single route module that could not be loaded
#[derive(Debug, Error)]
pub enum RouteLoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid route module: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown HTTP method `{0}`")]
    UnknownMethod(String),

    #[error("route module declares no methods")]
    Empty,

    #[error("{method} must declare exactly one of `handler`, `json` or `text`")]
    Action { method: HttpMethod },

    #[error("{method} references unregistered handler `{name}`")]
    UnknownHandler { method: HttpMethod, name: String },

    #[error("invalid route pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Failure reported by a route handler
#[derive(Debug, Error)]
#[error("{0}")]
pub struct HandlerError(pub String);

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Terminal outcome of a request that did not reach a successful handler
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Not Found")]
    NotFound,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Method Not Allowed")]
    MethodNotAllowed { allowed: Vec<HttpMethod> },

    #[error("Payload Too Large")]
    PayloadTooLarge,

    #[error("Too many requests, please try again later.")]
    RateLimited,

    #[error("Internal Server Error")]
    Internal,
}

impl DispatchError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Startup failures
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid listen address: {0}")]
    Address(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

//! Request handler module
//!
//! Typed route handlers, the name registry route modules refer to, and
//! static file serving.

pub mod registry;
pub mod static_files;

pub use registry::HandlerRegistry;

use hyper::HeaderMap;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::HandlerError;
use crate::routing::HttpMethod;

pub type HandlerResult = Result<Value, HandlerError>;
pub type HandlerFuture = Pin<Box<dyn Future<Output = HandlerResult> + Send>>;

/// What a handler sees of the incoming request
#[derive(Debug, Clone)]
pub struct RouteRequest {
    pub method: HttpMethod,
    /// Raw request target, including the query string
    pub url: String,
    pub path: String,
    pub query: HashMap<String, String>,
    pub params: HashMap<String, String>,
    /// Parsed JSON body, `{}` when absent or malformed
    pub body: Value,
    pub headers: HeaderMap,
    pub remote_addr: Option<SocketAddr>,
}

impl RouteRequest {
    pub fn query(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

/// A route handler
///
/// Cloning is cheap; the callable is shared.
#[derive(Clone)]
pub struct Handler {
    inner: Arc<dyn Fn(RouteRequest) -> HandlerFuture + Send + Sync>,
}

impl Handler {
    /// Wrap an async handler
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(RouteRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self {
            inner: Arc::new(move |req| -> HandlerFuture { Box::pin(f(req)) }),
        }
    }

    /// Wrap a synchronous handler returning a JSON value
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(RouteRequest) -> Value + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Self::new(move |req| {
            let f = Arc::clone(&f);
            async move { Ok(f(req)) }
        })
    }

    /// A handler that always answers with the same payload
    pub fn fixed(value: Value) -> Self {
        Self::sync(move |_| value.clone())
    }

    pub fn call(&self, req: RouteRequest) -> HandlerFuture {
        (self.inner)(req)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Handler")
    }
}

#[cfg(test)]
pub(crate) fn test_request(method: HttpMethod, path: &str) -> RouteRequest {
    RouteRequest {
        method,
        url: path.to_string(),
        path: path.to_string(),
        query: HashMap::new(),
        params: HashMap::new(),
        body: Value::Object(serde_json::Map::new()),
        headers: HeaderMap::new(),
        remote_addr: None,
    }
}

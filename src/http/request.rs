//! Per-request context
//!
//! Carries everything the middleware chain and the handler need, plus the
//! headers middleware wants stamped on the eventual response.

use hyper::body::Bytes;
use hyper::header::{HeaderName, HeaderValue};
use hyper::{HeaderMap, Method};
use serde_json::Value;
use std::collections::HashMap;
use std::net::SocketAddr;

use crate::handler::RouteRequest;
use crate::routing::HttpMethod;

#[derive(Debug)]
pub struct RequestContext {
    pub method: Method,
    /// Request target as received (`/sum?num1=3`)
    pub url: String,
    pub path: String,
    pub query: HashMap<String, String>,
    pub params: HashMap<String, String>,
    pub headers: HeaderMap,
    pub remote_addr: Option<SocketAddr>,
    pub raw_body: Bytes,
    /// Set by the body parser
    pub body: Value,
    /// Headers added to whatever response this request ends with
    pub response_headers: HeaderMap,
}

impl RequestContext {
    pub fn new(
        method: Method,
        url: &str,
        headers: HeaderMap,
        remote_addr: Option<SocketAddr>,
        raw_body: Bytes,
    ) -> Self {
        let (path, query) = split_url(url);
        Self {
            method,
            url: url.to_string(),
            path,
            query,
            params: HashMap::new(),
            headers,
            remote_addr,
            raw_body,
            body: empty_object(),
            response_headers: HeaderMap::new(),
        }
    }

    pub fn set_response_header(&mut self, name: &'static str, value: &'static str) {
        self.response_headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }

    /// The handler's view of this request
    pub fn to_route_request(&self, method: HttpMethod) -> RouteRequest {
        RouteRequest {
            method,
            url: self.url.clone(),
            path: self.path.clone(),
            query: self.query.clone(),
            params: self.params.clone(),
            body: self.body.clone(),
            headers: self.headers.clone(),
            remote_addr: self.remote_addr,
        }
    }
}

pub fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

/// Split a request target into path and query mapping
///
/// Later duplicates of a key overwrite earlier ones; an undecodable query
/// string yields an empty mapping.
pub fn split_url(url: &str) -> (String, HashMap<String, String>) {
    let (path, query) = url.split_once('?').unwrap_or((url, ""));
    let query = serde_urlencoded::from_str::<Vec<(String, String)>>(query)
        .map(|pairs| pairs.into_iter().collect())
        .unwrap_or_default();
    (path.to_string(), query)
}

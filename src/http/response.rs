//! HTTP response building module
//!
//! Builders for handler payloads and structured JSON errors.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, ALLOW, CONTENT_LENGTH, CONTENT_TYPE};
use hyper::{HeaderMap, Response, StatusCode};
use serde_json::{json, Value};

use crate::config::ResponseType;
use crate::error::DispatchError;

pub type HttpResponse = Response<Full<Bytes>>;

pub const JSON: &str = "application/json";
pub const TEXT: &str = "text/plain; charset=utf-8";

/// Build a response with a body and content type
pub fn build_response(status: StatusCode, content_type: &str, body: Bytes) -> HttpResponse {
    let len = body.len();
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, content_type)
        .header(CONTENT_LENGTH, len)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error(status, &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Serialize a handler payload per the configured response type
pub fn build_payload_response(value: &Value, response_type: ResponseType) -> HttpResponse {
    match response_type {
        ResponseType::Json => {
            build_response(StatusCode::OK, JSON, Bytes::from(value.to_string()))
        }
        ResponseType::Text => {
            let text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            build_response(StatusCode::OK, TEXT, Bytes::from(text))
        }
    }
}

/// Build `{"error": "..."}` with the status of the error
pub fn build_error_response(err: &DispatchError) -> HttpResponse {
    let body = json!({ "error": err.to_string() }).to_string();
    let mut response = build_response(err.status(), JSON, Bytes::from(body));

    if let DispatchError::MethodNotAllowed { allowed } = err {
        let allow = allowed
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        if let Ok(value) = HeaderValue::from_str(&allow) {
            response.headers_mut().insert(ALLOW, value);
        }
    }
    response
}

/// Build an empty-bodied response (e.g. 204 preflight)
pub fn build_empty_response(status: StatusCode) -> HttpResponse {
    Response::builder()
        .status(status)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error(status, &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Copy headers onto a response without replacing ones it already set
pub fn apply_headers(response: &mut HttpResponse, headers: &HeaderMap) {
    for (name, value) in headers {
        if !response.headers().contains_key(name) {
            response.headers_mut().insert(name.clone(), value.clone());
        }
    }
}

/// Log response build error
fn log_build_error(status: StatusCode, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

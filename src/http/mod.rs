//! HTTP protocol layer module
//!
//! Request context, response builders and MIME detection shared by the
//! dispatcher, middleware and static file serving.

pub mod mime;
pub mod request;
pub mod response;

// Re-export commonly used types
pub use request::{empty_object, split_url, RequestContext};
pub use response::{
    apply_headers, build_empty_response, build_error_response, build_payload_response,
    build_response, HttpResponse,
};

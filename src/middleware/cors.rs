//! CORS headers and preflight handling

use async_trait::async_trait;
use hyper::{Method, StatusCode};

use super::{Flow, Middleware};
use crate::http::{build_empty_response, RequestContext};

pub struct Cors;

#[async_trait]
impl Middleware for Cors {
    fn name(&self) -> &'static str {
        "cors"
    }

    async fn handle(&self, ctx: &mut RequestContext) -> Flow {
        ctx.set_response_header("access-control-allow-origin", "*");
        ctx.set_response_header(
            "access-control-allow-methods",
            "GET, POST, PUT, DELETE, OPTIONS",
        );
        ctx.set_response_header(
            "access-control-allow-headers",
            "Content-Type, Authorization",
        );

        if ctx.method == Method::OPTIONS {
            return Flow::Respond(build_empty_response(StatusCode::NO_CONTENT));
        }
        Flow::Proceed
    }
}

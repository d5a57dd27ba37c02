//! JSON body parser
//!
//! Always the first step. Never fails the request: an empty or malformed
//! body becomes `{}`.

use async_trait::async_trait;

use super::{Flow, Middleware};
use crate::http::{empty_object, RequestContext};
use crate::logger;

pub struct BodyParser;

#[async_trait]
impl Middleware for BodyParser {
    fn name(&self) -> &'static str {
        "body-parser"
    }

    async fn handle(&self, ctx: &mut RequestContext) -> Flow {
        ctx.body = if ctx.raw_body.is_empty() {
            empty_object()
        } else {
            serde_json::from_slice(&ctx.raw_body).unwrap_or_else(|_| {
                logger::log_warning("Failed to parse JSON body");
                empty_object()
            })
        };
        Flow::Proceed
    }
}

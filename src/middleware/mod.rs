//! Middleware chain
//!
//! Each step inspects or mutates the [`RequestContext`] and returns a
//! [`Flow`]: proceed to the next step, or answer the request right away.
//! The chain walks the steps in registration order and stops at the first
//! `Respond`.

mod body_parser;
mod cors;
mod rate_limit;

pub use body_parser::BodyParser;
pub use cors::Cors;
pub use rate_limit::{RateDecision, RateLimit, RateLimiter};

use async_trait::async_trait;
use std::sync::Arc;

use crate::http::{HttpResponse, RequestContext};

/// Outcome of one middleware step
#[derive(Debug)]
pub enum Flow {
    Proceed,
    Respond(HttpResponse),
}

#[async_trait]
pub trait Middleware: Send + Sync {
    fn name(&self) -> &'static str;

    async fn handle(&self, ctx: &mut RequestContext) -> Flow;
}

/// Middleware built from a synchronous closure
pub struct FnMiddleware<F> {
    name: &'static str,
    f: F,
}

#[async_trait]
impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(&mut RequestContext) -> Flow + Send + Sync,
{
    fn name(&self) -> &'static str {
        self.name
    }

    async fn handle(&self, ctx: &mut RequestContext) -> Flow {
        (self.f)(ctx)
    }
}

/// Wrap a closure as middleware
pub fn from_fn<F>(name: &'static str, f: F) -> Arc<dyn Middleware>
where
    F: Fn(&mut RequestContext) -> Flow + Send + Sync + 'static,
{
    Arc::new(FnMiddleware { name, f })
}

#[derive(Clone, Default)]
pub struct MiddlewareChain {
    steps: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, middleware: Arc<dyn Middleware>) {
        self.steps.push(middleware);
    }

    /// Run every step until one responds
    pub async fn run(&self, ctx: &mut RequestContext) -> Flow {
        for step in &self.steps {
            if let Flow::Respond(response) = step.handle(ctx).await {
                return Flow::Respond(response);
            }
        }
        Flow::Proceed
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
pub(crate) fn test_context(method: hyper::Method, url: &str, body: &'static [u8]) -> RequestContext {
    RequestContext::new(
        method,
        url,
        hyper::HeaderMap::new(),
        Some(([127, 0, 0, 1], 4000).into()),
        hyper::body::Bytes::from_static(body),
    )
}

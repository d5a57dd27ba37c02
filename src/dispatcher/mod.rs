//! Request dispatcher
//!
//! Turns one HTTP request into one response:
//! 1. Reserved `/docs` prefix (when docs are enabled)
//! 2. Static files (when enabled, `GET` only)
//! 3. Body collection, middleware chain
//! 4. Route resolution and guarded handler invocation
//!
//! Every failure ends in a structured JSON error response.

mod docs;

pub use docs::build_docs;

use http_body_util::{BodyExt, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderName, REFERER, USER_AGENT};
use hyper::{Method, Request, StatusCode};
use serde_json::json;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::error::DispatchError;
use crate::events::EventBus;
use crate::handler::{static_files, Handler, RouteRequest};
use crate::http::response::JSON;
use crate::http::{
    apply_headers, build_error_response, build_payload_response, build_response, HttpResponse,
    RequestContext,
};
use crate::logger::{self, AccessLogEntry};
use crate::middleware::{Flow, MiddlewareChain};
use crate::routing::{HttpMethod, Resolution, RouteTable};

pub const DOCS_PREFIX: &str = "/docs";

/// Whether `path` is `prefix` itself or lies beneath it
pub fn is_reserved(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

pub struct Dispatcher {
    table: Arc<RouteTable>,
    chain: MiddlewareChain,
    events: EventBus,
    config: Arc<Config>,
    /// Serialized `/docs` payload, present when docs are enabled
    docs: Option<Bytes>,
}

impl Dispatcher {
    pub fn new(
        table: RouteTable,
        chain: MiddlewareChain,
        events: EventBus,
        config: Arc<Config>,
    ) -> Self {
        let docs = config
            .features
            .enable_docs
            .then(|| Bytes::from(build_docs(&table, &config.docs).to_string()));
        Self {
            table: Arc::new(table),
            chain,
            events,
            config,
            docs,
        }
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn chain(&self) -> &MiddlewareChain {
        &self.chain
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Handle one request
    pub async fn handle<B>(&self, req: Request<B>, remote_addr: Option<SocketAddr>) -> HttpResponse
    where
        B: Body<Data = Bytes>,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let started = Instant::now();
        let url = req
            .uri()
            .path_and_query()
            .map_or_else(|| req.uri().path().to_string(), |pq| pq.as_str().to_string());
        logger::log_request(req.method().as_str(), &url);

        let access = self
            .config
            .logging
            .access_log
            .then(|| access_entry(&req, &url, remote_addr));

        let response = self.dispatch(req, &url, remote_addr).await;

        if let Some(mut entry) = access {
            entry.status = response.status().as_u16();
            entry.body_bytes = usize::try_from(response.body().size_hint().lower()).unwrap_or(0);
            entry.request_time_us =
                u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
            logger::log_access(&entry, &self.config.logging.access_log_format);
        }
        response
    }

    async fn dispatch<B>(
        &self,
        req: Request<B>,
        url: &str,
        remote_addr: Option<SocketAddr>,
    ) -> HttpResponse
    where
        B: Body<Data = Bytes>,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let path = req.uri().path();

        if let Some(docs) = &self.docs {
            if is_reserved(path, DOCS_PREFIX) {
                if path == DOCS_PREFIX && req.method() == Method::GET {
                    return build_response(StatusCode::OK, JSON, docs.clone());
                }
                return build_error_response(&DispatchError::Forbidden(format!(
                    "{DOCS_PREFIX} is reserved"
                )));
            }
        }

        if self.config.features.serve_static && req.method() == Method::GET {
            let root = Path::new(&self.config.paths.static_dir);
            if let Some(response) = static_files::serve(root, path).await {
                return response;
            }
        }

        let (parts, body) = req.into_parts();
        let limit = usize::try_from(self.config.http.max_body_size).unwrap_or(usize::MAX);
        let raw_body = match Limited::new(body, limit).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) if e.is::<http_body_util::LengthLimitError>() => {
                logger::log_warning(&format!("Request body over {limit} bytes rejected"));
                return build_error_response(&DispatchError::PayloadTooLarge);
            }
            Err(e) => {
                logger::log_warning(&format!("Failed to read request body: {e}"));
                Bytes::new()
            }
        };

        let mut ctx = RequestContext::new(parts.method, url, parts.headers, remote_addr, raw_body);

        let mut response = match self.chain.run(&mut ctx).await {
            Flow::Respond(response) => response,
            Flow::Proceed => self.route(&mut ctx).await,
        };
        apply_headers(&mut response, &ctx.response_headers);
        response
    }

    async fn route(&self, ctx: &mut RequestContext) -> HttpResponse {
        let Some(method) = HttpMethod::from_hyper(&ctx.method) else {
            return self.unroutable(ctx);
        };

        match self.table.resolve(&ctx.path, method) {
            Resolution::Found { handler, params } => {
                ctx.params = params;
                self.invoke(handler, ctx.to_route_request(method)).await
            }
            Resolution::MethodNotAllowed { allowed } => {
                build_error_response(&DispatchError::MethodNotAllowed { allowed })
            }
            Resolution::NotFound => self.not_found(ctx),
        }
    }

    /// A method no route module can declare: 405 if the path exists at all
    fn unroutable(&self, ctx: &RequestContext) -> HttpResponse {
        let allowed: Vec<HttpMethod> = HttpMethod::ALL
            .into_iter()
            .filter(|m| matches!(self.table.resolve(&ctx.path, *m), Resolution::Found { .. }))
            .collect();
        if allowed.is_empty() {
            self.not_found(ctx)
        } else {
            build_error_response(&DispatchError::MethodNotAllowed { allowed })
        }
    }

    fn not_found(&self, ctx: &RequestContext) -> HttpResponse {
        logger::log_not_found(ctx.method.as_str(), &ctx.path);
        self.events.emit(
            "request:not_found",
            &json!({ "method": ctx.method.as_str(), "path": ctx.path }),
        );
        build_error_response(&DispatchError::NotFound)
    }

    /// Run the handler on its own task so a panic cannot take the connection down
    async fn invoke(&self, handler: Handler, req: RouteRequest) -> HttpResponse {
        let label = format!("{} {}", req.method, req.path);

        match tokio::spawn(handler.call(req)).await {
            Ok(Ok(value)) => {
                build_payload_response(&value, self.config.features.default_response_type)
            }
            Ok(Err(err)) => {
                logger::log_error(&format!("Handler for {label} failed: {err}"));
                build_error_response(&DispatchError::Internal)
            }
            Err(join_err) => {
                if join_err.is_panic() {
                    logger::log_error(&format!("Handler for {label} panicked"));
                } else {
                    logger::log_error(&format!("Handler for {label} was cancelled"));
                }
                build_error_response(&DispatchError::Internal)
            }
        }
    }
}

fn access_entry<B>(req: &Request<B>, url: &str, remote_addr: Option<SocketAddr>) -> AccessLogEntry {
    let header = |name: HeaderName| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let mut entry = AccessLogEntry::new(
        remote_addr.map_or_else(|| "-".to_string(), |a| a.ip().to_string()),
        req.method().to_string(),
        url.to_string(),
    );
    entry.http_version = match req.version() {
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2.0",
        _ => "1.1",
    }
    .to_string();
    entry.referer = header(REFERER);
    entry.user_agent = header(USER_AGENT);
    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResponseType;
    use crate::error::HandlerError;
    use crate::handler::HandlerRegistry;
    use crate::middleware::{from_fn, BodyParser, Cors, RateLimit};
    use crate::routing::{DynamicRouteEntry, MethodRoute, RouteEntry, RouteModule, RoutePattern};
    use http_body_util::Full;
    use hyper::header::{ALLOW, CONTENT_TYPE};
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sum(req: RouteRequest) -> Value {
        let parse = |key| req.query(key).and_then(|v| v.trim().parse::<i64>().ok());
        match (parse("num1"), parse("num2")) {
            (Some(a), Some(b)) => a.checked_add(b).map_or_else(
                || json!({ "error": "Invalid numbers provided" }),
                |sum| json!({ "sum": sum }),
            ),
            _ => json!({ "error": "Invalid numbers provided" }),
        }
    }

    fn table() -> RouteTable {
        let mut registry = HandlerRegistry::new();
        registry.register_sync("sum", sum);
        registry.register_sync("echo", |req| json!({ "id": req.param("id"), "body": req.body }));
        registry.register_sync("explode", |_| -> Value { panic!("handler exploded") });
        registry.register_async("fail", |_| async { Err(HandlerError::new("db down")) });

        let mut table = RouteTable::new();
        let modules = [
            ("/api/v1/sum", "[GET]\nhandler = \"sum\"\n"),
            ("/explode", "[GET]\nhandler = \"explode\"\n"),
            ("/fail", "[GET]\nhandler = \"fail\"\n"),
            ("/greeting", "[GET]\ntext = \"hello\"\n"),
        ];
        for (path, source) in modules {
            let routes = RouteModule::parse(source).unwrap().bind(&registry).unwrap();
            for (method, route) in routes {
                table.register(RouteEntry {
                    path: path.to_string(),
                    method,
                    route,
                });
            }
        }

        let user = RouteModule::parse("[GET]\nhandler = \"echo\"\n[POST]\nhandler = \"echo\"\n")
            .unwrap()
            .bind(&registry)
            .unwrap();
        table.register_dynamic(DynamicRouteEntry {
            pattern: RoutePattern::parse("/user/[id]").unwrap(),
            handlers: user,
        });
        table
    }

    fn dispatcher_with(config: Config, extra: impl FnOnce(&mut MiddlewareChain)) -> Dispatcher {
        let mut chain = MiddlewareChain::new();
        chain.push(Arc::new(BodyParser));
        extra(&mut chain);
        Dispatcher::new(table(), chain, EventBus::new(), Arc::new(config))
    }

    fn dispatcher() -> Dispatcher {
        dispatcher_with(Config::default(), |_| {})
    }

    fn request(method: Method, uri: &str, body: &'static str) -> Request<Full<Bytes>> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Full::new(Bytes::from_static(body.as_bytes())))
            .unwrap()
    }

    async fn send(d: &Dispatcher, method: Method, uri: &str, body: &'static str) -> HttpResponse {
        d.handle(request(method, uri, body), Some(([127, 0, 0, 1], 5000).into()))
            .await
    }

    async fn body_json(response: HttpResponse) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_is_reserved() {
        assert!(is_reserved("/docs", "/docs"));
        assert!(is_reserved("/docs/extra", "/docs"));
        assert!(!is_reserved("/docsearch", "/docs"));
        assert!(!is_reserved("/api/docs", "/docs"));
    }

    #[test]
    fn test_exposes_table_and_chain() {
        let d = dispatcher_with(Config::default(), |chain| chain.push(Arc::new(Cors)));
        assert_eq!(d.table().static_len(), 4);
        assert_eq!(d.table().dynamic_len(), 1);
        assert_eq!(d.chain().names(), ["body-parser", "cors"]);
    }

    #[tokio::test]
    async fn test_sum_route() {
        let d = dispatcher();
        let response = send(&d, Method::GET, "/api/v1/sum?num1=3&num2=4", "").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(body_json(response).await, json!({ "sum": 7 }));

        let response = send(&d, Method::GET, "/api/v1/sum?num1=a&num2=4", "").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "error": "Invalid numbers provided" })
        );
    }

    #[tokio::test]
    async fn test_unknown_path_is_404_and_emits_event() {
        let d = dispatcher();
        let misses = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&misses);
        d.events.on("request:not_found", move |data| {
            assert_eq!(data["path"], "/unknown/path");
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let response = send(&d, Method::GET, "/unknown/path", "").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, json!({ "error": "Not Found" }));
        assert_eq!(misses.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dynamic_params_and_body() {
        let d = dispatcher();
        let response = send(&d, Method::POST, "/user/42", r#"{"name":"ada"}"#).await;
        assert_eq!(
            body_json(response).await,
            json!({ "id": "42", "body": { "name": "ada" } })
        );

        let response = send(&d, Method::GET, "/user/john%20doe", "").await;
        assert_eq!(body_json(response).await["id"], "john doe");

        let response = send(&d, Method::GET, "/user/42/extra", "").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_body_still_reaches_handler() {
        let d = dispatcher();
        let response = send(&d, Method::POST, "/user/7", "{oops").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({ "id": "7", "body": {} }));
    }

    #[tokio::test]
    async fn test_method_not_allowed() {
        let d = dispatcher();
        let response = send(&d, Method::DELETE, "/user/42", "").await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "GET, POST");

        let response = send(&d, Method::POST, "/api/v1/sum", "").await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

        let custom = Method::from_bytes(b"PURGE").unwrap();
        let response = send(&d, custom.clone(), "/api/v1/sum", "").await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        let response = send(&d, custom, "/nowhere", "").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_panic_and_error_become_500() {
        let d = dispatcher();
        let response = send(&d, Method::GET, "/explode", "").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({ "error": "Internal Server Error" })
        );

        let response = send(&d, Method::GET, "/fail", "").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        // still serving
        let response = send(&d, Method::GET, "/api/v1/sum?num1=1&num2=1", "").await;
        assert_eq!(body_json(response).await, json!({ "sum": 2 }));
    }

    #[tokio::test]
    async fn test_cors_preflight_skips_handler() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let d = dispatcher_with(Config::default(), |chain| {
            chain.push(Arc::new(Cors));
            chain.push(from_fn("count", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Flow::Proceed
            }));
        });

        let response = send(&d, Method::OPTIONS, "/api/v1/sum", "").await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        // CORS headers ride on routed responses too
        let response = send(&d, Method::GET, "/nowhere", "").await;
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }

    #[tokio::test]
    async fn test_docs_endpoint_and_reserved_prefix() {
        let mut config = Config::default();
        config.features.enable_docs = true;
        let d = dispatcher_with(config, |_| {});

        let response = send(&d, Method::GET, "/docs", "").await;
        assert_eq!(response.status(), StatusCode::OK);
        let docs = body_json(response).await;
        assert!(docs["paths"]["/api/v1/sum"]["get"].is_object());
        assert!(docs["paths"]["/user/[id]"]["post"].is_object());

        let response = send(&d, Method::GET, "/docs/extra", "").await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let response = send(&d, Method::POST, "/docs", "").await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_docs_disabled_falls_through() {
        let d = dispatcher();
        let response = send(&d, Method::GET, "/docs", "").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_text_mode() {
        let mut config = Config::default();
        config.features.default_response_type = ResponseType::Text;
        let d = dispatcher_with(config, |_| {});

        let response = send(&d, Method::GET, "/greeting", "").await;
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain; charset=utf-8");
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"hello");

        let response = send(&d, Method::GET, "/api/v1/sum?num1=1&num2=2", "").await;
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], br#"{"sum":3}"#);
    }

    #[tokio::test]
    async fn test_body_over_limit_is_413() {
        let mut config = Config::default();
        config.http.max_body_size = 4;
        let d = dispatcher_with(config, |_| {});
        let response = send(&d, Method::POST, "/user/1", r#"{"a":1}"#).await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_rate_limit_101st_request() {
        let config = Config::default();
        let limit = config.rate_limit;
        let d = dispatcher_with(config, |chain| chain.push(Arc::new(RateLimit::new(limit))));

        for _ in 0..100 {
            let response = send(&d, Method::GET, "/api/v1/sum?num1=1&num2=1", "").await;
            assert_eq!(response.status(), StatusCode::OK);
        }
        let response = send(&d, Method::GET, "/api/v1/sum?num1=1&num2=1", "").await;
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            body_json(response).await,
            json!({ "error": "Too many requests, please try again later." })
        );
    }

    #[tokio::test]
    async fn test_static_files_served_before_routing() {
        let root = std::env::temp_dir().join(format!("zing-dispatch-static-{}", std::process::id()));
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("style.css"), "body{}").unwrap();

        let mut config = Config::default();
        config.features.serve_static = true;
        config.paths.static_dir = root.display().to_string();
        let d = dispatcher_with(config, |_| {});

        let response = send(&d, Method::GET, "/style.css", "").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/css");

        // misses fall through to routing
        let response = send(&d, Method::GET, "/api/v1/sum?num1=2&num2=2", "").await;
        assert_eq!(body_json(response).await, json!({ "sum": 4 }));
        std::fs::remove_dir_all(&root).ok();
    }

    #[tokio::test]
    async fn test_reregistered_route_wins() {
        let mut table = table();
        table.register(RouteEntry {
            path: "/api/v1/sum".into(),
            method: HttpMethod::Get,
            route: MethodRoute::new(Handler::fixed(json!({ "replaced": true }))),
        });
        let d = Dispatcher::new(table, MiddlewareChain::new(), EventBus::new(), Arc::default());
        let response = send(&d, Method::GET, "/api/v1/sum", "").await;
        assert_eq!(body_json(response).await, json!({ "replaced": true }));
    }
}

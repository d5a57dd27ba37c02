//! Application builder
//!
//! Collects handlers, middleware and event listeners, then runs startup as
//! one explicit phase: folders, logging, routes, middleware chain. Only
//! after that does the server accept connections.

use serde_json::{json, Value};
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

use crate::config::Config;
use crate::dispatcher::{Dispatcher, DOCS_PREFIX};
use crate::error::ServerError;
use crate::events::EventBus;
use crate::handler::{static_files, Handler, HandlerRegistry, HandlerResult, RouteRequest};
use crate::logger;
use crate::middleware::{BodyParser, Cors, Middleware, MiddlewareChain, RateLimit};
use crate::routing::{HttpMethod, MethodRoute, RouteEntry, RouteLoader, RouteTable};
use crate::server::{self, Readiness, SignalHandler};

pub struct App {
    config: Arc<Config>,
    registry: HandlerRegistry,
    middleware: Vec<Arc<dyn Middleware>>,
    events: EventBus,
    readiness: Readiness,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            registry: HandlerRegistry::new(),
            middleware: Vec::new(),
            events: EventBus::new(),
            readiness: Readiness::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Register a named handler for route modules to reference
    pub fn handler(&mut self, name: impl Into<String>, handler: Handler) -> &mut Self {
        self.registry.insert(name, handler);
        self
    }

    pub fn register_sync<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(RouteRequest) -> Value + Send + Sync + 'static,
    {
        self.registry.register_sync(name, f);
        self
    }

    pub fn register_async<F, Fut>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(RouteRequest) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = HandlerResult> + Send + 'static,
    {
        self.registry.register_async(name, f);
        self
    }

    /// Append a middleware after the built-in ones
    pub fn use_middleware(&mut self, middleware: Arc<dyn Middleware>) -> &mut Self {
        self.middleware.push(middleware);
        self
    }

    pub fn on<F>(&self, event: impl Into<String>, listener: F)
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.events.on(event, listener);
    }

    pub fn emit(&self, event: &str, data: &Value) -> usize {
        self.events.emit(event, data)
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Handle that flips once the server starts accepting
    pub fn readiness(&self) -> Readiness {
        self.readiness.clone()
    }

    /// Run startup and produce the dispatcher
    pub async fn build(&self) -> Result<Dispatcher, ServerError> {
        match logger::init(&self.config) {
            Ok(()) => logger::log_logging_initialized(),
            // a previous app in this process already owns the writer
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(e.into()),
        }

        if self.config.features.serve_static {
            static_files::ensure_static_dir(Path::new(&self.config.paths.static_dir)).await?;
        }

        let mut table = RouteTable::new();
        register_default_routes(&mut table);

        let mut loader =
            RouteLoader::new(&self.config.paths.routes_dir, &self.registry).with_events(&self.events);
        if self.config.features.enable_docs {
            loader = loader.with_reserved_prefix(DOCS_PREFIX);
        }
        loader.ensure_root().await?;
        let report = loader.load(&mut table).await?;
        logger::log_info(&format!(
            "Routes ready: {} loaded, {} failed",
            report.loaded.len(),
            report.failed.len()
        ));

        Ok(Dispatcher::new(
            table,
            self.chain(),
            self.events.clone(),
            Arc::clone(&self.config),
        ))
    }

    fn chain(&self) -> MiddlewareChain {
        let features = &self.config.features;
        let mut chain = MiddlewareChain::new();
        chain.push(Arc::new(BodyParser));
        if features.enable_cors {
            chain.push(Arc::new(Cors));
        }
        if features.enable_rate_limit {
            chain.push(Arc::new(RateLimit::new(self.config.rate_limit)));
        }
        for middleware in &self.middleware {
            chain.push(Arc::clone(middleware));
        }
        chain
    }

    /// Start up, bind and serve until shutdown
    pub async fn listen(self) -> Result<(), ServerError> {
        let addr = self.config.get_socket_addr().map_err(ServerError::Address)?;

        let local = tokio::task::LocalSet::new();
        local
            .run_until(async move {
                let dispatcher = Rc::new(self.build().await?);
                let listener = server::create_listener(addr)?;
                let local_addr = listener.local_addr()?;

                let signals = Arc::new(SignalHandler::new());
                server::start_signal_handler(Arc::clone(&signals));

                self.readiness.mark_ready();
                self.events
                    .emit("server:ready", &json!({ "address": local_addr.to_string() }));
                logger::log_server_start(&local_addr, &self.config);

                server::start_server_loop(listener, dispatcher, self.readiness.clone(), signals)
                    .await;
                Ok(())
            })
            .await
    }
}

/// Built-in routes; route modules at the same paths replace them
fn register_default_routes(table: &mut RouteTable) {
    let defaults = [
        ("/", json!({ "message": "Welcome to Zing!" })),
        ("/index", json!({ "message": "Hello from Zing dynamic route!" })),
    ];
    for (path, payload) in defaults {
        table.register(RouteEntry {
            path: path.to_string(),
            method: HttpMethod::Get,
            route: MethodRoute::new(Handler::fixed(payload)),
        });
    }
}

//! Zing: a small HTTP framework with file-discovered routes
//!
//! Route modules are `*.toml` files under the routes directory; their path
//! relative to that directory is the URL path (`api/v1/sum.toml` serves
//! `/api/v1/sum`, `user/[id].toml` serves `/user/<anything>`). A module maps
//! HTTP methods to a named Rust handler or a fixed payload.

pub mod app;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod handler;
pub mod http;
pub mod logger;
pub mod middleware;
pub mod routing;
pub mod server;

pub use app::App;
pub use config::Config;
pub use dispatcher::Dispatcher;
pub use error::{DispatchError, HandlerError, RouteLoadError, ServerError};
pub use events::EventBus;
pub use handler::{Handler, HandlerRegistry, HandlerResult, RouteRequest};
pub use middleware::{from_fn, Flow, Middleware};

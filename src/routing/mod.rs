//! Routing module
//!
//! File-system route discovery and resolution:
//! - Route modules loaded from the routes directory
//! - Exact `(path, method)` routes
//! - Bracket-parameter patterns (`/user/[id]`), first match wins

pub mod loader;
mod method;
pub mod module;
mod pattern;
mod table;

pub use loader::{LoadReport, RouteLoader};
pub use method::HttpMethod;
pub use module::{RouteAction, RouteModule};
pub use pattern::{is_dynamic, RoutePattern};
pub use table::{
    DynamicRouteEntry, MethodRoute, Resolution, RouteDoc, RouteEntry, RouteTable,
};

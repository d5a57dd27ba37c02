//! Route table
//!
//! Exact `(path, method)` entries plus an ordered list of dynamic patterns.
//!
//! Resolution order:
//! 1. Exact path with the requested method
//! 2. First dynamic pattern matching the path (registration order)
//! 3. Exact path known under other methods -> method not allowed
//! 4. Not found

use std::collections::{BTreeMap, HashMap};

use super::method::HttpMethod;
use super::pattern::RoutePattern;
use crate::handler::Handler;

/// One method of a route module
#[derive(Debug, Clone)]
pub struct MethodRoute {
    pub handler: Handler,
    pub description: Option<String>,
}

impl MethodRoute {
    pub const fn new(handler: Handler) -> Self {
        Self {
            handler,
            description: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A static route keyed by `(path, method)`
#[derive(Debug, Clone)]
pub struct RouteEntry {
    pub path: String,
    pub method: HttpMethod,
    pub route: MethodRoute,
}

/// A route whose path has bracket segments
#[derive(Debug, Clone)]
pub struct DynamicRouteEntry {
    pub pattern: RoutePattern,
    pub handlers: BTreeMap<HttpMethod, MethodRoute>,
}

/// Outcome of resolving a request against the table
#[derive(Debug)]
pub enum Resolution {
    Found {
        handler: Handler,
        params: HashMap<String, String>,
    },
    MethodNotAllowed {
        allowed: Vec<HttpMethod>,
    },
    NotFound,
}

/// Documentation row for one route method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDoc {
    pub path: String,
    pub method: HttpMethod,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    static_routes: HashMap<String, BTreeMap<HttpMethod, MethodRoute>>,
    dynamic_routes: Vec<DynamicRouteEntry>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a static route
    pub fn register(&mut self, entry: RouteEntry) {
        self.static_routes
            .entry(entry.path)
            .or_default()
            .insert(entry.method, entry.route);
    }

    /// Append a dynamic route; an already registered pattern is replaced in place
    pub fn register_dynamic(&mut self, entry: DynamicRouteEntry) {
        if let Some(existing) = self
            .dynamic_routes
            .iter_mut()
            .find(|d| d.pattern.as_str() == entry.pattern.as_str())
        {
            *existing = entry;
        } else {
            self.dynamic_routes.push(entry);
        }
    }

    pub fn resolve(&self, path: &str, method: HttpMethod) -> Resolution {
        let static_methods = self.static_routes.get(path);

        if let Some(route) = static_methods.and_then(|m| m.get(&method)) {
            return Resolution::Found {
                handler: route.handler.clone(),
                params: HashMap::new(),
            };
        }

        for dynamic in &self.dynamic_routes {
            let Some(params) = dynamic.pattern.captures(path) else {
                continue;
            };
            return match dynamic.handlers.get(&method) {
                Some(route) => Resolution::Found {
                    handler: route.handler.clone(),
                    params,
                },
                None => Resolution::MethodNotAllowed {
                    allowed: dynamic.handlers.keys().copied().collect(),
                },
            };
        }

        match static_methods {
            Some(methods) if !methods.is_empty() => Resolution::MethodNotAllowed {
                allowed: methods.keys().copied().collect(),
            },
            _ => Resolution::NotFound,
        }
    }

    /// All routes, static and dynamic, sorted by path then method
    pub fn describe(&self) -> Vec<RouteDoc> {
        let static_docs = self.static_routes.iter().flat_map(|(path, methods)| {
            methods.iter().map(move |(method, route)| RouteDoc {
                path: path.clone(),
                method: *method,
                description: route.description.clone(),
            })
        });
        let dynamic_docs = self.dynamic_routes.iter().flat_map(|d| {
            d.handlers.iter().map(move |(method, route)| RouteDoc {
                path: d.pattern.as_str().to_string(),
                method: *method,
                description: route.description.clone(),
            })
        });

        let mut docs: Vec<RouteDoc> = static_docs.chain(dynamic_docs).collect();
        docs.sort_by(|a, b| a.path.cmp(&b.path).then(a.method.cmp(&b.method)));
        docs
    }

    pub fn static_len(&self) -> usize {
        self.static_routes.values().map(BTreeMap::len).sum()
    }

    pub fn dynamic_len(&self) -> usize {
        self.dynamic_routes.len()
    }
}

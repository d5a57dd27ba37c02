//! Route module files
//!
//! A route module is a TOML document whose top-level tables are HTTP
//! methods. Each method declares exactly one action:
//!
//! ```toml
//! [GET]
//! handler = "sum"
//! description = "Add num1 and num2"
//!
//! [POST]
//! json = { message = "Creating user" }
//!
//! [DELETE]
//! text = "Deleting user"
//! ```

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use super::method::HttpMethod;
use super::table::MethodRoute;
use crate::error::RouteLoadError;
use crate::handler::{Handler, HandlerRegistry};

/// What a method of a route module does
#[derive(Debug, Clone, PartialEq)]
pub enum RouteAction {
    /// Call a handler registered under this name
    Handler(String),
    /// Answer with a fixed JSON payload
    Json(Value),
    /// Answer with a fixed string payload
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MethodSpec {
    handler: Option<String>,
    json: Option<Value>,
    text: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModuleMethod {
    pub action: RouteAction,
    pub description: Option<String>,
}

/// A parsed route module, not yet bound to handlers
#[derive(Debug, Clone, PartialEq)]
pub struct RouteModule {
    pub methods: BTreeMap<HttpMethod, ModuleMethod>,
}

impl RouteModule {
    pub fn parse(source: &str) -> Result<Self, RouteLoadError> {
        let table: toml::Table = source.parse()?;
        if table.is_empty() {
            return Err(RouteLoadError::Empty);
        }

        let mut methods = BTreeMap::new();
        for (key, value) in table {
            let method: HttpMethod = key.parse().map_err(RouteLoadError::UnknownMethod)?;
            let spec: MethodSpec = value.try_into()?;

            let action = match (spec.handler, spec.json, spec.text) {
                (Some(name), None, None) => RouteAction::Handler(name),
                (None, Some(json), None) => RouteAction::Json(json),
                (None, None, Some(text)) => RouteAction::Text(text),
                _ => return Err(RouteLoadError::Action { method }),
            };
            methods.insert(
                method,
                ModuleMethod {
                    action,
                    description: spec.description,
                },
            );
        }

        Ok(Self { methods })
    }

    /// Bind every method to a concrete handler
    pub fn bind(
        self,
        registry: &HandlerRegistry,
    ) -> Result<BTreeMap<HttpMethod, MethodRoute>, RouteLoadError> {
        self.methods
            .into_iter()
            .map(|(method, m)| {
                let handler = match m.action {
                    RouteAction::Handler(name) => registry
                        .get(&name)
                        .cloned()
                        .ok_or(RouteLoadError::UnknownHandler { method, name })?,
                    RouteAction::Json(value) => Handler::fixed(value),
                    RouteAction::Text(text) => Handler::fixed(Value::String(text)),
                };
                Ok((
                    method,
                    MethodRoute {
                        handler,
                        description: m.description,
                    },
                ))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const USER_MODULE: &str = r#"
[GET]
handler = "get_user"
description = "Fetch user"

[POST]
json = { message = "Creating user" }

[DELETE]
text = "Deleting user"
"#;

    #[test]
    fn test_parse_all_actions() {
        let module = RouteModule::parse(USER_MODULE).unwrap();
        assert_eq!(module.methods.len(), 3);

        let get = &module.methods[&HttpMethod::Get];
        assert_eq!(get.action, RouteAction::Handler("get_user".to_string()));
        assert_eq!(get.description.as_deref(), Some("Fetch user"));

        assert_eq!(
            module.methods[&HttpMethod::Post].action,
            RouteAction::Json(json!({ "message": "Creating user" }))
        );
        assert_eq!(
            module.methods[&HttpMethod::Delete].action,
            RouteAction::Text("Deleting user".to_string())
        );
    }

    #[test]
    fn test_rejects_unknown_method() {
        let err = RouteModule::parse("[FETCH]\ntext = \"x\"\n").unwrap_err();
        assert!(matches!(err, RouteLoadError::UnknownMethod(m) if m == "FETCH"));
    }

    #[test]
    fn test_rejects_ambiguous_action() {
        let err = RouteModule::parse("[GET]\ntext = \"x\"\nhandler = \"y\"\n").unwrap_err();
        assert!(matches!(err, RouteLoadError::Action { method: HttpMethod::Get }));

        let err = RouteModule::parse("[GET]\ndescription = \"nothing\"\n").unwrap_err();
        assert!(matches!(err, RouteLoadError::Action { .. }));
    }

    #[test]
    fn test_rejects_empty_and_malformed() {
        assert!(matches!(RouteModule::parse(""), Err(RouteLoadError::Empty)));
        assert!(matches!(
            RouteModule::parse("[GET\nbroken"),
            Err(RouteLoadError::Parse(_))
        ));
        assert!(matches!(
            RouteModule::parse("[GET]\nbody = \"x\"\n"),
            Err(RouteLoadError::Parse(_))
        ));
    }

    #[test]
    fn test_bind_requires_registered_handler() {
        let module = RouteModule::parse(USER_MODULE).unwrap();
        let err = module.clone().bind(&HandlerRegistry::new()).unwrap_err();
        assert!(matches!(err, RouteLoadError::UnknownHandler { ref name, .. } if name == "get_user"));

        let mut registry = HandlerRegistry::new();
        registry.register_sync("get_user", |_| json!({ "message": "Fetching user" }));
        let routes = module.bind(&registry).unwrap();
        assert_eq!(routes.len(), 3);
        assert!(routes[&HttpMethod::Get]
            .handler
            .ptr_eq(registry.get("get_user").unwrap()));
    }
}

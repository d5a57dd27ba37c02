//! Generated API documentation

use serde_json::{json, Map, Value};

use crate::config::DocsConfig;
use crate::routing::RouteTable;

/// Build the `/docs` payload from every registered route
pub fn build_docs(table: &RouteTable, info: &DocsConfig) -> Value {
    let mut paths = Map::new();

    for doc in table.describe() {
        let description = doc
            .description
            .unwrap_or_else(|| format!("{} {}", doc.method, doc.path));
        let operation = json!({
            "description": description,
            "responses": { "200": { "description": "Successful response" } },
        });

        if let Value::Object(methods) = paths.entry(doc.path).or_insert_with(|| json!({})) {
            methods.insert(doc.method.as_str().to_lowercase(), operation);
        }
    }

    json!({
        "info": {
            "title": info.title,
            "version": info.version,
            "description": info.description,
        },
        "paths": paths,
    })
}

//! Route loader
//!
//! Walks the routes directory, parses every `*.toml` route module and
//! registers the result in a [`RouteTable`]. File reads and parsing run
//! concurrently; registration happens afterwards in sorted path order so
//! the resulting table does not depend on I/O timing.

use serde_json::json;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::task::JoinSet;

use super::module::RouteModule;
use super::pattern::{is_dynamic, RoutePattern};
use super::table::{DynamicRouteEntry, RouteEntry, RouteTable};
use crate::error::RouteLoadError;
use crate::events::EventBus;
use crate::handler::HandlerRegistry;
use crate::logger;

pub const ROUTE_EXTENSION: &str = "toml";

/// Module written into a freshly created routes directory
const SEED_MODULE: &str = "[GET]\njson = { message = \"Hello from Zing dynamic route!\" }\n";
const SEED_FILE: &str = "index.toml";

/// Result of a load pass
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Route paths that were registered
    pub loaded: Vec<String>,
    /// Files that were skipped, with the reason
    pub failed: Vec<(PathBuf, String)>,
}

pub struct RouteLoader<'a> {
    root: PathBuf,
    registry: &'a HandlerRegistry,
    events: Option<&'a EventBus>,
    reserved_prefix: Option<String>,
}

impl<'a> RouteLoader<'a> {
    pub fn new(root: impl Into<PathBuf>, registry: &'a HandlerRegistry) -> Self {
        Self {
            root: root.into(),
            registry,
            events: None,
            reserved_prefix: None,
        }
    }

    #[must_use]
    pub fn with_events(mut self, events: &'a EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Warn about modules that a reserved prefix will shadow
    #[must_use]
    pub fn with_reserved_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.reserved_prefix = Some(prefix.into());
        self
    }

    /// Create the routes directory with a seed module if it is missing
    pub async fn ensure_root(&self) -> std::io::Result<bool> {
        if fs::try_exists(&self.root).await? {
            return Ok(false);
        }
        fs::create_dir_all(&self.root).await?;
        fs::write(self.root.join(SEED_FILE), SEED_MODULE).await?;
        logger::log_info(&format!(
            "Created routes directory {}",
            self.root.display()
        ));
        Ok(true)
    }

    /// Load every route module under the root into `table`
    ///
    /// Individual module failures are logged and reported, never returned
    /// as an error. Only a failure to walk the directory itself is.
    pub async fn load(&self, table: &mut RouteTable) -> std::io::Result<LoadReport> {
        let files = collect_route_files(&self.root).await?;

        let mut tasks = JoinSet::new();
        for file in files {
            let Some(route_path) = route_path(&self.root, &file) else {
                continue;
            };
            tasks.spawn(async move {
                let parsed = read_module(&file).await;
                (route_path, file, parsed)
            });
        }

        let mut parsed = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => parsed.push(result),
                Err(e) => logger::log_error(&format!("Route loading task failed: {e}")),
            }
        }
        parsed.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

        let mut report = LoadReport::default();
        for (route_path, file, module) in parsed {
            match module.and_then(|m| self.register(table, &route_path, m)) {
                Ok(()) => {
                    logger::log_route_loaded(&route_path);
                    self.warn_if_reserved(&route_path);
                    self.emit("route:loaded", json!({ "path": route_path }));
                    report.loaded.push(route_path);
                }
                Err(err) => {
                    let file_name = file.display().to_string();
                    logger::log_route_failed(&file_name, &err);
                    self.emit(
                        "route:error",
                        json!({ "file": file_name, "error": err.to_string() }),
                    );
                    report.failed.push((file, err.to_string()));
                }
            }
        }

        Ok(report)
    }

    fn register(
        &self,
        table: &mut RouteTable,
        route_path: &str,
        module: RouteModule,
    ) -> Result<(), RouteLoadError> {
        let handlers = module.bind(self.registry)?;

        if is_dynamic(route_path) {
            table.register_dynamic(DynamicRouteEntry {
                pattern: RoutePattern::parse(route_path)?,
                handlers,
            });
        } else {
            for (method, route) in handlers {
                table.register(RouteEntry {
                    path: route_path.to_string(),
                    method,
                    route,
                });
            }
        }
        Ok(())
    }

    fn warn_if_reserved(&self, route_path: &str) {
        if let Some(prefix) = &self.reserved_prefix {
            if crate::dispatcher::is_reserved(route_path, prefix) {
                logger::log_warning(&format!(
                    "Route {route_path} is shadowed by the reserved {prefix} prefix"
                ));
            }
        }
    }

    fn emit(&self, event: &str, data: serde_json::Value) {
        if let Some(events) = self.events {
            events.emit(event, &data);
        }
    }
}

async fn read_module(file: &Path) -> Result<RouteModule, RouteLoadError> {
    let source = fs::read_to_string(file)
        .await
        .map_err(|source| RouteLoadError::Io {
            path: file.to_path_buf(),
            source,
        })?;
    RouteModule::parse(&source)
}

/// Recursively list route module files, skipping hidden entries
async fn collect_route_files(root: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            let path = entry.path();
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                pending.push(path);
            } else if path.extension().and_then(|e| e.to_str()) == Some(ROUTE_EXTENSION) {
                files.push(path);
            }
        }
    }

    Ok(files)
}

/// `<root>/api/v1/sum.toml` -> `/api/v1/sum`
pub fn route_path(root: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(root).ok()?.with_extension("");
    let segments: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if segments.is_empty() {
        return None;
    }
    Some(format!("/{}", segments.join("/")))
}

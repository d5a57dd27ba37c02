//! Static file serving module
//!
//! Resolves `GET` paths against the static root. Directories resolve to
//! their `index.html`.

use hyper::body::Bytes;
use hyper::StatusCode;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::http::{self, mime, HttpResponse};
use crate::logger;

const INDEX_FILE: &str = "index.html";

/// Create the static root if it does not exist
pub async fn ensure_static_dir(root: &Path) -> std::io::Result<()> {
    if !fs::try_exists(root).await? {
        fs::create_dir_all(root).await?;
        logger::log_info(&format!("Created static directory {}", root.display()));
    }
    Ok(())
}

/// Serve `path` from `root`, or `None` to fall through to routing
pub async fn serve(root: &Path, path: &str) -> Option<HttpResponse> {
    let file_path = resolve(root, path).await?;

    let content = match fs::read(&file_path).await {
        Ok(c) => c,
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read file '{}': {}",
                file_path.display(),
                e
            ));
            return None;
        }
    };

    Some(http::build_response(
        StatusCode::OK,
        mime::content_type_for(&file_path),
        Bytes::from(content),
    ))
}

/// Map a request path to a readable file inside `root`
pub async fn resolve(root: &Path, path: &str) -> Option<PathBuf> {
    let Ok(decoded) = urlencoding::decode(path) else {
        return None;
    };
    let path = decoded.as_ref();
    if path.contains("..") || path.contains('\0') {
        logger::log_warning(&format!("Path traversal attempt blocked: {path}"));
        return None;
    }

    let relative = path.trim_start_matches('/');
    let mut file_path = root.join(relative);

    let metadata = fs::metadata(&file_path).await.ok()?;
    if metadata.is_dir() {
        file_path = file_path.join(INDEX_FILE);
        if !fs::metadata(&file_path).await.ok()?.is_file() {
            return None;
        }
    }

    // symlinks must not lead outside the root
    let root_canonical = fs::canonicalize(root).await.ok()?;
    let file_canonical = fs::canonicalize(&file_path).await.ok()?;
    if !file_canonical.starts_with(&root_canonical) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {} -> {}",
            path,
            file_canonical.display()
        ));
        return None;
    }

    Some(file_path)
}

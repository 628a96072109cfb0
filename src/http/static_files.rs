//! Static file locations.
//!
//! # Responsibilities
//! - Map a request path onto a file below the location's root
//! - Serve a directory's index file, or 404 when it has none
//!
//! # Design Decisions
//! - The location prefix is not stripped: `/assets/app.js` under root `www`
//!   is served from `www/assets/app.js`
//! - `..` segments are resolved lexically and can never climb above root
//! - Content type, ranges and conditional requests are handled by tower-http

use std::path::{Component, Path, PathBuf};

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::http::response::not_found;

const DEFAULT_INDEX: &str = "index.html";

/// Serves files below a root directory.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
    index: String,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>, index: Option<&str>) -> Self {
        Self {
            root: root.into(),
            index: index.filter(|i| !i.is_empty()).unwrap_or(DEFAULT_INDEX).to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path for a request path.
    pub fn resolve(&self, request_path: &str) -> PathBuf {
        self.root.join(clean_path(request_path))
    }

    pub async fn serve(&self, request: Request<Body>) -> Response {
        let path = self.resolve(request.uri().path());

        let file = match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_dir() => {
                let index = path.join(&self.index);
                match tokio::fs::metadata(&index).await {
                    Ok(meta) if meta.is_file() => index,
                    _ => return not_found(),
                }
            }
            Ok(_) => path,
            Err(_) => return not_found(),
        };

        match ServeFile::new(&file).oneshot(request).await {
            Ok(response) => response.map(Body::new),
            Err(never) => match never {},
        }
    }
}

/// Lexically normalise a URL path into a relative filesystem path.
fn clean_path(request_path: &str) -> PathBuf {
    let mut clean = PathBuf::new();
    for component in Path::new(request_path.trim_start_matches('/')).components() {
        match component {
            Component::Normal(segment) => clean.push(segment),
            Component::ParentDir => {
                clean.pop();
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    clean
}

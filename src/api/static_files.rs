//! Static file serving for the browser client
//!
//! Any path no API route claims is looked up under the configured static
//! directory. Unknown paths get `index.html` so the client can route itself.

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use std::path::{Component, Path, PathBuf};
use tokio::fs;

use crate::api::middleware::{ApiError, AppState};

const INDEX_FILE: &str = "index.html";

/// Serve static files based on path
pub async fn serve_static(State(state): State<AppState>, uri: Uri) -> Response {
    let path = uri.path();
    let decoded_path = urlencoding::decode(path).unwrap_or_else(|_| path.into());

    // Unmatched API paths stay JSON
    if decoded_path.starts_with("/api/") {
        return ApiError::not_found("Not found").into_response();
    }

    let root = state.static_dir.as_path();
    if let Some(file) = resolve_path(root, &decoded_path) {
        if let Ok(contents) = fs::read(&file).await {
            return build_response(&file, contents);
        }
    }

    let index = root.join(INDEX_FILE);
    match fs::read(&index).await {
        Ok(contents) => build_response(&index, contents),
        Err(_) => not_found(),
    }
}

/// Map a request path onto a file below `root`.
///
/// Returns `None` for the root itself and for anything that tries to leave
/// the directory.
fn resolve_path(root: &Path, request_path: &str) -> Option<PathBuf> {
    let relative = Path::new(request_path.trim_start_matches('/'));
    if relative.as_os_str().is_empty() {
        return None;
    }

    let mut resolved = root.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(resolved)
}

fn build_response(path: &Path, contents: Vec<u8>) -> Response {
    let name = path.to_string_lossy();
    let cache_control = if name.ends_with(".html") {
        "no-cache"
    } else {
        "public, max-age=3600"
    };

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, get_content_type(&name)),
            (header::CACHE_CONTROL, cache_control),
        ],
        Body::from(contents),
    )
        .into_response()
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}

fn get_content_type(path: &str) -> &'static str {
    match path.rsplit('.').next().unwrap_or("") {
        "html" => "text/html; charset=utf-8",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "woff2" => "font/woff2",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_path() {
        let root = Path::new("public");
        assert_eq!(
            resolve_path(root, "/css/app.css"),
            Some(PathBuf::from("public/css/app.css"))
        );
        assert_eq!(
            resolve_path(root, "/./app.js"),
            Some(PathBuf::from("public/app.js"))
        );
        assert_eq!(resolve_path(root, "/"), None);
    }

    #[test]
    fn test_resolve_path_rejects_traversal() {
        let root = Path::new("public");
        assert_eq!(resolve_path(root, "/../config.yml"), None);
        assert_eq!(resolve_path(root, "/css/../../secret"), None);
    }

    #[test]
    fn test_content_type() {
        assert_eq!(get_content_type("index.html"), "text/html; charset=utf-8");
        assert_eq!(get_content_type("app.js"), "application/javascript");
        assert_eq!(get_content_type("style.css"), "text/css");
        assert_eq!(get_content_type("blob"), "application/octet-stream");
    }
}

//! Fixed HTTP routes mounted on every service.
//!
//! - `GET /static/{filename}` — file from the static directory, restricted to
//!   names made of `[a-zA-Z0-9._/]` with no empty or `..` segments.
//! - `GET /favicon.ico` — `favicon.ico` from the static directory (optional).
//! - `GET|HEAD /health-check` — `200 OK` with body `OK` (optional).
//!
//! Content types are derived from the file extension.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use axum::routing::{MethodFilter, get, on};
use tower::ServiceExt;
use tower_http::services::ServeFile;

const FAVICON: &str = "favicon.ico";

/// Which optional routes to mount. The static route is always present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteOptions {
    /// Mount `/health-check`.
    pub health_check: bool,
    /// Mount `/favicon.ico`.
    pub favicon: bool,
}

impl Default for RouteOptions {
    fn default() -> Self {
        Self {
            health_check: true,
            favicon: true,
        }
    }
}

#[derive(Debug)]
struct StaticAssets {
    dir: PathBuf,
}

type AssetsState = Arc<StaticAssets>;

/// Builds the router for the fixed routes.
pub fn routes(static_dir: impl Into<PathBuf>, options: RouteOptions) -> Router {
    let assets = Arc::new(StaticAssets {
        dir: static_dir.into(),
    });

    let mut router = Router::new().route("/static/{*filename}", get(get_static));
    if options.favicon {
        router = router.route("/favicon.ico", get(get_favicon));
    }
    if options.health_check {
        router = router.route(
            "/health-check",
            on(MethodFilter::GET.or(MethodFilter::HEAD), health_check),
        );
    }
    router.with_state(assets)
}

/// Whether `filename` may be looked up in the static directory.
#[must_use]
pub fn is_static_filename(filename: &str) -> bool {
    !filename.is_empty()
        && filename
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'/'))
        && filename.split('/').all(|seg| !seg.is_empty() && seg != "..")
}

/// Static file name accepted by the `/static/` route.
///
/// Rejects with `404 Not Found` before the handler runs.
#[derive(Debug)]
struct StaticFileName(String);

impl<S: Send + Sync> FromRequestParts<S> for StaticFileName {
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let axum::extract::Path(filename) =
            axum::extract::Path::<String>::from_request_parts(parts, state)
                .await
                .map_err(|_| StatusCode::NOT_FOUND)?;
        if is_static_filename(&filename) {
            Ok(Self(filename))
        } else {
            tracing::debug!(%filename, "rejected static file name");
            Err(StatusCode::NOT_FOUND)
        }
    }
}

/// `GET /static/{filename}`
async fn get_static(
    State(assets): State<AssetsState>,
    StaticFileName(filename): StaticFileName,
    request: Request,
) -> Response {
    serve_file(&assets.dir.join(filename), request).await
}

/// `GET /favicon.ico` — a missing icon is logged, not treated as an error.
async fn get_favicon(State(assets): State<AssetsState>, request: Request) -> Response {
    let path = assets.dir.join(FAVICON);
    if !tokio::fs::metadata(&path)
        .await
        .is_ok_and(|meta| meta.is_file())
    {
        tracing::warn!(path = %path.display(), "no favicon.ico found");
    }
    serve_file(&path, request).await
}

/// `GET|HEAD /health-check`
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn serve_file(path: &Path, request: Request) -> Response {
    match ServeFile::new(path).oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, header};

    use super::*;

    fn assets() -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("site.css"), "body {}").expect("write css");
        std::fs::create_dir(dir.path().join("js")).expect("mkdir");
        std::fs::write(dir.path().join("js/app.js"), "main()").expect("write js");
        std::fs::write(dir.path().join("a b.txt"), "spaced").expect("write spaced");
        dir
    }

    async fn send(router: Router, method: Method, uri: &str) -> (StatusCode, Option<String>, String) {
        let request = axum::http::Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .expect("request");
        let response = router.oneshot(request).await.expect("infallible");
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        (status, content_type, String::from_utf8_lossy(&body).into_owned())
    }

    #[test]
    fn filename_restriction() {
        assert!(is_static_filename("site.css"));
        assert!(is_static_filename("js/app.min.js"));
        assert!(is_static_filename("fonts/Sans_Bold.woff2"));

        assert!(!is_static_filename(""));
        assert!(!is_static_filename("../secret"));
        assert!(!is_static_filename("js/../../secret"));
        assert!(!is_static_filename("/etc/passwd"));
        assert!(!is_static_filename("js//app.js"));
        assert!(!is_static_filename("a b.txt"));
        assert!(!is_static_filename("my-file.css"));
        assert!(!is_static_filename("x%2e%2e"));
    }

    #[tokio::test]
    async fn health_check_answers_get_and_head() {
        let dir = assets();
        let router = routes(dir.path(), RouteOptions::default());

        let (status, _, body) = send(router.clone(), Method::GET, "/health-check").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");

        let (status, _, body) = send(router.clone(), Method::HEAD, "/health-check").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());

        let (status, _, _) = send(router, Method::POST, "/health-check").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn static_files_carry_content_type() {
        let dir = assets();
        let router = routes(dir.path(), RouteOptions::default());

        let (status, content_type, body) = send(router.clone(), Method::GET, "/static/site.css").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("text/css"));
        assert_eq!(body, "body {}");

        let (status, _, body) = send(router, Method::GET, "/static/js/app.js").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "main()");
    }

    #[tokio::test]
    async fn disallowed_names_never_reach_the_file() {
        let root = tempfile::tempdir().expect("tempdir");
        let static_dir = root.path().join("static");
        std::fs::create_dir(&static_dir).expect("mkdir");
        std::fs::write(static_dir.join("a b.txt"), "spaced").expect("write spaced");
        std::fs::write(root.path().join("secret"), "hidden").expect("write secret");
        let router = routes(&static_dir, RouteOptions::default());

        for uri in [
            "/static/../secret",
            "/static/%2e%2e/secret",
            "/static/a%20b.txt",
            "/static/%2Fsecret",
        ] {
            let (status, _, body) = send(router.clone(), Method::GET, uri).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            assert!(body.is_empty(), "{uri} leaked {body:?}");
        }
    }

    #[tokio::test]
    async fn missing_favicon_is_not_a_server_error() {
        let dir = assets();
        let router = routes(dir.path(), RouteOptions::default());

        let (status, _, _) = send(router, Method::GET, "/favicon.ico").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn present_favicon_is_served() {
        let dir = assets();
        std::fs::write(dir.path().join(FAVICON), [0u8, 0, 1, 0]).expect("write icon");
        let router = routes(dir.path(), RouteOptions::default());

        let (status, content_type, _) = send(router, Method::GET, "/favicon.ico").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("image/x-icon"));
    }

    #[tokio::test]
    async fn optional_routes_can_be_disabled() {
        let dir = assets();
        let router = routes(
            dir.path(),
            RouteOptions {
                health_check: false,
                favicon: false,
            },
        );

        let (status, _, _) = send(router.clone(), Method::GET, "/health-check").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _, _) = send(router.clone(), Method::GET, "/favicon.ico").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _, _) = send(router, Method::GET, "/static/site.css").await;
        assert_eq!(status, StatusCode::OK);
    }
}

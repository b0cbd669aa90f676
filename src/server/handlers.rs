//! HTTP handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::path::RequestPath;
use crate::prompt::FormFields;
use crate::templates;

use super::AppState;

#[derive(Deserialize, Default)]
pub struct SearchParams {
    #[serde(default)]
    query: String,
}

#[derive(Deserialize, Default)]
pub struct PageParams {
    nocache: Option<String>,
}

/// `GET /` serves the search landing page. A copy is also persisted under
/// the cache root the first time, so a cached site browsed off disk has a
/// home page too.
pub async fn home(State(state): State<Arc<AppState>>) -> Html<&'static str> {
    let cache = state.pipeline.cache();
    if !cache.root().join("static/home.html").is_file() {
        let _ = cache.write_asset("static/home.html", templates::SEARCH_PAGE_HTML.as_bytes());
    }
    Html(templates::SEARCH_PAGE_HTML)
}

/// `GET /search?query=` redirects to the hyphen-joined lowercase path.
pub async fn search(Query(params): Query<SearchParams>) -> Redirect {
    let query = params.query.trim();
    if query.is_empty() {
        Redirect::to("/")
    } else {
        let path = query.to_lowercase().replace(' ', "-");
        Redirect::to(&format!("/{path}"))
    }
}

/// `GET /index` regenerates the listing from current cache contents and
/// serves it.
pub async fn index(State(state): State<Arc<AppState>>) -> Response {
    let cache = state.pipeline.cache();
    if let Err(e) = cache.regenerate_index() {
        error!(error = %e, "index regeneration failed");
        return error_response("index", &e);
    }
    match cache.load(&RequestPath::normalize("index")) {
        Some((content_type, bytes)) => content_response(&content_type, bytes),
        None => error_response("index", &"listing unavailable"),
    }
}

/// `GET /{*path}`: cache-or-generate.
pub async fn page(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
    Query(params): Query<PageParams>,
) -> Response {
    respond(state, path, None, params).await
}

/// `POST /{*path}`: same, with submitted form fields folded into the
/// prompt.
pub async fn page_with_form(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
    Query(params): Query<PageParams>,
    body: String,
) -> Response {
    respond(state, path, parse_form_body(&body), params).await
}

/// Decode an urlencoded form body into ordered fields. Empty or non-form
/// bodies count as no submission.
fn parse_form_body(body: &str) -> Option<FormFields> {
    if body.trim().is_empty() {
        return None;
    }
    let fields: FormFields = url::form_urlencoded::parse(body.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if fields.is_empty() {
        None
    } else {
        Some(fields)
    }
}

async fn respond(
    state: Arc<AppState>,
    path: String,
    form: Option<FormFields>,
    params: PageParams,
) -> Response {
    if path == "index.html" {
        return Redirect::to("/index").into_response();
    }
    let use_cache = params.nocache.as_deref().map_or(true, |v| v == "0");

    match state.pipeline.respond(&path, form.as_ref(), use_cache).await {
        Ok(generated) => content_response(&generated.content_type, generated.body.into_bytes()),
        Err(e) => {
            error!(path, error = %e, "content generation failed");
            error_response(&path, &e)
        }
    }
}

/// `GET /api/cache/stats`
pub async fn cache_stats(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let cache = state.pipeline.cache();
    let stats = cache.stats();
    let mb = (stats.total_bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0;
    Json(json!({
        "status": "success",
        "data": {
            "total_files": stats.file_count,
            "total_size_bytes": stats.total_bytes,
            "total_size_mb": mb,
            "cache_location": cache.root().display().to_string(),
        }
    }))
}

/// `GET /api/cache/clear`
pub async fn cache_clear_all(State(state): State<Arc<AppState>>) -> Response {
    match state.pipeline.cache().clear_all() {
        Ok(()) => (StatusCode::OK, "All cache cleared successfully").into_response(),
        Err(e) => {
            error!(error = %e, "cache clear failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error clearing cache: {e}"),
            )
                .into_response()
        }
    }
}

/// `GET /api/cache/clear/{*path}`
pub async fn cache_clear_path(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> Response {
    let normalized = RequestPath::normalize(&path);
    if state.pipeline.cache().invalidate(&normalized) {
        (StatusCode::OK, format!("Cache cleared for: {normalized}")).into_response()
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error clearing cache for: {normalized}"),
        )
            .into_response()
    }
}

fn content_response(content_type: &str, body: Vec<u8>) -> Response {
    let value = HeaderValue::from_str(content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("text/plain"));
    ([(header::CONTENT_TYPE, value)], body).into_response()
}

fn error_response(path: &str, error: &dyn std::fmt::Display) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(templates::error_page(path, error)),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ProviderConfig, ProviderKind, SamplingParams};
    use crate::generate::ContentPipeline;
    use crate::imagegen::ImageSynthesizer;
    use crate::providers::ChatCompletionProvider;
    use crate::CacheStore;
    use axum::body::Body;
    use axum::http::Request;
    use std::time::Duration;
    use tempfile::TempDir;
    use tower::ServiceExt;

    /// Router backed by an unreachable provider; only routes that never hit
    /// the provider (or are expected to fail) are exercised.
    fn test_app() -> (TempDir, axum::Router) {
        let dir = TempDir::new().unwrap();
        let config = ProviderConfig {
            kind: ProviderKind::OpenAiCompatible,
            api_key: "unused".to_string(),
            // Reserved port; connections are refused immediately.
            base_url: "http://127.0.0.1:9".to_string(),
            model: "unused".to_string(),
            sampling: SamplingParams::default(),
            timeout: Duration::from_secs(1),
        };
        let provider = ChatCompletionProvider::openai_compatible(&config).unwrap();
        let cache = CacheStore::new(dir.path()).unwrap();
        let pipeline =
            ContentPipeline::new(Box::new(provider), ImageSynthesizer::disabled(), cache);
        let state = Arc::new(AppState { pipeline });
        (dir, super::super::build_router(state))
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_home_serves_landing_page() {
        let (_dir, app) = test_app();
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.contains("INFINITE AI WEB"));
    }

    #[tokio::test]
    async fn test_search_redirects_to_normalized_path() {
        let (_dir, app) = test_app();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/search?query=Stronghold%20Crusader")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.status().is_redirection());
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/stronghold-crusader"
        );
    }

    #[tokio::test]
    async fn test_search_without_query_redirects_home() {
        let (_dir, app) = test_app();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/search")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.status().is_redirection());
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");
    }

    #[tokio::test]
    async fn test_cached_page_served_without_provider() {
        let (dir, app) = test_app();
        let cache = CacheStore::new(dir.path()).unwrap();
        cache.save(
            &RequestPath::normalize("topic"),
            "text/html",
            b"<html>cached</html>",
        );

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/topic")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/html"
        );
        let body = body_string(response).await;
        assert!(body.contains("cached"));
    }

    #[tokio::test]
    async fn test_generation_failure_renders_error_page() {
        let (_dir, app) = test_app();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/uncached-topic")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_string(response).await;
        assert!(body.contains("Error Generating Content"));
        assert!(body.contains("uncached-topic"));
    }

    #[tokio::test]
    async fn test_index_html_redirects_to_index() {
        let (_dir, app) = test_app();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/index.html")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.status().is_redirection());
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/index");
    }

    #[tokio::test]
    async fn test_index_regenerates_listing() {
        let (dir, app) = test_app();
        let cache = CacheStore::new(dir.path()).unwrap();
        cache.save(&RequestPath::normalize("rust-lang"), "text/html", b"x");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/index")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.contains("Rust Lang"));
    }

    #[tokio::test]
    async fn test_cache_stats_shape() {
        let (_dir, app) = test_app();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/cache/stats")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["status"], "success");
        assert!(value["data"]["total_files"].is_u64());
    }

    #[test]
    fn test_parse_form_body() {
        assert_eq!(parse_form_body(""), None);
        assert_eq!(parse_form_body("   "), None);
        let fields = parse_form_body("name=Rollo&age=42").unwrap();
        assert_eq!(fields.get("name").map(String::as_str), Some("Rollo"));
        assert_eq!(fields.get("age").map(String::as_str), Some("42"));
    }

    #[tokio::test]
    async fn test_cache_clear_path_roundtrip() {
        let (dir, app) = test_app();
        let cache = CacheStore::new(dir.path()).unwrap();
        cache.save(&RequestPath::normalize("doomed"), "text/html", b"x");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/cache/clear/doomed")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!cache.exists(&RequestPath::normalize("doomed")));
    }
}

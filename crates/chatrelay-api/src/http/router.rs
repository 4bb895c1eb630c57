//! Axum router configuration with middleware.
//!
//! Routes are under `/api/`; `/` serves the survey widget.
//! Middleware: CORS (qualtrics origins + one configurable extra),
//! iframe-embedding header rewrite, tracing.
//!
//! The widget front-end is served from the configured static directory
//! when it exists; `GET /` falls back to a minimal HTML fragment so the
//! relay stays probeable without assets.

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderValue, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use chatrelay_types::config::CorsConfig;

use crate::http::handlers;
use crate::state::AppState;

/// Origins always allowed, regardless of configuration.
const FIXED_ORIGINS: [&str; 3] = [
    "https://qualtrics.com",
    "http://localhost:8000",
    "http://127.0.0.1:8000",
];

/// Served when the static front-end is missing.
const FALLBACK_INDEX: &str = "<html><body><h3>Chat frontend not found</h3></body></html>";

/// Build the complete router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.cors);

    let mut router = Router::new()
        .route("/api/session", post(handlers::session::create_session))
        .route("/api/chat", post(handlers::chat::chat))
        .route("/api/test-log", get(handlers::log::test_log))
        .route("/", get(index))
        .layer(axum::middleware::map_response(allow_iframe_embedding))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    // Serve widget assets from disk if the directory exists.
    if state.static_dir.is_dir() {
        router = router.nest_service("/static", ServeDir::new(&state.static_dir));
        tracing::info!(path = %state.static_dir.display(), "static file serving enabled");
    } else {
        tracing::warn!(
            path = %state.static_dir.display(),
            "static directory not found; only the fallback page will be served"
        );
    }

    router
}

/// GET / - The survey widget page, or a minimal fallback fragment.
async fn index(State(state): State<AppState>) -> Response {
    let index_path = state.static_dir.join("index.html");
    match tokio::fs::read_to_string(&index_path).await {
        Ok(body) => Html(body).into_response(),
        Err(_) => Html(FALLBACK_INDEX.to_string()).into_response(),
    }
}

/// CORS: fixed origins, one configurable extra, and any qualtrics
/// subdomain. Credentials are allowed, so methods/headers mirror the
/// preflight request instead of using wildcards.
fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let mut origins: Vec<String> = FIXED_ORIGINS.iter().map(|s| s.to_string()).collect();
    if let Some(extra) = &config.extra_origin {
        origins.push(extra.clone());
    }

    let allow_origin = AllowOrigin::predicate(move |origin: &HeaderValue, _| {
        let Ok(origin) = origin.to_str() else {
            return false;
        };
        origins.iter().any(|allowed| allowed == origin) || is_qualtrics_origin(origin)
    });

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Matches `https://qualtrics.com` and any `https://*.qualtrics.com`.
fn is_qualtrics_origin(origin: &str) -> bool {
    let Some(host) = origin.strip_prefix("https://") else {
        return false;
    };
    host == "qualtrics.com" || host.ends_with(".qualtrics.com")
}

/// The widget runs inside the survey's iframe: replace any
/// `X-Frame-Options` with ALLOWALL and strip `frame-ancestors` from the
/// CSP on every response.
async fn allow_iframe_embedding(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::X_FRAME_OPTIONS,
        HeaderValue::from_static("ALLOWALL"),
    );

    let csp = headers
        .get(header::CONTENT_SECURITY_POLICY)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    if let Some(csp) = csp {
        let stripped = csp
            .split(';')
            .filter(|directive| !directive.contains("frame-ancestors"))
            .collect::<Vec<_>>()
            .join(";");
        if let Ok(value) = HeaderValue::from_str(&stripped) {
            headers.insert(header::CONTENT_SECURITY_POLICY, value);
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualtrics_origin_matching() {
        assert!(is_qualtrics_origin("https://qualtrics.com"));
        assert!(is_qualtrics_origin("https://brandx.qualtrics.com"));
        assert!(is_qualtrics_origin("https://a.b.qualtrics.com"));
        assert!(!is_qualtrics_origin("http://qualtrics.com"));
        assert!(!is_qualtrics_origin("https://evilqualtrics.com"));
        assert!(!is_qualtrics_origin("https://qualtrics.com.evil.example"));
    }

    #[tokio::test]
    async fn test_iframe_rewrite_strips_frame_ancestors() {
        let response = Response::builder()
            .header(header::X_FRAME_OPTIONS, "DENY")
            .header(
                header::CONTENT_SECURITY_POLICY,
                "default-src 'self'; frame-ancestors 'none'; img-src *",
            )
            .body(axum::body::Body::empty())
            .unwrap();

        let rewritten = allow_iframe_embedding(response).await;
        assert_eq!(
            rewritten.headers().get(header::X_FRAME_OPTIONS).unwrap(),
            "ALLOWALL"
        );
        let csp = rewritten
            .headers()
            .get(header::CONTENT_SECURITY_POLICY)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(!csp.contains("frame-ancestors"));
        assert!(csp.contains("default-src 'self'"));
        assert!(csp.contains("img-src *"));
    }
}

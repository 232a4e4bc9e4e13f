use std::path::Path;

use axum::{
    Router,
    extract::{DefaultBodyLimit, Request},
    http::{HeaderValue, header},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use tower_http::compression::CompressionLayer;
use tower_http::services::ServeDir;

use crate::config::{max_publish_bytes, static_dir};
use crate::routes;
use crate::state::AppState;

pub(crate) fn build_app(state: AppState) -> Router {
    let static_assets = Router::new()
        .fallback_service(
            ServeDir::new(static_dir())
                .precompressed_br()
                .precompressed_gzip(),
        )
        .layer(middleware::from_fn(set_static_cache_control));

    let publish = Router::new()
        .route("/api/publish/map", post(routes::publish::publish_map))
        .route("/api/publish/pose", post(routes::publish::publish_pose))
        .route(
            "/api/publish/transform",
            post(routes::publish::publish_transform),
        )
        .layer(DefaultBodyLimit::max(max_publish_bytes()));

    let app = Router::new()
        .route("/api/events", get(routes::sse::bridge_events))
        .route("/api/map", get(routes::api::get_map))
        .route("/api/health", get(routes::api::health))
        .merge(publish);

    app.layer(CompressionLayer::new())
        .fallback_service(static_assets)
        .with_state(state)
}

async fn set_static_cache_control(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let mut response = next.run(request).await;

    if response.status().is_success()
        && let Some(cache_control) = cache_control_for_path(&path)
    {
        response.headers_mut().insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static(cache_control),
        );
    }

    response
}

fn cache_control_for_path(path: &str) -> Option<&'static str> {
    if is_hashed_bundle_asset(path) {
        return Some("public, max-age=31536000, immutable");
    }

    None
}

/// Trunk emits `navview-client-<hash>_bg.wasm` style names.
fn is_hashed_bundle_asset(path: &str) -> bool {
    let file = Path::new(path);
    let Some(ext) = file.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };

    if !matches!(ext, "wasm" | "js" | "css") {
        return false;
    }

    let Some(filename) = file.file_name().and_then(|name| name.to_str()) else {
        return false;
    };

    filename
        .split(['-', '_', '.'])
        .any(|segment| segment.len() >= 8 && segment.chars().all(|c| c.is_ascii_hexdigit()))
}

use axum::Json;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use navview_shared::options::DEFAULT_MAP_TOPIC;
use serde::Deserialize;

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let counters = state.counters.snapshot();
    Json(serde_json::json!({
        "status": "ok",
        "maps": state.latest_maps.len(),
        "pose_topics": state.latest_poses.len(),
        "transforms": state.latest_transforms.len(),
        "subscribers": state.event_tx.receiver_count(),
        "counters": {
            "maps_published_total": counters.maps_published_total,
            "poses_published_total": counters.poses_published_total,
            "transforms_published_total": counters.transforms_published_total,
            "rejected_publishes_total": counters.rejected_publishes_total,
            "lagged_subscribers_total": counters.lagged_subscribers_total,
        }
    }))
}

#[derive(Debug, Deserialize)]
pub struct MapQuery {
    pub topic: Option<String>,
}

/// Latest retained map message for a topic, as published over SSE.
pub async fn get_map(State(state): State<AppState>, Query(query): Query<MapQuery>) -> Response {
    let topic = query
        .topic
        .filter(|topic| !topic.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_MAP_TOPIC.to_string());
    let Some(json) = state
        .latest_maps
        .get(&topic)
        .map(|entry| entry.value().json.clone())
    else {
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": format!("no map on {topic}") })),
        )
            .into_response();
    };

    let mut response = Response::new(Body::from((*json).clone()));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    response
}

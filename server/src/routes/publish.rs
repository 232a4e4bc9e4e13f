use std::fmt;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use navview_shared::{
    BridgeMessage, DEFAULT_POSE_MESSAGE_TYPE, OccupancyGrid, PoseMsg, TransformMsg,
};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MapPublish {
    pub topic: String,
    pub grid: OccupancyGrid,
}

#[derive(Debug, Deserialize)]
pub struct PosePublish {
    pub topic: String,
    #[serde(default)]
    pub message_type: Option<String>,
    pub pose: PoseMsg,
}

#[derive(Debug, Deserialize)]
pub struct TransformPublish {
    pub parent_frame: String,
    pub child_frame: String,
    pub transform: TransformMsg,
}

#[derive(Debug, PartialEq)]
pub enum PublishError {
    EmptyName(&'static str),
    BadResolution(f64),
    EmptyGrid,
    CellCountMismatch { expected: usize, actual: usize },
    NonFinite(&'static str),
    Encode(String),
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName(field) => write!(f, "{field} must not be empty"),
            Self::BadResolution(value) => write!(f, "resolution must be positive, got {value}"),
            Self::EmptyGrid => f.write_str("grid width and height must be positive"),
            Self::CellCountMismatch { expected, actual } => {
                write!(f, "grid has {actual} cells, expected {expected}")
            }
            Self::NonFinite(field) => write!(f, "{field} contains a non-finite value"),
            Self::Encode(e) => write!(f, "failed to encode message: {e}"),
        }
    }
}

impl std::error::Error for PublishError {}

impl IntoResponse for PublishError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        };
        (
            status,
            Json(serde_json::json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}

fn require_name(field: &'static str, value: &str) -> Result<(), PublishError> {
    if value.trim().is_empty() {
        return Err(PublishError::EmptyName(field));
    }
    Ok(())
}

fn require_finite(field: &'static str, values: &[f64]) -> Result<(), PublishError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(PublishError::NonFinite(field))
    }
}

pub(crate) fn validate_grid(grid: &OccupancyGrid) -> Result<(), PublishError> {
    let info = &grid.info;
    if !(info.resolution.is_finite() && info.resolution > 0.0) {
        return Err(PublishError::BadResolution(info.resolution));
    }
    if info.width == 0 || info.height == 0 {
        return Err(PublishError::EmptyGrid);
    }
    let expected = info.cell_count();
    if grid.data.len() != expected {
        return Err(PublishError::CellCountMismatch {
            expected,
            actual: grid.data.len(),
        });
    }
    let origin = &info.origin.position;
    require_finite("origin", &[origin.x, origin.y])
}

fn publish(state: &AppState, message: BridgeMessage) -> Result<Response, PublishError> {
    let event = state
        .publish(message)
        .map_err(|e| PublishError::Encode(e.to_string()))?;
    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "seq": event.seq })),
    )
        .into_response())
}

fn rejected(state: &AppState, error: PublishError) -> Response {
    state.counters.record_rejected_publish();
    warn!(error = %error, "rejected publish");
    error.into_response()
}

pub async fn publish_map(State(state): State<AppState>, Json(body): Json<MapPublish>) -> Response {
    let checked = require_name("topic", &body.topic).and_then(|()| validate_grid(&body.grid));
    if let Err(error) = checked {
        return rejected(&state, error);
    }
    info!(
        topic = %body.topic,
        width = body.grid.info.width,
        height = body.grid.info.height,
        resolution = body.grid.info.resolution,
        "map published"
    );
    let message = BridgeMessage::Map {
        topic: body.topic,
        grid: body.grid,
        stamp: None,
    };
    publish(&state, message).unwrap_or_else(|error| rejected(&state, error))
}

pub async fn publish_pose(
    State(state): State<AppState>,
    Json(body): Json<PosePublish>,
) -> Response {
    let position = &body.pose.position;
    let checked = require_name("topic", &body.topic)
        .and_then(|()| require_finite("position", &[position.x, position.y]));
    if let Err(error) = checked {
        return rejected(&state, error);
    }
    debug!(topic = %body.topic, x = position.x, y = position.y, "pose published");
    let message = BridgeMessage::Pose {
        topic: body.topic,
        message_type: body
            .message_type
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_POSE_MESSAGE_TYPE.to_string()),
        pose: body.pose,
        stamp: None,
    };
    publish(&state, message).unwrap_or_else(|error| rejected(&state, error))
}

pub async fn publish_transform(
    State(state): State<AppState>,
    Json(body): Json<TransformPublish>,
) -> Response {
    let translation = &body.transform.translation;
    let checked = require_name("parent_frame", &body.parent_frame)
        .and_then(|()| require_name("child_frame", &body.child_frame))
        .and_then(|()| require_finite("translation", &[translation.x, translation.y]));
    if let Err(error) = checked {
        return rejected(&state, error);
    }
    debug!(
        parent = %body.parent_frame,
        child = %body.child_frame,
        "transform published"
    );
    let message = BridgeMessage::Transform {
        parent_frame: body.parent_frame,
        child_frame: body.child_frame,
        transform: body.transform,
        stamp: None,
    };
    publish(&state, message).unwrap_or_else(|error| rejected(&state, error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use navview_shared::GridInfo;

    fn grid(width: u32, height: u32, cells: usize) -> OccupancyGrid {
        OccupancyGrid {
            info: GridInfo {
                resolution: 0.05,
                width,
                height,
                origin: PoseMsg::default(),
            },
            data: vec![-1; cells],
        }
    }

    #[test]
    fn grid_cell_count_must_match_dimensions() {
        assert_eq!(validate_grid(&grid(4, 3, 12)), Ok(()));
        assert_eq!(
            validate_grid(&grid(4, 3, 11)),
            Err(PublishError::CellCountMismatch {
                expected: 12,
                actual: 11
            })
        );
        assert_eq!(validate_grid(&grid(0, 3, 0)), Err(PublishError::EmptyGrid));
    }

    #[test]
    fn grid_resolution_must_be_positive() {
        let mut bad = grid(1, 1, 1);
        bad.info.resolution = 0.0;
        assert_eq!(validate_grid(&bad), Err(PublishError::BadResolution(0.0)));
    }

    #[test]
    fn error_messages_name_the_field() {
        assert_eq!(
            PublishError::EmptyName("topic").to_string(),
            "topic must not be empty"
        );
    }
}

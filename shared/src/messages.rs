use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_POSE_MESSAGE_TYPE: &str = "geometry_msgs/Pose";

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Orientation as a unit quaternion. Components are taken as delivered; no
/// normalization happens on this side of the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    #[serde(default = "one")]
    pub w: f64,
}

fn one() -> f64 {
    1.0
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quaternion {
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    /// Pure rotation about the world Z axis.
    pub fn from_yaw(yaw: f64) -> Self {
        let half = yaw / 2.0;
        Self {
            x: 0.0,
            y: 0.0,
            z: half.sin(),
            w: half.cos(),
        }
    }

    /// Heading around Z in radians, counter-clockwise from +X.
    pub fn yaw(&self) -> f64 {
        (2.0 * (self.w * self.z + self.x * self.y))
            .atan2(1.0 - 2.0 * (self.y * self.y + self.z * self.z))
    }

    /// Angle in radians of the rotation taking `self` to `other`.
    pub fn angle_to(&self, other: &Self) -> f64 {
        let dot = self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w;
        2.0 * dot.abs().min(1.0).acos()
    }
}

/// `geometry_msgs/Pose`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PoseMsg {
    pub position: Point,
    #[serde(default)]
    pub orientation: Quaternion,
}

/// `geometry_msgs/Transform` of a child frame relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TransformMsg {
    pub translation: Point,
    #[serde(default)]
    pub rotation: Quaternion,
}

/// `nav_msgs/MapMetaData`. `width`/`height` are cell counts, `resolution` is
/// metres per cell and `origin` is the pose of cell (0, 0) in the map frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridInfo {
    pub resolution: f64,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub origin: PoseMsg,
}

impl GridInfo {
    pub fn width_m(&self) -> f64 {
        f64::from(self.width) * self.resolution
    }

    pub fn height_m(&self) -> f64 {
        f64::from(self.height) * self.resolution
    }

    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// `nav_msgs/OccupancyGrid`: row-major cells starting at the bottom-left,
/// values 0..=100 for occupancy probability and -1 for unknown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupancyGrid {
    pub info: GridInfo,
    #[serde(default)]
    pub data: Vec<i8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeMessage {
    Map {
        topic: String,
        grid: OccupancyGrid,
        #[serde(default)]
        stamp: Option<DateTime<Utc>>,
    },
    Pose {
        topic: String,
        #[serde(default = "default_pose_message_type")]
        message_type: String,
        pose: PoseMsg,
        #[serde(default)]
        stamp: Option<DateTime<Utc>>,
    },
    Transform {
        parent_frame: String,
        child_frame: String,
        transform: TransformMsg,
        #[serde(default)]
        stamp: Option<DateTime<Utc>>,
    },
}

fn default_pose_message_type() -> String {
    DEFAULT_POSE_MESSAGE_TYPE.to_string()
}

impl BridgeMessage {
    /// SSE event name the relay uses for this message.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Map { .. } => "map",
            Self::Pose { .. } => "pose",
            Self::Transform { .. } => "transform",
        }
    }

    /// Key under which the relay retains the latest message of each stream.
    pub fn retain_key(&self) -> String {
        match self {
            Self::Map { topic, .. } | Self::Pose { topic, .. } => topic.clone(),
            Self::Transform {
                parent_frame,
                child_frame,
                ..
            } => format!("{parent_frame}->{child_frame}"),
        }
    }

    pub fn with_stamp(mut self, at: DateTime<Utc>) -> Self {
        match &mut self {
            Self::Map { stamp, .. } | Self::Pose { stamp, .. } | Self::Transform { stamp, .. } => {
                *stamp = Some(at);
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pose_message_defaults_type_and_orientation() {
        let json = r#"{"type":"pose","topic":"/robot_pose","pose":{"position":{"x":1.0,"y":2.0}}}"#;
        let msg: BridgeMessage = serde_json::from_str(json).expect("parse pose");
        let BridgeMessage::Pose {
            message_type, pose, ..
        } = msg
        else {
            panic!("expected pose message");
        };
        assert_eq!(message_type, DEFAULT_POSE_MESSAGE_TYPE);
        assert_eq!(pose.orientation, Quaternion::IDENTITY);
        assert_eq!(pose.position, Point::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn transform_retain_key_joins_frames() {
        let msg = BridgeMessage::Transform {
            parent_frame: "/map".into(),
            child_frame: "/base_link".into(),
            transform: TransformMsg::default(),
            stamp: None,
        };
        assert_eq!(msg.retain_key(), "/map->/base_link");
        assert_eq!(msg.event_name(), "transform");
    }

    #[test]
    fn yaw_matches_constructed_heading() {
        for yaw in [0.0, 0.5, -1.2, 3.0] {
            let q = Quaternion::from_yaw(yaw);
            assert!((q.yaw() - yaw).abs() < 1e-9, "yaw {yaw} -> {}", q.yaw());
        }
    }

    #[test]
    fn angle_to_is_rotation_between_headings() {
        let a = Quaternion::from_yaw(0.2);
        let b = Quaternion::from_yaw(0.5);
        assert!((a.angle_to(&b) - 0.3).abs() < 1e-9);
        assert!(a.angle_to(&a) < 1e-6);
    }

    #[test]
    fn grid_info_extent_in_metres() {
        let info = GridInfo {
            resolution: 0.05,
            width: 200,
            height: 100,
            origin: PoseMsg::default(),
        };
        assert!((info.width_m() - 10.0).abs() < 1e-9);
        assert!((info.height_m() - 5.0).abs() < 1e-9);
        assert_eq!(info.cell_count(), 20_000);
    }
}

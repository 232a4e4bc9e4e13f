use serde::{Deserialize, Serialize};

use crate::messages::DEFAULT_POSE_MESSAGE_TYPE;

pub const DEFAULT_MAP_FRAME: &str = "/map";
pub const DEFAULT_BASE_FRAME: &str = "/base_link";
pub const DEFAULT_ROBOT_POSE_TOPIC: &str = "/robot_pose";
pub const DEFAULT_MAP_TOPIC: &str = "/map";
pub const DEFAULT_ANGULAR_THRESHOLD: f64 = 0.01;
pub const DEFAULT_TRANSLATION_THRESHOLD: f64 = 0.01;
pub const DEFAULT_THROTTLE_RATE_MS: u32 = 100;

/// Per-page viewer settings, read from the page URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerOptions {
    /// Track the robot through tf instead of a pose topic.
    pub use_tf: bool,
    pub map_frame: String,
    pub base_frame: String,
    pub robot_pose: String,
    pub map_topic: String,
    /// Keep applying map updates after the first one (live mapping).
    pub continuous: bool,
    pub angular_threshold: f64,
    pub translation_threshold: f64,
    pub throttle_rate_ms: u32,
    pub pose_message_type: String,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            use_tf: false,
            map_frame: DEFAULT_MAP_FRAME.to_string(),
            base_frame: DEFAULT_BASE_FRAME.to_string(),
            robot_pose: DEFAULT_ROBOT_POSE_TOPIC.to_string(),
            map_topic: DEFAULT_MAP_TOPIC.to_string(),
            continuous: false,
            angular_threshold: DEFAULT_ANGULAR_THRESHOLD,
            translation_threshold: DEFAULT_TRANSLATION_THRESHOLD,
            throttle_rate_ms: DEFAULT_THROTTLE_RATE_MS,
            pose_message_type: DEFAULT_POSE_MESSAGE_TYPE.to_string(),
        }
    }
}

impl ViewerOptions {
    /// Query parameter names understood by [`ViewerOptions::from_pairs`].
    pub const QUERY_KEYS: [&'static str; 10] = [
        "use_tf",
        "continuous",
        "map_frame",
        "base_frame",
        "robot_pose",
        "map_topic",
        "pose_message_type",
        "angular_threshold",
        "translation_threshold",
        "throttle_rate",
    ];

    /// Build options from already-decoded query pairs. Unknown keys are
    /// ignored and values that do not parse keep their default.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut options = Self::default();
        for (key, value) in pairs {
            let value = value.as_ref();
            match key.as_ref() {
                "use_tf" => options.use_tf = parse_flag(value).unwrap_or(options.use_tf),
                "continuous" => {
                    options.continuous = parse_flag(value).unwrap_or(options.continuous);
                }
                "map_frame" => set_non_empty(&mut options.map_frame, value),
                "base_frame" => set_non_empty(&mut options.base_frame, value),
                "robot_pose" => set_non_empty(&mut options.robot_pose, value),
                "map_topic" => set_non_empty(&mut options.map_topic, value),
                "pose_message_type" => set_non_empty(&mut options.pose_message_type, value),
                "angular_threshold" => {
                    options.angular_threshold =
                        parse_non_negative(value).unwrap_or(options.angular_threshold);
                }
                "translation_threshold" => {
                    options.translation_threshold =
                        parse_non_negative(value).unwrap_or(options.translation_threshold);
                }
                "throttle_rate" => {
                    options.throttle_rate_ms = value
                        .trim()
                        .parse::<u32>()
                        .ok()
                        .unwrap_or(options.throttle_rate_ms);
                }
                _ => {}
            }
        }
        options
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_non_negative(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

fn set_non_empty(slot: &mut String, value: &str) {
    let value = value.trim();
    if !value.is_empty() {
        *slot = value.to_string();
    }
}

use crate::geometry::Pose2D;
use crate::messages::{BridgeMessage, Quaternion};
use crate::options::ViewerOptions;

/// A stream of robot poses carved out of the bridge message feed.
pub trait PoseSource {
    /// Inspect one incoming message; return a pose if it belongs to this
    /// source and should be rendered. `now_ms` is a monotonic clock reading.
    fn accept(&mut self, message: &BridgeMessage, now_ms: f64) -> Option<Pose2D>;

    /// Short description for logs.
    fn describe(&self) -> String;
}

/// Follows one tracked frame relative to a fixed reference frame, emitting
/// only when the transform has moved past either threshold.
#[derive(Debug, Clone)]
pub struct TransformFrameSource {
    pub reference_frame: String,
    pub tracked_frame: String,
    pub angular_threshold: f64,
    pub translation_threshold: f64,
    last: Option<(f64, f64, Quaternion)>,
}

impl TransformFrameSource {
    pub fn new(
        reference_frame: impl Into<String>,
        tracked_frame: impl Into<String>,
        angular_threshold: f64,
        translation_threshold: f64,
    ) -> Self {
        Self {
            reference_frame: reference_frame.into(),
            tracked_frame: tracked_frame.into(),
            angular_threshold,
            translation_threshold,
            last: None,
        }
    }

    fn moved_enough(&self, x: f64, y: f64, rotation: &Quaternion) -> bool {
        let Some((last_x, last_y, last_rotation)) = self.last else {
            return true;
        };
        (x - last_x).hypot(y - last_y) > self.translation_threshold
            || last_rotation.angle_to(rotation) > self.angular_threshold
    }
}

impl PoseSource for TransformFrameSource {
    fn accept(&mut self, message: &BridgeMessage, _now_ms: f64) -> Option<Pose2D> {
        let BridgeMessage::Transform {
            parent_frame,
            child_frame,
            transform,
            ..
        } = message
        else {
            return None;
        };
        if !same_frame(parent_frame, &self.reference_frame)
            || !same_frame(child_frame, &self.tracked_frame)
        {
            return None;
        }

        let pose = Pose2D::from(transform);
        if !self.moved_enough(pose.x, pose.y, &pose.orientation) {
            return None;
        }
        self.last = Some((pose.x, pose.y, pose.orientation));
        Some(pose)
    }

    fn describe(&self) -> String {
        format!("tf {} -> {}", self.reference_frame, self.tracked_frame)
    }
}

/// Plain pose topic, optionally throttled to one sample per
/// `throttle_rate_ms`.
#[derive(Debug, Clone)]
pub struct PoseTopicSource {
    pub topic: String,
    pub message_type: String,
    pub throttle_rate_ms: u32,
    last_emit_ms: Option<f64>,
}

impl PoseTopicSource {
    pub fn new(
        topic: impl Into<String>,
        message_type: impl Into<String>,
        throttle_rate_ms: u32,
    ) -> Self {
        Self {
            topic: topic.into(),
            message_type: message_type.into(),
            throttle_rate_ms,
            last_emit_ms: None,
        }
    }

    fn throttled(&self, now_ms: f64) -> bool {
        match self.last_emit_ms {
            Some(last) => now_ms - last < f64::from(self.throttle_rate_ms),
            None => false,
        }
    }
}

impl PoseSource for PoseTopicSource {
    fn accept(&mut self, message: &BridgeMessage, now_ms: f64) -> Option<Pose2D> {
        let BridgeMessage::Pose {
            topic,
            message_type,
            pose,
            ..
        } = message
        else {
            return None;
        };
        if *topic != self.topic || *message_type != self.message_type {
            return None;
        }
        if self.throttled(now_ms) {
            return None;
        }
        self.last_emit_ms = Some(now_ms);
        Some(Pose2D::from(pose))
    }

    fn describe(&self) -> String {
        format!("topic {} ({})", self.topic, self.message_type)
    }
}

/// Pick the pose source once, at setup, from the viewer options.
pub fn pose_source_for(options: &ViewerOptions) -> Box<dyn PoseSource> {
    if options.use_tf {
        Box::new(TransformFrameSource::new(
            options.map_frame.clone(),
            options.base_frame.clone(),
            options.angular_threshold,
            options.translation_threshold,
        ))
    } else {
        Box::new(PoseTopicSource::new(
            options.robot_pose.clone(),
            options.pose_message_type.clone(),
            options.throttle_rate_ms,
        ))
    }
}

/// tf frame ids are compared without the legacy leading slash.
fn same_frame(a: &str, b: &str) -> bool {
    a.trim_start_matches('/') == b.trim_start_matches('/')
}

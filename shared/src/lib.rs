pub mod geometry;
pub mod messages;
pub mod options;
pub mod projector;
pub mod source;
pub mod viewport_sync;

pub use geometry::{MapGeometry, Pose2D};
pub use messages::*;
pub use options::ViewerOptions;
pub use projector::{
    GlobalThetaConverter, MarkerSink, MarkerTransform, PoseProjector, RotationConverter, ZoomState,
};
pub use source::{PoseSource, PoseTopicSource, TransformFrameSource, pose_source_for};
pub use viewport_sync::{ViewportControl, sync_viewport};

use navview_shared::{
    BridgeMessage, MapGeometry, PoseProjector, PoseSource, ViewerOptions, pose_source_for,
    sync_viewport,
};

use crate::marker::RobotMarker;
use crate::occupancy::MapLayer;
use crate::viewer::Viewer;

/// Per-connection viewer state: the last applied map geometry, the marker
/// projector and the pose source chosen from the options.
pub struct BridgeSession {
    options: ViewerOptions,
    applied: Option<MapGeometry>,
    projector: PoseProjector,
    source: Box<dyn PoseSource>,
    maps_applied: u64,
}

impl BridgeSession {
    pub fn new(options: ViewerOptions) -> Self {
        let source = pose_source_for(&options);
        Self {
            options,
            applied: None,
            projector: PoseProjector::default(),
            source,
            maps_applied: 0,
        }
    }

    pub fn pose_source(&self) -> String {
        self.source.describe()
    }

    pub fn applied_geometry(&self) -> Option<MapGeometry> {
        self.applied
    }

    /// Apply a map message to the viewer. Returns the decoded layer when the
    /// map was taken; a non-continuous viewer takes only the first one.
    pub fn on_map(&mut self, message: &BridgeMessage, viewer: &mut Viewer) -> Option<MapLayer> {
        let BridgeMessage::Map { topic, grid, .. } = message else {
            return None;
        };
        if *topic != self.options.map_topic {
            return None;
        }
        if !self.options.continuous && self.maps_applied > 0 {
            return None;
        }

        self.maps_applied += 1;
        let layer = MapLayer::from_grid(grid, self.maps_applied);
        self.applied = Some(sync_viewport(self.applied, viewer, layer.geometry));
        Some(layer)
    }

    /// Route a pose or transform message through the pose source and onto
    /// the marker. Returns whether the marker changed.
    pub fn on_pose(
        &mut self,
        message: &BridgeMessage,
        now_ms: f64,
        viewer: &Viewer,
        marker: &mut RobotMarker,
    ) -> bool {
        let Some(pose) = self.source.accept(message, now_ms) else {
            return false;
        };
        self.projector.project_onto(&pose, viewer, marker);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use navview_shared::{GridInfo, OccupancyGrid, Point, PoseMsg, Quaternion, TransformMsg};

    fn map(topic: &str, width: u32, origin_x: f64) -> BridgeMessage {
        BridgeMessage::Map {
            topic: topic.into(),
            grid: OccupancyGrid {
                info: GridInfo {
                    resolution: 1.0,
                    width,
                    height: 10,
                    origin: PoseMsg {
                        position: Point::new(origin_x, 0.0, 0.0),
                        orientation: Quaternion::IDENTITY,
                    },
                },
                data: vec![0; width as usize * 10],
            },
            stamp: None,
        }
    }

    fn pose(x: f64, y: f64) -> BridgeMessage {
        BridgeMessage::Pose {
            topic: "/robot_pose".into(),
            message_type: "geometry_msgs/Pose".into(),
            pose: PoseMsg {
                position: Point::new(x, y, 0.0),
                orientation: Quaternion::IDENTITY,
            },
            stamp: None,
        }
    }

    #[test]
    fn one_shot_viewer_keeps_first_map() {
        let mut session = BridgeSession::new(ViewerOptions::default());
        let mut viewer = Viewer::new(100.0, 100.0);

        assert!(session.on_map(&map("/map", 10, 0.0), &mut viewer).is_some());
        assert!(session.on_map(&map("/map", 20, 0.0), &mut viewer).is_none());
        assert_eq!(
            session.applied_geometry(),
            Some(MapGeometry::new(10.0, 10.0, 0.0, 0.0))
        );
        assert_eq!(viewer.scale_x, 10.0);
    }

    #[test]
    fn continuous_viewer_tracks_growing_map() {
        let options = ViewerOptions {
            continuous: true,
            ..ViewerOptions::default()
        };
        let mut session = BridgeSession::new(options);
        let mut viewer = Viewer::new(100.0, 100.0);

        session.on_map(&map("/map", 10, 0.0), &mut viewer);
        let layer = session
            .on_map(&map("/map", 20, -5.0), &mut viewer)
            .expect("second map applied");
        assert_eq!(layer.generation, 2);
        assert_eq!(viewer.scale_x, 5.0);
        assert_eq!(
            session.applied_geometry(),
            Some(MapGeometry::new(20.0, 10.0, -5.0, 0.0))
        );
        assert_eq!(viewer.world_to_screen(-5.0, 0.0), (0.0, 100.0));
        assert_eq!(viewer.world_to_screen(15.0, 10.0), (100.0, 0.0));
    }

    #[test]
    fn maps_on_other_topics_are_ignored() {
        let mut session = BridgeSession::new(ViewerOptions::default());
        let mut viewer = Viewer::new(100.0, 100.0);
        assert!(session.on_map(&map("/costmap", 10, 0.0), &mut viewer).is_none());
        assert_eq!(session.applied_geometry(), None);
    }

    #[test]
    fn pose_before_map_still_shows_marker() {
        let mut session = BridgeSession::new(ViewerOptions::default());
        let viewer = Viewer::new(100.0, 100.0);
        let mut marker = RobotMarker::default();

        assert!(session.on_pose(&pose(2.0, 3.0), 0.0, &viewer, &mut marker));
        assert!(marker.visible);
        assert_eq!((marker.x, marker.y), (2.0, -3.0));
        assert_eq!((marker.scale_x, marker.scale_y), (1.0, 1.0));
    }

    #[test]
    fn tf_session_ignores_pose_topic() {
        let options = ViewerOptions {
            use_tf: true,
            ..ViewerOptions::default()
        };
        let mut session = BridgeSession::new(options);
        let viewer = Viewer::new(100.0, 100.0);
        let mut marker = RobotMarker::default();

        assert!(!session.on_pose(&pose(2.0, 3.0), 0.0, &viewer, &mut marker));
        let transform = BridgeMessage::Transform {
            parent_frame: "/map".into(),
            child_frame: "/base_link".into(),
            transform: TransformMsg {
                translation: Point::new(1.0, 1.0, 0.0),
                rotation: Quaternion::IDENTITY,
            },
            stamp: None,
        };
        assert!(session.on_pose(&transform, 0.0, &viewer, &mut marker));
        assert_eq!((marker.x, marker.y), (1.0, -1.0));
        assert_eq!(session.pose_source(), "tf /map -> /base_link");
    }
}

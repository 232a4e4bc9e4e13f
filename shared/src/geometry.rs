use serde::{Deserialize, Serialize};

use crate::messages::{GridInfo, OccupancyGrid, PoseMsg, Quaternion, TransformMsg};

/// Extent and world-space origin (bottom-left corner) of the displayed map,
/// in map-frame units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MapGeometry {
    pub width: f64,
    pub height: f64,
    pub origin_x: f64,
    pub origin_y: f64,
}

impl MapGeometry {
    pub const fn new(width: f64, height: f64, origin_x: f64, origin_y: f64) -> Self {
        Self {
            width,
            height,
            origin_x,
            origin_y,
        }
    }

    pub fn from_info(info: &GridInfo) -> Self {
        Self {
            width: info.width_m(),
            height: info.height_m(),
            origin_x: info.origin.position.x,
            origin_y: info.origin.position.y,
        }
    }

    pub fn from_grid(grid: &OccupancyGrid) -> Self {
        Self::from_info(&grid.info)
    }

    pub fn same_size(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height
    }

    pub fn same_origin(&self, other: &Self) -> bool {
        self.origin_x == other.origin_x && self.origin_y == other.origin_y
    }

    /// Scene-frame rectangle `(left, top, width, height)` covered by the map.
    /// The scene frame is the world frame with Y negated, so the world-space
    /// top edge `origin_y + height` becomes the scene-space top.
    pub fn scene_rect(&self) -> (f64, f64, f64, f64) {
        (
            self.origin_x,
            -(self.origin_y + self.height),
            self.width,
            self.height,
        )
    }
}

/// Planar robot pose in the map frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose2D {
    pub x: f64,
    pub y: f64,
    pub orientation: Quaternion,
}

impl Pose2D {
    pub const fn new(x: f64, y: f64, orientation: Quaternion) -> Self {
        Self { x, y, orientation }
    }
}

impl From<&PoseMsg> for Pose2D {
    fn from(msg: &PoseMsg) -> Self {
        Self::new(msg.position.x, msg.position.y, msg.orientation)
    }
}

impl From<&TransformMsg> for Pose2D {
    fn from(msg: &TransformMsg) -> Self {
        Self::new(msg.translation.x, msg.translation.y, msg.rotation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::Point;

    #[test]
    fn geometry_from_grid_uses_metres_and_origin_position() {
        let grid = OccupancyGrid {
            info: GridInfo {
                resolution: 0.5,
                width: 40,
                height: 20,
                origin: PoseMsg {
                    position: Point::new(-3.0, 1.5, 0.0),
                    orientation: Quaternion::IDENTITY,
                },
            },
            data: Vec::new(),
        };
        assert_eq!(
            MapGeometry::from_grid(&grid),
            MapGeometry::new(20.0, 10.0, -3.0, 1.5)
        );
    }

    #[test]
    fn scene_rect_flips_vertical_axis() {
        let geometry = MapGeometry::new(4.0, 2.0, 1.0, 3.0);
        assert_eq!(geometry.scene_rect(), (1.0, -5.0, 4.0, 2.0));
    }
}

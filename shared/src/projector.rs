use crate::geometry::Pose2D;
use crate::messages::Quaternion;

/// Current horizontal and vertical scale of the canvas.
pub trait ZoomState {
    fn scale_x(&self) -> f64;
    fn scale_y(&self) -> f64;
}

/// Converts a map-frame orientation into a screen heading in degrees,
/// clockwise-positive.
pub trait RotationConverter {
    fn world_rotation_to_screen_angle(&self, orientation: &Quaternion) -> f64;
}

impl<F> RotationConverter for F
where
    F: Fn(&Quaternion) -> f64,
{
    fn world_rotation_to_screen_angle(&self, orientation: &Quaternion) -> f64 {
        self(orientation)
    }
}

/// Yaw about the map Z axis, negated because the canvas rotates clockwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalThetaConverter;

impl RotationConverter for GlobalThetaConverter {
    fn world_rotation_to_screen_angle(&self, orientation: &Quaternion) -> f64 {
        -orientation.yaw().to_degrees()
    }
}

/// Rendering handle the projected transform is written into.
pub trait MarkerSink {
    fn set_position(&mut self, x: f64, y: f64);
    fn set_rotation(&mut self, degrees: f64);
    fn set_scale(&mut self, scale_x: f64, scale_y: f64);
    fn set_visible(&mut self, visible: bool);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerTransform {
    pub screen_x: f64,
    pub screen_y: f64,
    pub rotation_degrees: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub visible: bool,
}

impl Default for MarkerTransform {
    fn default() -> Self {
        Self {
            screen_x: 0.0,
            screen_y: 0.0,
            rotation_degrees: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            visible: false,
        }
    }
}

impl MarkerTransform {
    pub fn write_to<S: MarkerSink + ?Sized>(&self, sink: &mut S) {
        sink.set_position(self.screen_x, self.screen_y);
        sink.set_rotation(self.rotation_degrees);
        sink.set_scale(self.scale_x, self.scale_y);
        sink.set_visible(self.visible);
    }
}

/// Tracks one robot marker. The marker's own scale is calibrated against the
/// zoom of the first pose and then left alone.
#[derive(Debug, Clone)]
pub struct PoseProjector<C = GlobalThetaConverter> {
    converter: C,
    transform: MarkerTransform,
    scale_locked: bool,
}

impl Default for PoseProjector<GlobalThetaConverter> {
    fn default() -> Self {
        Self::new(GlobalThetaConverter)
    }
}

impl<C: RotationConverter> PoseProjector<C> {
    pub fn new(converter: C) -> Self {
        Self {
            converter,
            transform: MarkerTransform::default(),
            scale_locked: false,
        }
    }

    pub fn transform(&self) -> &MarkerTransform {
        &self.transform
    }

    pub fn project<Z: ZoomState + ?Sized>(&mut self, pose: &Pose2D, zoom: &Z) -> MarkerTransform {
        self.transform.screen_x = pose.x;
        self.transform.screen_y = -pose.y;
        if !self.scale_locked {
            self.transform.scale_x = 1.0 / zoom.scale_x();
            self.transform.scale_y = 1.0 / zoom.scale_y();
            self.scale_locked = true;
        }
        self.transform.rotation_degrees = self
            .converter
            .world_rotation_to_screen_angle(&pose.orientation);
        self.transform.visible = true;
        self.transform
    }

    /// Project and push the result into `sink`.
    pub fn project_onto<Z, S>(&mut self, pose: &Pose2D, zoom: &Z, sink: &mut S) -> MarkerTransform
    where
        Z: ZoomState + ?Sized,
        S: MarkerSink + ?Sized,
    {
        let transform = self.project(pose, zoom);
        transform.write_to(sink);
        transform
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Zoom(f64, f64);

    impl ZoomState for Zoom {
        fn scale_x(&self) -> f64 {
            self.0
        }

        fn scale_y(&self) -> f64 {
            self.1
        }
    }

    #[derive(Default)]
    struct Sprite {
        x: f64,
        y: f64,
        rotation: f64,
        scale: (f64, f64),
        visible: bool,
        writes: usize,
    }

    impl MarkerSink for Sprite {
        fn set_position(&mut self, x: f64, y: f64) {
            self.x = x;
            self.y = y;
            self.writes += 1;
        }

        fn set_rotation(&mut self, degrees: f64) {
            self.rotation = degrees;
        }

        fn set_scale(&mut self, scale_x: f64, scale_y: f64) {
            self.scale = (scale_x, scale_y);
        }

        fn set_visible(&mut self, visible: bool) {
            self.visible = visible;
        }
    }

    fn at(x: f64, y: f64) -> Pose2D {
        Pose2D::new(x, y, Quaternion::IDENTITY)
    }

    #[test]
    fn vertical_axis_is_flipped() {
        let mut projector = PoseProjector::default();
        let transform = projector.project(&at(2.0, 3.0), &Zoom(1.0, 1.0));
        assert_eq!(transform.screen_x, 2.0);
        assert_eq!(transform.screen_y, -3.0);
    }

    #[test]
    fn marker_scale_is_fixed_by_first_zoom() {
        let mut projector = PoseProjector::default();
        let first = projector.project(&at(0.0, 0.0), &Zoom(4.0, 2.0));
        assert_eq!((first.scale_x, first.scale_y), (0.25, 0.5));

        let second = projector.project(&at(1.0, 1.0), &Zoom(10.0, 10.0));
        assert_eq!((second.scale_x, second.scale_y), (0.25, 0.5));
    }

    #[test]
    fn visible_only_after_first_pose_and_stays_visible() {
        let mut projector = PoseProjector::default();
        assert!(!projector.transform().visible);
        projector.project(&at(0.0, 0.0), &Zoom(1.0, 1.0));
        assert!(projector.transform().visible);
        projector.project(&at(f64::NAN, -1e9), &Zoom(1.0, 1.0));
        assert!(projector.transform().visible);
    }

    #[test]
    fn rotation_comes_from_converter() {
        let mut projector = PoseProjector::new(|q: &Quaternion| q.z * 100.0);
        let orientation = Quaternion {
            z: 0.5,
            ..Quaternion::IDENTITY
        };
        let pose = Pose2D::new(0.0, 0.0, orientation);
        let transform = projector.project(&pose, &Zoom(1.0, 1.0));
        assert_eq!(transform.rotation_degrees, 50.0);
    }

    #[test]
    fn global_theta_is_clockwise_degrees() {
        let converter = GlobalThetaConverter;
        assert_eq!(
            converter.world_rotation_to_screen_angle(&Quaternion::IDENTITY),
            0.0
        );
        let left = Quaternion::from_yaw(std::f64::consts::FRAC_PI_2);
        let angle = converter.world_rotation_to_screen_angle(&left);
        assert!((angle + 90.0).abs() < 1e-9, "got {angle}");
    }

    #[test]
    fn project_onto_writes_every_field() {
        let mut projector = PoseProjector::default();
        let mut sprite = Sprite::default();
        let pose = Pose2D::new(1.5, -2.0, Quaternion::from_yaw(std::f64::consts::PI));
        projector.project_onto(&pose, &Zoom(2.0, 2.0), &mut sprite);
        assert_eq!((sprite.x, sprite.y), (1.5, 2.0));
        assert_eq!(sprite.scale, (0.5, 0.5));
        assert!((sprite.rotation.abs() - 180.0).abs() < 1e-9);
        assert!(sprite.visible);
        assert_eq!(sprite.writes, 1);
    }
}

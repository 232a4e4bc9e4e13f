use navview_shared::{ViewportControl, ZoomState};

const MIN_SCALE: f64 = 1e-3;
const MAX_SCALE: f64 = 1e4;
const ZOOM_SENSITIVITY: f64 = 0.001;

/// Scene-to-canvas transform. Scene coordinates are map coordinates with Y
/// negated; the canvas is Y-down with its origin at the top-left corner.
///
/// The map shift is held in world units and applied at the current scale.
/// `pan_x`/`pan_y` are canvas pixels: the bottom-left anchor plus user panning.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewer {
    pub width: f64,
    pub height: f64,
    pub pan_x: f64,
    pub pan_y: f64,
    pub shift_x: f64,
    pub shift_y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
}

impl Viewer {
    /// The scene origin starts at the bottom-left of the canvas so that map
    /// content above the origin is on screen.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            pan_x: 0.0,
            pan_y: height,
            shift_x: 0.0,
            shift_y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }

    /// Canvas position of the scene origin.
    pub fn offset(&self) -> (f64, f64) {
        (
            self.pan_x - self.shift_x * self.scale_x,
            self.pan_y + self.shift_y * self.scale_y,
        )
    }

    pub fn scene_to_screen(&self, sx: f64, sy: f64) -> (f64, f64) {
        let (ox, oy) = self.offset();
        (sx * self.scale_x + ox, sy * self.scale_y + oy)
    }

    pub fn screen_to_scene(&self, px: f64, py: f64) -> (f64, f64) {
        let (ox, oy) = self.offset();
        ((px - ox) / self.scale_x, (py - oy) / self.scale_y)
    }

    pub fn world_to_screen(&self, wx: f64, wy: f64) -> (f64, f64) {
        self.scene_to_screen(wx, -wy)
    }

    pub fn screen_to_world(&self, px: f64, py: f64) -> (f64, f64) {
        let (sx, sy) = self.screen_to_scene(px, py);
        (sx, -sy)
    }

    /// Pan by a canvas-pixel delta.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.pan_x += dx;
        self.pan_y += dy;
    }

    /// Zoom both axes toward a canvas point, keeping that point fixed.
    pub fn zoom_at(&mut self, delta: f64, px: f64, py: f64) {
        let factor = (-delta * ZOOM_SENSITIVITY).exp();
        let ratio = (self.scale_x * factor).clamp(MIN_SCALE, MAX_SCALE) / self.scale_x;
        let ratio = ratio.min((self.scale_y * ratio).clamp(MIN_SCALE, MAX_SCALE) / self.scale_y);

        let (ox, oy) = self.offset();
        let target_x = px - (px - ox) * ratio;
        let target_y = py - (py - oy) * ratio;
        self.scale_x *= ratio;
        self.scale_y *= ratio;
        self.pan_x = target_x + self.shift_x * self.scale_x;
        self.pan_y = target_y - self.shift_y * self.scale_y;
    }

    /// Follow a canvas resize, keeping the bottom-left anchor in place.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.pan_y += height - self.height;
        self.width = width;
        self.height = height;
    }
}

impl ViewportControl for Viewer {
    fn scale_to_dimensions(&mut self, width: f64, height: f64) {
        self.scale_x = self.width / width;
        self.scale_y = self.height / height;
    }

    fn shift_by(&mut self, dx: f64, dy: f64) {
        self.shift_x += dx;
        self.shift_y += dy;
    }
}

impl ZoomState for Viewer {
    fn scale_x(&self) -> f64 {
        self.scale_x
    }

    fn scale_y(&self) -> f64 {
        self.scale_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use navview_shared::{MapGeometry, sync_viewport};

    fn close(a: (f64, f64), b: (f64, f64)) -> bool {
        (a.0 - b.0).abs() < 1e-9 && (a.1 - b.1).abs() < 1e-9
    }

    #[test]
    fn first_map_fills_canvas_from_bottom_left() {
        let mut viewer = Viewer::new(800.0, 400.0);
        let geometry = MapGeometry::new(10.0, 5.0, -2.0, -1.0);
        sync_viewport(None, &mut viewer, geometry);

        assert_eq!((viewer.scale_x, viewer.scale_y), (80.0, 80.0));
        assert!(close(viewer.world_to_screen(-2.0, -1.0), (0.0, 400.0)));
        assert!(close(viewer.world_to_screen(8.0, 4.0), (800.0, 0.0)));
    }

    #[test]
    fn origin_shift_keeps_world_anchor_on_screen() {
        let mut viewer = Viewer::new(100.0, 100.0);
        let first = MapGeometry::new(10.0, 10.0, 0.0, 0.0);
        let applied = sync_viewport(None, &mut viewer, first);
        let moved = MapGeometry::new(10.0, 10.0, 1.0, 2.0);
        sync_viewport(Some(applied), &mut viewer, moved);

        assert!(close(viewer.world_to_screen(1.0, 2.0), (0.0, 100.0)));
    }

    #[test]
    fn growing_map_stays_pinned_to_canvas_corners() {
        let mut viewer = Viewer::new(100.0, 100.0);
        let corners = |viewer: &Viewer, geometry: MapGeometry| {
            let origin = viewer.world_to_screen(geometry.origin_x, geometry.origin_y);
            let far = viewer.world_to_screen(
                geometry.origin_x + geometry.width,
                geometry.origin_y + geometry.height,
            );
            (origin, far)
        };

        let first = MapGeometry::new(10.0, 10.0, -2.0, -2.0);
        let applied = sync_viewport(None, &mut viewer, first);
        let (origin, far) = corners(&viewer, first);
        assert!(close(origin, (0.0, 100.0)), "bootstrap origin {origin:?}");
        assert!(close(far, (100.0, 0.0)), "bootstrap far corner {far:?}");

        let grown = MapGeometry::new(20.0, 20.0, -2.0, -2.0);
        let applied = sync_viewport(Some(applied), &mut viewer, grown);
        let (origin, far) = corners(&viewer, grown);
        assert!(close(origin, (0.0, 100.0)), "resized origin {origin:?}");
        assert!(close(far, (100.0, 0.0)), "resized far corner {far:?}");

        let extended = MapGeometry::new(40.0, 20.0, -22.0, -2.0);
        sync_viewport(Some(applied), &mut viewer, extended);
        let (origin, far) = corners(&viewer, extended);
        assert!(close(origin, (0.0, 100.0)), "shifted origin {origin:?}");
        assert!(close(far, (100.0, 0.0)), "shifted far corner {far:?}");
    }

    #[test]
    fn zoom_after_shift_keeps_cursor_point_fixed() {
        let mut viewer = Viewer::new(200.0, 100.0);
        sync_viewport(None, &mut viewer, MapGeometry::new(20.0, 10.0, 3.0, -4.0));
        viewer.pan(15.0, -5.0);
        let before = viewer.screen_to_world(80.0, 30.0);
        viewer.zoom_at(250.0, 80.0, 30.0);
        assert!(viewer.scale_x < 10.0);
        assert!(close(viewer.screen_to_world(80.0, 30.0), before));
    }

    #[test]
    fn screen_world_round_trip() {
        let mut viewer = Viewer::new(640.0, 480.0);
        viewer.scale_to_dimensions(32.0, 24.0);
        viewer.shift_by(-3.0, 4.0);
        let (px, py) = viewer.world_to_screen(1.25, -7.5);
        assert!(close(viewer.screen_to_world(px, py), (1.25, -7.5)));
    }

    #[test]
    fn zoom_keeps_cursor_point_fixed() {
        let mut viewer = Viewer::new(200.0, 200.0);
        viewer.scale_to_dimensions(20.0, 20.0);
        let before = viewer.screen_to_world(50.0, 120.0);
        viewer.zoom_at(-300.0, 50.0, 120.0);
        assert!(viewer.scale_x > 10.0);
        assert_eq!(viewer.scale_x, viewer.scale_y);
        assert!(close(viewer.screen_to_world(50.0, 120.0), before));
    }

    #[test]
    fn resize_keeps_bottom_anchor() {
        let mut viewer = Viewer::new(100.0, 100.0);
        let before = viewer.world_to_screen(0.0, 0.0);
        viewer.resize(100.0, 150.0);
        let after = viewer.world_to_screen(0.0, 0.0);
        assert_eq!(before, (0.0, 100.0));
        assert_eq!(after, (0.0, 150.0));
    }
}

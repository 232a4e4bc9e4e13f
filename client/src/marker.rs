use navview_shared::MarkerSink;
use web_sys::CanvasRenderingContext2d;

const ARROW_SIZE: f64 = 15.0;
const ARROW_STROKE: f64 = 1.0;
const ARROW_FILL: &str = "rgba(255, 128, 0, 0.66)";
const ARROW_OUTLINE: &str = "rgba(0, 0, 0, 0.9)";

/// Robot marker in scene coordinates. Hidden until the first pose arrives.
#[derive(Debug, Clone, PartialEq)]
pub struct RobotMarker {
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub visible: bool,
}

impl Default for RobotMarker {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            visible: false,
        }
    }
}

impl MarkerSink for RobotMarker {
    fn set_position(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
    }

    fn set_rotation(&mut self, degrees: f64) {
        self.rotation = degrees;
    }

    fn set_scale(&mut self, scale_x: f64, scale_y: f64) {
        self.scale_x = scale_x;
        self.scale_y = scale_y;
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
}

impl RobotMarker {
    /// Draw a navigation arrow pointing along the heading. `ctx` must already
    /// carry the scene transform.
    pub fn draw(&self, ctx: &CanvasRenderingContext2d) {
        if !self.visible {
            return;
        }
        ctx.save();
        let placed = ctx
            .translate(self.x, self.y)
            .and_then(|()| ctx.rotate(self.rotation.to_radians()))
            .and_then(|()| ctx.scale(self.scale_x, self.scale_y));
        if placed.is_ok() {
            let half = ARROW_SIZE / 2.0;
            ctx.begin_path();
            ctx.move_to(-half, -half);
            ctx.line_to(ARROW_SIZE, 0.0);
            ctx.line_to(-half, half);
            ctx.close_path();
            ctx.set_fill_style_str(ARROW_FILL);
            ctx.fill();
            ctx.set_line_width(ARROW_STROKE);
            ctx.set_stroke_style_str(ARROW_OUTLINE);
            ctx.stroke();
        }
        ctx.restore();
    }
}

use egui::{Color32, Pos2, Vec2, pos2};
use log::warn;

// Common constants for all drawable types
pub const MIN_STROKE_WIDTH: f32 = 0.5;
/// Length (in points) of one flattened piece of a variable-width curve
pub const VARIABLE_WIDTH_STEP: f32 = 2.0;
pub const MAX_CURVE_STEPS: usize = 64;

/// Appearance shared by every object of one batch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: Color32,
    /// Constant width, or the base width of variable strokes
    pub width: f32,
    pub constant_width: bool,
    pub dashed: bool,
    /// Device scale recorded with each object and applied by `draw(.., true)`
    pub output_scale_factor: f32,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            color: Color32::BLACK,
            width: 5.0,
            constant_width: false,
            dashed: false,
            output_scale_factor: 1.0,
        }
    }
}

/// Clamp a width read from input or storage to something drawable
pub(crate) fn sanitize_width(field: &'static str, width: f32) -> f32 {
    if width.is_finite() && width >= MIN_STROKE_WIDTH {
        width
    } else {
        warn!("clamping degenerate {field} {width} to {MIN_STROKE_WIDTH}");
        MIN_STROKE_WIDTH
    }
}

pub(crate) fn sanitize_scale(scale: f32) -> f32 {
    if scale.is_finite() && scale > 0.0 { scale } else { 1.0 }
}

/// Point on a cubic bezier at parameter `t`
pub(crate) fn cubic_point(p0: Pos2, c1: Pos2, c2: Pos2, p1: Pos2, t: f32) -> Pos2 {
    let u = 1.0 - t;
    let a = u * u * u;
    let b = 3.0 * u * u * t;
    let c = 3.0 * u * t * t;
    let d = t * t * t;
    pos2(
        a * p0.x + b * c1.x + c * c2.x + d * p1.x,
        a * p0.y + b * c1.y + c * c2.y + d * p1.y,
    )
}

/// Derivative of a cubic bezier at parameter `t`
pub(crate) fn cubic_tangent(p0: Pos2, c1: Pos2, c2: Pos2, p1: Pos2, t: f32) -> Vec2 {
    let u = 1.0 - t;
    (c1 - p0) * (3.0 * u * u) + (c2 - c1) * (6.0 * u * t) + (p1 - c2) * (3.0 * t * t)
}

/// Upper bound on the arc length of a cubic: the length of its control polygon
pub(crate) fn control_polygon_length(p0: Pos2, c1: Pos2, c2: Pos2, p1: Pos2) -> f32 {
    p0.distance(c1) + c1.distance(c2) + c2.distance(p1)
}

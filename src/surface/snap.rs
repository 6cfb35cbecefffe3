use egui::{Pos2, pos2};

/// Quantizes line endpoints before a line is committed.
///
/// The surface hands snapped points through unchanged; it never re-snaps them.
pub trait PointSnapper {
    fn snap(&self, point: Pos2) -> Pos2;
}

impl<F: Fn(Pos2) -> Pos2> PointSnapper for F {
    fn snap(&self, point: Pos2) -> Pos2 {
        self(point)
    }
}

/// Snaps to the nearest intersection of a square grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiscreteGrid {
    pub size: f32,
}

impl DiscreteGrid {
    pub fn new(size: f32) -> Self {
        Self { size }
    }
}

impl PointSnapper for DiscreteGrid {
    fn snap(&self, point: Pos2) -> Pos2 {
        if self.size.is_nan() || self.size <= 0.0 {
            return point;
        }
        pos2(
            (point.x / self.size).round() * self.size,
            (point.y / self.size).round() * self.size,
        )
    }
}

/// Project `b` onto the horizontal or vertical through `a`, whichever is closer
pub fn constrain_right_angle(a: Pos2, b: Pos2) -> Pos2 {
    if (b.x - a.x).abs() >= (b.y - a.y).abs() {
        pos2(b.x, a.y)
    } else {
        pos2(a.x, b.y)
    }
}

//! Value types shared by every drawable: points, rects, colors and scale factors.

mod hit_testing;
mod normalization;

use serde::{Deserialize, Serialize};

pub use egui::emath::Rot2;
pub use egui::{Color32, Pos2, Rect, Vec2, pos2, vec2};
pub use hit_testing::{bounds_of, to_local_point};
pub use normalization::{ImageFrame, NormalizationRatio, REFERENCE_SIZE, compute_ratio};

/// Unmultiplied RGBA color as stored in serialized documents
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub fn from_color32(color: Color32) -> Self {
        let [r, g, b, a] = color.to_srgba_unmultiplied();
        Self { r, g, b, a }
    }

    pub fn to_color32(self) -> Color32 {
        Color32::from_rgba_unmultiplied(self.r, self.g, self.b, self.a)
    }
}

impl From<Color32> for Rgba {
    fn from(color: Color32) -> Self {
        Self::from_color32(color)
    }
}

impl From<Rgba> for Color32 {
    fn from(color: Rgba) -> Self {
        color.to_color32()
    }
}

/// True when every coordinate is a finite number
pub fn is_finite_point(point: Pos2) -> bool {
    point.x.is_finite() && point.y.is_finite()
}

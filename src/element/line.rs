use egui::{Color32, Pos2, Rect};
use serde::{Deserialize, Serialize};
use tiny_skia::{PathBuilder, Transform};

use super::Drawable;
use crate::element::common::{self, StrokeStyle};
use crate::error::DecodeError;
use crate::geometry::{NormalizationRatio, Rgba, bounds_of, is_finite_point};
use crate::render::Canvas;

/// Straight constant-width line between two points
#[derive(Debug, Clone, PartialEq)]
pub struct LineSegment {
    point_a: Pos2,
    point_b: Pos2,
    stroke_width: f32,
    color: Color32,
    dashed: bool,
    output_scale_factor: f32,
}

/// Serialized form of a [`LineSegment`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRecord {
    pub color: Rgba,
    pub point_a: Pos2,
    pub point_b: Pos2,
    pub stroke_width: f32,
    pub is_dashed: bool,
    #[serde(default = "unit_scale")]
    pub output_scale_factor: f32,
}

fn unit_scale() -> f32 {
    1.0
}

impl LineSegment {
    /// Start a line at `point_a`; both ends coincide until the first move
    pub(crate) fn begin(point_a: Pos2, style: &StrokeStyle) -> Self {
        Self {
            point_a,
            point_b: point_a,
            stroke_width: style.width,
            color: style.color,
            dashed: style.dashed,
            output_scale_factor: style.output_scale_factor,
        }
    }

    pub(crate) fn set_point_a(&mut self, point_a: Pos2) {
        self.point_a = point_a;
    }

    pub(crate) fn set_point_b(&mut self, point_b: Pos2) {
        self.point_b = point_b;
    }

    pub fn point_a(&self) -> Pos2 {
        self.point_a
    }

    pub fn point_b(&self) -> Pos2 {
        self.point_b
    }

    pub fn stroke_width(&self) -> f32 {
        self.stroke_width
    }

    pub fn color(&self) -> Color32 {
        self.color
    }

    pub fn is_dashed(&self) -> bool {
        self.dashed
    }

    pub fn output_scale_factor(&self) -> f32 {
        self.output_scale_factor
    }

    pub fn length(&self) -> f32 {
        self.point_a.distance(self.point_b)
    }
}

impl Drawable for LineSegment {
    type Record = LineRecord;
    const TYPE_TAG: &'static str = "line";

    fn bounding_rect(&self) -> Rect {
        bounds_of(&[self.point_a, self.point_b], self.stroke_width / 2.0)
    }

    fn draw(&self, canvas: &mut Canvas, with_scaling: bool) {
        let factor = if with_scaling { self.output_scale_factor } else { 1.0 };
        canvas.with_transform(Transform::from_scale(factor, factor), |canvas| {
            if self.point_a == self.point_b {
                canvas.fill_circle(self.point_a, self.stroke_width / 2.0, self.color);
                return;
            }
            let mut pb = PathBuilder::new();
            pb.move_to(self.point_a.x, self.point_a.y);
            pb.line_to(self.point_b.x, self.point_b.y);
            if let Some(path) = pb.finish() {
                canvas.stroke_path(&path, self.color, self.stroke_width, self.dashed);
            }
        });
    }

    fn to_record(&self, ratio: NormalizationRatio) -> LineRecord {
        LineRecord {
            color: Rgba::from_color32(self.color),
            point_a: ratio.to_reference_point(self.point_a),
            point_b: ratio.to_reference_point(self.point_b),
            stroke_width: ratio.to_reference_len(self.stroke_width),
            is_dashed: self.dashed,
            output_scale_factor: self.output_scale_factor,
        }
    }

    fn from_record(record: LineRecord, ratio: NormalizationRatio) -> Result<Self, DecodeError> {
        for (field, point) in [("pointA", record.point_a), ("pointB", record.point_b)] {
            if !is_finite_point(point) {
                return Err(DecodeError::InvalidValue {
                    field,
                    reason: format!("non-finite point {point:?}"),
                });
            }
        }

        Ok(Self {
            point_a: ratio.from_reference_point(record.point_a),
            point_b: ratio.from_reference_point(record.point_b),
            stroke_width: common::sanitize_width(
                "strokeWidth",
                ratio.from_reference_len(record.stroke_width),
            ),
            color: record.color.to_color32(),
            dashed: record.is_dashed,
            output_scale_factor: common::sanitize_scale(record.output_scale_factor),
        })
    }
}

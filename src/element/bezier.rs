use egui::{Color32, Pos2, Rect};
use serde::{Deserialize, Serialize};
use tiny_skia::{PathBuilder, Transform};

use super::Drawable;
use crate::element::common::{self, StrokeStyle};
use crate::error::DecodeError;
use crate::geometry::{NormalizationRatio, Rgba, bounds_of, is_finite_point};
use crate::render::Canvas;

/// One cubic bezier piece of a smoothed stroke, with a width that varies
/// linearly from `start_width` to `end_width`.
///
/// Only the smoothing engine and the deserializer build these; they never
/// change afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeSegment {
    start: Pos2,
    end: Pos2,
    control1: Pos2,
    control2: Pos2,
    start_width: f32,
    end_width: f32,
    color: Color32,
    constant_width: bool,
    dashed: bool,
    output_scale_factor: f32,
}

/// Serialized form of a [`StrokeSegment`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BezierRecord {
    pub color: Rgba,
    pub point_a: Pos2,
    pub point_b: Pos2,
    pub point_a_control: Pos2,
    pub point_b_control: Pos2,
    pub stroke_start_width: f32,
    pub stroke_end_width: f32,
    pub is_dashed: bool,
    pub output_scale_factor: f32,
    #[serde(default)]
    pub constant_width: bool,
}

impl StrokeSegment {
    pub(crate) fn new(
        start: Pos2,
        control1: Pos2,
        control2: Pos2,
        end: Pos2,
        start_width: f32,
        end_width: f32,
        style: &StrokeStyle,
    ) -> Self {
        Self {
            start,
            end,
            control1,
            control2,
            start_width,
            end_width,
            color: style.color,
            constant_width: style.constant_width,
            dashed: style.dashed,
            output_scale_factor: style.output_scale_factor,
        }
    }

    /// Zero-extent segment used to render a tap
    pub(crate) fn dot(point: Pos2, width: f32, style: &StrokeStyle) -> Self {
        Self::new(point, point, point, point, width, width, style)
    }

    pub fn start(&self) -> Pos2 {
        self.start
    }

    pub fn end(&self) -> Pos2 {
        self.end
    }

    pub fn control_points(&self) -> (Pos2, Pos2) {
        (self.control1, self.control2)
    }

    pub fn start_width(&self) -> f32 {
        self.start_width
    }

    pub fn end_width(&self) -> f32 {
        self.end_width
    }

    pub fn color(&self) -> Color32 {
        self.color
    }

    pub fn is_constant_width(&self) -> bool {
        self.constant_width
    }

    pub fn is_dashed(&self) -> bool {
        self.dashed
    }

    pub fn output_scale_factor(&self) -> f32 {
        self.output_scale_factor
    }

    pub fn is_dot(&self) -> bool {
        self.start == self.end && self.control1 == self.start && self.control2 == self.start
    }

    fn stroke_uniform(&self, canvas: &mut Canvas) {
        let mut pb = PathBuilder::new();
        pb.move_to(self.start.x, self.start.y);
        pb.cubic_to(
            self.control1.x,
            self.control1.y,
            self.control2.x,
            self.control2.y,
            self.end.x,
            self.end.y,
        );
        if let Some(path) = pb.finish() {
            let width = (self.start_width + self.end_width) / 2.0;
            canvas.stroke_path(&path, self.color, width, self.dashed);
        }
    }

    /// Fill the outline of the curve offset by half the interpolated width on both sides
    fn fill_variable(&self, canvas: &mut Canvas) {
        let (p0, c1, c2, p1) = (self.start, self.control1, self.control2, self.end);
        let length = common::control_polygon_length(p0, c1, c2, p1);
        let steps = ((length / common::VARIABLE_WIDTH_STEP).ceil() as usize)
            .clamp(1, common::MAX_CURVE_STEPS);
        let chord = if p0 != p1 { (p1 - p0).normalized() } else { egui::Vec2::X };

        let mut left = Vec::with_capacity(steps + 1);
        let mut right = Vec::with_capacity(steps + 1);
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let point = common::cubic_point(p0, c1, c2, p1, t);
            let tangent = common::cubic_tangent(p0, c1, c2, p1, t);
            let direction = if tangent.length_sq() > f32::EPSILON {
                tangent.normalized()
            } else {
                chord
            };
            let normal = direction.rot90();
            let half = (self.start_width + (self.end_width - self.start_width) * t) / 2.0;
            left.push(point + normal * half);
            right.push(point - normal * half);
        }

        let mut pb = PathBuilder::new();
        pb.move_to(left[0].x, left[0].y);
        for p in left.iter().skip(1) {
            pb.line_to(p.x, p.y);
        }
        for p in right.iter().rev() {
            pb.line_to(p.x, p.y);
        }
        pb.close();
        if let Some(path) = pb.finish() {
            canvas.fill_path(&path, self.color);
        }

        canvas.fill_circle(p0, self.start_width / 2.0, self.color);
        canvas.fill_circle(p1, self.end_width / 2.0, self.color);
    }
}

impl Drawable for StrokeSegment {
    type Record = BezierRecord;
    const TYPE_TAG: &'static str = "bezier";

    fn bounding_rect(&self) -> Rect {
        let padding = self.start_width.max(self.end_width) / 2.0;
        bounds_of(&[self.start, self.control1, self.control2, self.end], padding)
    }

    fn draw(&self, canvas: &mut Canvas, with_scaling: bool) {
        let factor = if with_scaling { self.output_scale_factor } else { 1.0 };
        canvas.with_transform(Transform::from_scale(factor, factor), |canvas| {
            if self.is_dot() {
                canvas.fill_circle(self.start, self.start_width / 2.0, self.color);
            } else if self.constant_width
                || self.dashed
                || (self.start_width - self.end_width).abs() < f32::EPSILON
            {
                self.stroke_uniform(canvas);
            } else {
                self.fill_variable(canvas);
            }
        });
    }

    fn to_record(&self, ratio: NormalizationRatio) -> BezierRecord {
        BezierRecord {
            color: Rgba::from_color32(self.color),
            point_a: ratio.to_reference_point(self.start),
            point_b: ratio.to_reference_point(self.end),
            point_a_control: ratio.to_reference_point(self.control1),
            point_b_control: ratio.to_reference_point(self.control2),
            stroke_start_width: ratio.to_reference_len(self.start_width),
            stroke_end_width: ratio.to_reference_len(self.end_width),
            is_dashed: self.dashed,
            output_scale_factor: self.output_scale_factor,
            constant_width: self.constant_width,
        }
    }

    fn from_record(record: BezierRecord, ratio: NormalizationRatio) -> Result<Self, DecodeError> {
        let points = [
            ("pointA", record.point_a),
            ("pointB", record.point_b),
            ("pointAControl", record.point_a_control),
            ("pointBControl", record.point_b_control),
        ];
        for (field, point) in points {
            if !is_finite_point(point) {
                return Err(DecodeError::InvalidValue {
                    field,
                    reason: format!("non-finite point {point:?}"),
                });
            }
        }

        Ok(Self {
            start: ratio.from_reference_point(record.point_a),
            end: ratio.from_reference_point(record.point_b),
            control1: ratio.from_reference_point(record.point_a_control),
            control2: ratio.from_reference_point(record.point_b_control),
            start_width: common::sanitize_width(
                "strokeStartWidth",
                ratio.from_reference_len(record.stroke_start_width),
            ),
            end_width: common::sanitize_width(
                "strokeEndWidth",
                ratio.from_reference_len(record.stroke_end_width),
            ),
            color: record.color.to_color32(),
            constant_width: record.constant_width,
            dashed: record.is_dashed,
            output_scale_factor: common::sanitize_scale(record.output_scale_factor),
        })
    }
}

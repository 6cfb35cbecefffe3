//! Text labels floating above the drawing.

mod gesture;
mod layout;
mod overlay;

use egui::emath::Rot2;
use egui::{Color32, Pos2, Rect, pos2};
use log::warn;
use serde::{Deserialize, Serialize};
use tiny_skia::{PathBuilder, Transform};
use uuid::Uuid;

pub use gesture::{GestureSession, LabelTransform};
pub use layout::{Insets, LayoutRequest, TextLayout, layout_text, wrap_line};
pub use overlay::{LabelOverlay, OverlayState};

use crate::config::TextConfig;
use crate::error::DecodeError;
use crate::geometry::{NormalizationRatio, Rgba, bounds_of, is_finite_point, to_local_point};
use crate::render::{Canvas, FontBook};

pub type LabelId = Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlignment {
    Left,
    #[default]
    Center,
    Right,
}

/// A movable, scalable, rotatable piece of text.
///
/// The label's reference geometry is its unscaled frame, centered on the
/// origin, at scale 1 and rotation 0. Everything on screen is that frame
/// mapped by the label's [`LabelTransform`].
#[derive(Debug, Clone, PartialEq)]
pub struct TextLabel {
    id: LabelId,
    text: String,
    font_name: String,
    /// Requested font size at scale 1; fit-to-width may lay out smaller
    unscaled_font_size: f32,
    min_font_size: f32,
    color: Color32,
    alignment: TextAlignment,
    insets: Insets,
    /// Frame width the text is fitted to, when fit-to-width is on
    fit_width: Option<f32>,
    background_white: f32,
    background_alpha: f32,
    transform: LabelTransform,
    selected: bool,
    layout: TextLayout,
    unscaled_frame: Rect,
}

/// Serialized form of a [`TextLabel`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelRecord {
    pub text: String,
    pub font_name: String,
    pub font_size: f32,
    pub text_color: Rgba,
    #[serde(default)]
    pub alignment: TextAlignment,
    pub center: Pos2,
    pub rotation: f32,
    pub scale: f32,
    pub fit_width: bool,
    #[serde(default)]
    pub insets: Insets,
    #[serde(default)]
    pub background_white: f32,
    #[serde(default)]
    pub background_alpha: f32,
}

impl TextLabel {
    pub(crate) fn new(
        config: &TextConfig,
        center: Pos2,
        fit_width: Option<f32>,
        fonts: &FontBook,
    ) -> Self {
        let mut label = Self {
            id: Uuid::new_v4(),
            text: String::new(),
            font_name: config.font_name.clone(),
            unscaled_font_size: config.font_size,
            min_font_size: config.min_font_size,
            color: config.text_color,
            alignment: config.alignment,
            insets: config.initial_insets,
            fit_width,
            background_white: config.background_white,
            background_alpha: config.background_alpha,
            transform: LabelTransform::at(center),
            selected: false,
            layout: empty_layout(),
            unscaled_frame: Rect::NOTHING,
        };
        label.relayout(fonts);
        label
    }

    pub fn id(&self) -> LabelId {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn font_name(&self) -> &str {
        &self.font_name
    }

    pub fn unscaled_font_size(&self) -> f32 {
        self.unscaled_font_size
    }

    /// Font size the text is laid out with at scale 1
    pub fn font_size(&self) -> f32 {
        self.layout.font_size
    }

    /// Font size as seen on screen
    pub fn scaled_font_size(&self) -> f32 {
        self.layout.font_size * self.transform.scale
    }

    pub fn color(&self) -> Color32 {
        self.color
    }

    pub fn alignment(&self) -> TextAlignment {
        self.alignment
    }

    pub fn insets(&self) -> Insets {
        self.insets
    }

    pub fn fits_width(&self) -> bool {
        self.fit_width.is_some()
    }

    pub fn transform(&self) -> LabelTransform {
        self.transform
    }

    pub fn center(&self) -> Pos2 {
        self.transform.center
    }

    pub fn scale(&self) -> f32 {
        self.transform.scale
    }

    pub fn rotation(&self) -> f32 {
        self.transform.rotation
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn layout(&self) -> &TextLayout {
        &self.layout
    }

    /// Reference frame at scale 1 and rotation 0, centered on the origin
    pub fn unscaled_frame(&self) -> Rect {
        self.unscaled_frame
    }

    pub fn background_color(&self) -> Option<Color32> {
        if self.background_alpha <= 0.0 {
            return None;
        }
        let gray = (self.background_white.clamp(0.0, 1.0) * 255.0).round() as u8;
        let alpha = (self.background_alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
        Some(Color32::from_rgba_unmultiplied(gray, gray, gray, alpha))
    }

    pub(crate) fn set_text(&mut self, text: impl Into<String>, fonts: &FontBook) {
        self.text = text.into();
        self.relayout(fonts);
    }

    pub(crate) fn set_font(&mut self, name: impl Into<String>, size: f32, fonts: &FontBook) {
        self.font_name = name.into();
        if size.is_finite() && size > 0.0 {
            self.unscaled_font_size = size;
        } else {
            warn!("ignoring font size {size}");
        }
        self.relayout(fonts);
    }

    pub(crate) fn set_fit_width(&mut self, fit_width: Option<f32>, fonts: &FontBook) {
        self.fit_width = fit_width;
        self.relayout(fonts);
    }

    pub(crate) fn set_color(&mut self, color: Color32) {
        self.color = color;
    }

    pub(crate) fn set_alignment(&mut self, alignment: TextAlignment) {
        self.alignment = alignment;
    }

    pub(crate) fn set_transform(&mut self, transform: LabelTransform) {
        self.transform = transform;
    }

    pub(crate) fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    /// Recompute font size and frame from the text, font and fit width
    pub(crate) fn relayout(&mut self, fonts: &FontBook) {
        self.layout = layout_text(
            fonts,
            &LayoutRequest {
                text: &self.text,
                font_name: &self.font_name,
                font_size: self.unscaled_font_size,
                min_font_size: self.min_font_size,
                insets: self.insets,
                fit_width: self.fit_width,
            },
        );
        self.unscaled_frame = Rect::from_center_size(Pos2::ZERO, self.layout.size);
    }

    /// Whether a view point falls on the label, rotation and scale included
    pub fn contains(&self, point: Pos2) -> bool {
        let local = to_local_point(
            point,
            self.transform.center,
            Rot2::from_angle(self.transform.rotation),
            self.transform.scale,
            Pos2::ZERO,
        );
        self.unscaled_frame.contains(local)
    }

    /// Axis-aligned bounds of the rotated, scaled frame in view coordinates
    pub fn view_bounds(&self) -> Rect {
        let frame = self.unscaled_frame;
        let corners = [
            frame.left_top(),
            frame.right_top(),
            frame.right_bottom(),
            frame.left_bottom(),
        ]
        .map(|corner| self.local_to_view(corner));
        bounds_of(&corners, 0.0)
    }

    pub fn local_to_view(&self, local: Pos2) -> Pos2 {
        let rotation = Rot2::from_angle(self.transform.rotation);
        self.transform.center + rotation * (local.to_vec2() * self.transform.scale)
    }

    fn canvas_transform(&self) -> Transform {
        let LabelTransform {
            center,
            scale,
            rotation,
        } = self.transform;
        let (sin, cos) = rotation.sin_cos();
        Transform::from_row(
            scale * cos,
            scale * sin,
            -scale * sin,
            scale * cos,
            center.x,
            center.y,
        )
    }

    /// Paint background and glyphs in the canvas' current transform
    pub fn draw(&self, canvas: &mut Canvas, fonts: &FontBook) {
        canvas.with_transform(self.canvas_transform(), |canvas| {
            let frame = self.unscaled_frame;
            if let Some(background) = self.background_color() {
                if let Some(rect) =
                    tiny_skia::Rect::from_ltrb(frame.min.x, frame.min.y, frame.max.x, frame.max.y)
                {
                    canvas.fill_path(&PathBuilder::from_rect(rect), background);
                }
            }

            let layout = &self.layout;
            let left = frame.min.x + self.insets.left;
            let right = frame.max.x - self.insets.right;
            let ascent = fonts.ascent(&self.font_name, layout.font_size);
            let mut builder = PathBuilder::new();
            for (i, (line, width)) in layout.lines.iter().zip(&layout.line_widths).enumerate() {
                if line.is_empty() {
                    continue;
                }
                let x = match self.alignment {
                    TextAlignment::Left => left,
                    TextAlignment::Center => (left + right - width) / 2.0,
                    TextAlignment::Right => right - width,
                };
                let baseline =
                    frame.min.y + self.insets.top + ascent + i as f32 * layout.line_height;
                if !fonts.push_line(&mut builder, &self.font_name, layout.font_size, line, pos2(x, baseline)) {
                    break;
                }
            }
            if let Some(path) = builder.finish() {
                canvas.fill_path(&path, self.color);
            }
        });
    }

    pub fn to_record(&self, ratio: NormalizationRatio) -> LabelRecord {
        LabelRecord {
            text: self.text.clone(),
            font_name: self.font_name.clone(),
            font_size: ratio.to_reference_len(self.unscaled_font_size),
            text_color: Rgba::from_color32(self.color),
            alignment: self.alignment,
            center: ratio.to_reference_point(self.transform.center),
            rotation: self.transform.rotation,
            scale: self.transform.scale,
            fit_width: self.fit_width.is_some(),
            insets: Insets {
                top: ratio.to_reference_len(self.insets.top),
                left: ratio.to_reference_len(self.insets.left),
                bottom: ratio.to_reference_len(self.insets.bottom),
                right: ratio.to_reference_len(self.insets.right),
            },
            background_white: self.background_white,
            background_alpha: self.background_alpha,
        }
    }

    /// Rebuild a label; a fitted label is fitted to `fit_width`
    pub(crate) fn from_record(
        record: LabelRecord,
        ratio: NormalizationRatio,
        config: &TextConfig,
        fit_width: f32,
        fonts: &FontBook,
    ) -> Result<Self, DecodeError> {
        if !is_finite_point(record.center) {
            return Err(DecodeError::InvalidValue {
                field: "center",
                reason: format!("non-finite point {:?}", record.center),
            });
        }
        if !(record.font_size.is_finite() && record.font_size > 0.0) {
            return Err(DecodeError::InvalidValue {
                field: "fontSize",
                reason: format!("{} is not a positive size", record.font_size),
            });
        }
        if !record.rotation.is_finite() {
            return Err(DecodeError::InvalidValue {
                field: "rotation",
                reason: format!("{} is not finite", record.rotation),
            });
        }
        let scale = if record.scale.is_finite() && record.scale >= config.min_scale {
            record.scale
        } else {
            warn!("clamping label scale {} to {}", record.scale, config.min_scale);
            config.min_scale
        };

        let mut label = Self {
            id: Uuid::new_v4(),
            text: record.text,
            font_name: record.font_name,
            unscaled_font_size: ratio.from_reference_len(record.font_size),
            min_font_size: config.min_font_size,
            color: record.text_color.to_color32(),
            alignment: record.alignment,
            insets: Insets {
                top: ratio.from_reference_len(record.insets.top),
                left: ratio.from_reference_len(record.insets.left),
                bottom: ratio.from_reference_len(record.insets.bottom),
                right: ratio.from_reference_len(record.insets.right),
            },
            fit_width: record.fit_width.then_some(fit_width),
            background_white: record.background_white,
            background_alpha: record.background_alpha,
            transform: LabelTransform {
                center: ratio.from_reference_point(record.center),
                scale,
                rotation: record.rotation,
            },
            selected: false,
            layout: empty_layout(),
            unscaled_frame: Rect::NOTHING,
        };
        label.relayout(fonts);
        Ok(label)
    }
}

fn empty_layout() -> TextLayout {
    TextLayout {
        font_size: 0.0,
        lines: Vec::new(),
        line_widths: Vec::new(),
        line_height: 0.0,
        size: egui::Vec2::ZERO,
    }
}

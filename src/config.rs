use egui::{Color32, Vec2};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::geometry::REFERENCE_SIZE;
use crate::label::{Insets, TextAlignment};

/// Settings applied to new strokes and lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawingConfig {
    /// Width of constant strokes and lines, or the base width of variable strokes
    pub stroke_width: f32,
    pub stroke_color: Color32,
    /// Keep the width constant instead of thinning with drawing speed
    pub constant_width: bool,
    pub dashed: bool,
    /// Constrain lines to horizontal or vertical
    pub right_angle_lines_only: bool,
    /// Snap line endpoints to a grid of this many points, if set
    pub grid_size: Option<f32>,
}

impl Default for DrawingConfig {
    fn default() -> Self {
        Self {
            stroke_width: 5.0,
            stroke_color: Color32::BLACK,
            constant_width: false,
            dashed: false,
            right_angle_lines_only: false,
            grid_size: None,
        }
    }
}

/// Tuning constants of the stroke smoothing engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Moves closer than this to the previous accepted point are dropped
    pub min_point_distance: f32,
    /// Fraction of the neighbour chord used as control point offset
    pub smoothing_factor: f32,
    /// Time assumed between two samples, in seconds
    pub sample_interval: f32,
    /// Speed (points/s) at or below which strokes keep their full width
    pub reference_velocity: f32,
    /// Weight of the newest velocity sample against the running velocity
    pub velocity_filter_weight: f32,
    /// Thinnest variable stroke, relative to the base width
    pub min_relative_width: f32,
    /// Weight of the previous end width when computing the next one
    pub width_blend: f32,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            min_point_distance: 2.0,
            smoothing_factor: 1.0 / 6.0,
            sample_interval: 1.0 / 60.0,
            reference_velocity: 220.0,
            velocity_filter_weight: 0.9,
            min_relative_width: 0.4,
            width_blend: 0.6,
        }
    }
}

/// Settings applied to new text labels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    pub font_name: String,
    pub font_size: f32,
    pub text_color: Color32,
    pub alignment: TextAlignment,
    pub fit_to_width: bool,
    pub initial_insets: Insets,
    /// Greyscale value of the label background
    pub background_white: f32,
    /// Alpha of the label background, 0 disables it
    pub background_alpha: f32,
    /// Pinch can never shrink a label below this scale
    pub min_scale: f32,
    pub min_font_size: f32,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            font_name: "Helvetica".to_owned(),
            font_size: 36.0,
            text_color: Color32::WHITE,
            alignment: TextAlignment::Center,
            fit_to_width: false,
            initial_insets: Insets::default(),
            background_white: 0.0,
            background_alpha: 0.0,
            min_scale: 0.2,
            min_font_size: 8.0,
        }
    }
}

/// Complete configuration of a markup controller.
///
/// Missing fields take their defaults, so a partial JSON object is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkupConfig {
    pub drawing: DrawingConfig,
    pub smoothing: SmoothingConfig,
    pub text: TextConfig,
    pub reference_size: Vec2,
}

impl Default for MarkupConfig {
    fn default() -> Self {
        Self {
            drawing: DrawingConfig::default(),
            smoothing: SmoothingConfig::default(),
            text: TextConfig::default(),
            reference_size: REFERENCE_SIZE,
        }
    }
}

impl MarkupConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

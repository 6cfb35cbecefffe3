use std::collections::HashMap;

use ab_glyph::{Font, FontArc, InvalidFont, OutlineCurve, PxScale, ScaleFont};
use egui::Pos2;
use log::{debug, warn};
use tiny_skia::PathBuilder;

/// Advance of one glyph, in ems, when no font is available for measuring
pub const FALLBACK_ADVANCE: f32 = 0.55;
/// Line height, in ems, when no font is available for measuring
pub const FALLBACK_LINE_HEIGHT: f32 = 1.2;

/// Name the bundled font is registered under
pub const DEFAULT_FONT_NAME: &str = "Ubuntu-Light";

/// Fonts available to labels, looked up by name.
///
/// Unknown names fall back to the default font (the first one registered,
/// unless set explicitly).
#[derive(Clone)]
pub struct FontBook {
    fonts: HashMap<String, FontArc>,
    default_font: Option<String>,
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.fonts.keys().collect();
        names.sort();
        f.debug_struct("FontBook")
            .field("fonts", &names)
            .field("default_font", &self.default_font)
            .finish()
    }
}

impl Default for FontBook {
    fn default() -> Self {
        Self::new()
    }
}

impl FontBook {
    /// A book holding the bundled default font
    pub fn new() -> Self {
        let mut book = Self::empty();
        match FontArc::try_from_slice(epaint_default_fonts::UBUNTU_LIGHT) {
            Ok(font) => {
                book.fonts.insert(DEFAULT_FONT_NAME.to_owned(), font);
                book.default_font = Some(DEFAULT_FONT_NAME.to_owned());
            }
            Err(err) => warn!("bundled font could not be loaded: {err}"),
        }
        book
    }

    /// A book with no fonts; text is measured with fallback metrics and not drawn
    pub fn empty() -> Self {
        Self {
            fonts: HashMap::new(),
            default_font: None,
        }
    }

    /// Register a TrueType/OpenType font under `name`
    pub fn insert(&mut self, name: impl Into<String>, bytes: Vec<u8>) -> Result<(), InvalidFont> {
        let name = name.into();
        let font = FontArc::try_from_vec(bytes)?;
        debug!("registered font {name}");
        if self.default_font.is_none() {
            self.default_font = Some(name.clone());
        }
        self.fonts.insert(name, font);
        Ok(())
    }

    pub fn set_default(&mut self, name: impl Into<String>) {
        self.default_font = Some(name.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    pub fn resolve(&self, name: &str) -> Option<&FontArc> {
        self.fonts
            .get(name)
            .or_else(|| self.default_font.as_ref().and_then(|d| self.fonts.get(d)))
    }

    /// Horizontal advance of a single line of text
    pub fn line_width(&self, font_name: &str, size: f32, text: &str) -> f32 {
        let Some(font) = self.resolve(font_name) else {
            return text.chars().count() as f32 * size * FALLBACK_ADVANCE;
        };
        let scaled = font.as_scaled(PxScale::from(size));
        let mut width = 0.0;
        let mut previous = None;
        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(prev) = previous {
                width += scaled.kern(prev, id);
            }
            width += scaled.h_advance(id);
            previous = Some(id);
        }
        width
    }

    /// Distance between two baselines
    pub fn line_height(&self, font_name: &str, size: f32) -> f32 {
        match self.resolve(font_name) {
            Some(font) => {
                let scaled = font.as_scaled(PxScale::from(size));
                scaled.height() + scaled.line_gap()
            }
            None => size * FALLBACK_LINE_HEIGHT,
        }
    }

    /// Distance from the top of a line box to its baseline
    pub fn ascent(&self, font_name: &str, size: f32) -> f32 {
        match self.resolve(font_name) {
            Some(font) => font.as_scaled(PxScale::from(size)).ascent(),
            None => size * (FALLBACK_LINE_HEIGHT - 0.2),
        }
    }

    /// Append the outlines of `text` to `builder`, starting at the baseline point `origin`.
    ///
    /// Returns false when no font could be resolved, in which case nothing is appended.
    pub fn push_line(
        &self,
        builder: &mut PathBuilder,
        font_name: &str,
        size: f32,
        text: &str,
        origin: Pos2,
    ) -> bool {
        let Some(font) = self.resolve(font_name) else {
            warn!("no font available for `{font_name}`, skipping glyphs");
            return false;
        };
        let scaled = font.as_scaled(PxScale::from(size));
        let factor = scaled.scale_factor();

        let mut pen_x = origin.x;
        let mut previous = None;
        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(prev) = previous {
                pen_x += scaled.kern(prev, id);
            }
            if let Some(outline) = font.outline(id) {
                let map = |p: ab_glyph::Point| {
                    (pen_x + p.x * factor.horizontal, origin.y - p.y * factor.vertical)
                };
                let mut pen: Option<(f32, f32)> = None;
                for curve in &outline.curves {
                    let (start, end) = match curve {
                        OutlineCurve::Line(a, b) => (map(*a), map(*b)),
                        OutlineCurve::Quad(a, _, b) => (map(*a), map(*b)),
                        OutlineCurve::Cubic(a, _, _, b) => (map(*a), map(*b)),
                    };
                    if pen != Some(start) {
                        if pen.is_some() {
                            builder.close();
                        }
                        builder.move_to(start.0, start.1);
                    }
                    match curve {
                        OutlineCurve::Line(_, _) => builder.line_to(end.0, end.1),
                        OutlineCurve::Quad(_, c1, _) => {
                            let c1 = map(*c1);
                            builder.quad_to(c1.0, c1.1, end.0, end.1);
                        }
                        OutlineCurve::Cubic(_, c1, c2, _) => {
                            let (c1, c2) = (map(*c1), map(*c2));
                            builder.cubic_to(c1.0, c1.1, c2.0, c2.1, end.0, end.1);
                        }
                    }
                    pen = Some(end);
                }
                if pen.is_some() {
                    builder.close();
                }
            }
            pen_x += scaled.h_advance(id);
            previous = Some(id);
        }
        true
    }
}

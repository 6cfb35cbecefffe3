//! Line breaking and auto-sizing of label text.

use egui::{Vec2, vec2};
use serde::{Deserialize, Serialize};

use crate::render::FontBook;

/// Space between the frame edge and the text, in unscaled points
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Insets {
    pub top: f32,
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
}

impl Insets {
    pub fn uniform(inset: f32) -> Self {
        Self {
            top: inset,
            left: inset,
            bottom: inset,
            right: inset,
        }
    }

    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }
}

/// Text placement of one label at scale 1
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    pub font_size: f32,
    pub lines: Vec<String>,
    pub line_widths: Vec<f32>,
    pub line_height: f32,
    /// Frame size, insets included
    pub size: Vec2,
}

/// What a layout is computed from
#[derive(Debug, Clone, Copy)]
pub struct LayoutRequest<'a> {
    pub text: &'a str,
    pub font_name: &'a str,
    pub font_size: f32,
    pub min_font_size: f32,
    pub insets: Insets,
    /// Frame width to fit the text into; `None` sizes the frame to the text
    pub fit_width: Option<f32>,
}

/// Lay out `request.text`.
///
/// With a fit width the font shrinks (not below the minimum) until the widest
/// line fits, and words wrap if it still does not. Otherwise the frame grows
/// to the text and only explicit newlines break lines.
pub fn layout_text(fonts: &FontBook, request: &LayoutRequest<'_>) -> TextLayout {
    let font_name = request.font_name;
    let min_size = request.min_font_size.max(1.0);
    let configured = request.font_size.max(min_size);
    let paragraphs: Vec<&str> = request.text.split('\n').collect();

    let (font_size, lines, frame_width) = match request.fit_width {
        Some(fit_width) => {
            let available = (fit_width - request.insets.horizontal()).max(1.0);
            let widest_at_unit = paragraphs
                .iter()
                .map(|line| fonts.line_width(font_name, 1.0, line))
                .fold(0.0_f32, f32::max);
            let font_size = if widest_at_unit > 0.0 {
                (available / widest_at_unit).clamp(min_size, configured)
            } else {
                configured
            };
            let lines: Vec<String> = paragraphs
                .iter()
                .flat_map(|line| wrap_line(fonts, font_name, font_size, line, available))
                .collect();
            (font_size, lines, Some(fit_width))
        }
        None => (
            configured,
            paragraphs.iter().map(|line| (*line).to_owned()).collect(),
            None,
        ),
    };

    let line_widths: Vec<f32> = lines
        .iter()
        .map(|line: &String| fonts.line_width(font_name, font_size, line))
        .collect();
    let line_height = fonts.line_height(font_name, font_size);
    let content_width = line_widths
        .iter()
        .copied()
        .fold(0.0_f32, f32::max)
        .max(font_size * 0.5);
    let width = frame_width.unwrap_or(content_width + request.insets.horizontal());
    let height = line_height * lines.len() as f32 + request.insets.vertical();

    TextLayout {
        font_size,
        lines,
        line_widths,
        line_height,
        size: vec2(width, height),
    }
}

const WRAP_TOLERANCE: f32 = 1e-3;

/// Greedy word wrap; a single word wider than `max_width` keeps its own line
pub fn wrap_line(
    fonts: &FontBook,
    font_name: &str,
    font_size: f32,
    line: &str,
    max_width: f32,
) -> Vec<String> {
    let max_width = max_width + WRAP_TOLERANCE;
    if fonts.line_width(font_name, font_size, line) <= max_width {
        return vec![line.to_owned()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    for word in line.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate = format!("{current} {word}");
        if fonts.line_width(font_name, font_size, &candidate) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    lines.push(current);
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{FALLBACK_ADVANCE, FALLBACK_LINE_HEIGHT};

    fn request(text: &str, fit_width: Option<f32>) -> LayoutRequest<'_> {
        LayoutRequest {
            text,
            font_name: "Helvetica",
            font_size: 20.0,
            min_font_size: 8.0,
            insets: Insets::default(),
            fit_width,
        }
    }

    #[test]
    fn free_layout_grows_with_the_text() {
        let fonts = FontBook::empty();
        let layout = layout_text(&fonts, &request("abcd\nab", None));
        assert_eq!(layout.lines, vec!["abcd", "ab"]);
        assert!((layout.size.x - 4.0 * 20.0 * FALLBACK_ADVANCE).abs() < 1e-3);
        assert!((layout.size.y - 2.0 * 20.0 * FALLBACK_LINE_HEIGHT).abs() < 1e-3);
    }

    #[test]
    fn fit_width_shrinks_the_font() {
        let fonts = FontBook::empty();
        // ten glyphs at 20pt need 110pt; 55pt halves the size
        let layout = layout_text(&fonts, &request("abcdefghij", Some(55.0)));
        assert!((layout.font_size - 10.0).abs() < 1e-3);
        assert_eq!(layout.size.x, 55.0);
        assert_eq!(layout.lines.len(), 1);
    }

    #[test]
    fn fit_width_never_grows_past_the_configured_size() {
        let fonts = FontBook::empty();
        let layout = layout_text(&fonts, &request("ab", Some(300.0)));
        assert_eq!(layout.font_size, 20.0);
    }

    #[test]
    fn words_wrap_below_the_minimum_size() {
        let fonts = FontBook::empty();
        let text = "aaaa bbbb cccc dddd eeee ffff";
        let layout = layout_text(&fonts, &request(text, Some(40.0)));
        assert_eq!(layout.font_size, 8.0);
        assert!(layout.lines.len() > 1);
        assert!(layout.line_widths.iter().all(|w| *w <= 40.0 + 1e-3));
    }
}

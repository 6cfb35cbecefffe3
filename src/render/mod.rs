//! Rasterization onto `tiny_skia` pixmaps and conversion to `image` buffers.

mod font;

use egui::{Color32, Pos2};
use image::RgbaImage;
use tiny_skia::{
    ColorU8, FillRule, LineCap, LineJoin, Paint, Path, PathBuilder, Pixmap, PixmapPaint, Stroke,
    StrokeDash, Transform,
};

use crate::error::{RenderError, RenderResult};

pub use font::{DEFAULT_FONT_NAME, FALLBACK_ADVANCE, FALLBACK_LINE_HEIGHT, FontBook};

/// An offscreen render target with a current user-space transform
pub struct Canvas {
    pixmap: Pixmap,
    transform: Transform,
}

impl std::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canvas")
            .field("width", &self.pixmap.width())
            .field("height", &self.pixmap.height())
            .field("transform", &self.transform)
            .finish()
    }
}

impl Canvas {
    /// Allocate a transparent canvas.
    ///
    /// Fails instead of producing a blank result when the target cannot be allocated.
    pub fn new(width: u32, height: u32) -> RenderResult<Self> {
        let pixmap = Pixmap::new(width, height)
            .ok_or(RenderError::AllocationFailed { width, height })?;
        Ok(Self {
            pixmap,
            transform: Transform::identity(),
        })
    }

    /// Continue drawing onto an existing pixmap
    pub fn from_pixmap(pixmap: Pixmap) -> Self {
        Self {
            pixmap,
            transform: Transform::identity(),
        }
    }

    /// Allocate a canvas and copy `image` into it, top-left aligned
    pub fn with_background(image: &RgbaImage, width: u32, height: u32) -> RenderResult<Self> {
        let mut canvas = Self::new(width, height)?;
        let pixels = canvas.pixmap.pixels_mut();
        for (x, y, px) in image.enumerate_pixels() {
            if x < width && y < height {
                let [r, g, b, a] = px.0;
                pixels[(y * width + x) as usize] = ColorU8::from_rgba(r, g, b, a).premultiply();
            }
        }
        Ok(canvas)
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    /// Run `f` with `local` applied on top of the current transform
    pub fn with_transform<R>(&mut self, local: Transform, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = self.transform;
        self.transform = saved.pre_concat(local);
        let result = f(self);
        self.transform = saved;
        result
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn clear(&mut self) {
        self.pixmap.fill(tiny_skia::Color::TRANSPARENT);
    }

    /// Stroke `path` with round caps and joins
    pub fn stroke_path(&mut self, path: &Path, color: Color32, width: f32, dashed: bool) {
        let paint = paint_for(color);
        let mut stroke = Stroke {
            width,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Default::default()
        };
        if dashed {
            stroke.line_cap = LineCap::Butt;
            stroke.dash = StrokeDash::new(vec![width * 2.0, width * 2.0], 0.0);
        }
        self.pixmap
            .stroke_path(path, &paint, &stroke, self.transform, None);
    }

    pub fn fill_path(&mut self, path: &Path, color: Color32) {
        let paint = paint_for(color);
        self.pixmap
            .fill_path(path, &paint, FillRule::Winding, self.transform, None);
    }

    pub fn fill_circle(&mut self, center: Pos2, radius: f32, color: Color32) {
        let Some(path) = PathBuilder::from_circle(center.x, center.y, radius.max(0.01)) else {
            return;
        };
        self.fill_path(&path, color);
    }

    /// Composite another pixmap over this one with no transform
    pub fn draw_pixmap(&mut self, source: &Pixmap) {
        self.pixmap.draw_pixmap(
            0,
            0,
            source.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }

    /// Unpremultiply into an `image` buffer
    pub fn into_image(self) -> RenderResult<RgbaImage> {
        pixmap_to_image(&self.pixmap)
    }

    pub fn into_pixmap(self) -> Pixmap {
        self.pixmap
    }
}

pub fn pixmap_to_image(pixmap: &Pixmap) -> RenderResult<RgbaImage> {
    let (width, height) = (pixmap.width(), pixmap.height());
    let mut raw = Vec::with_capacity(pixmap.pixels().len() * 4);
    for px in pixmap.pixels() {
        let c = px.demultiply();
        raw.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    RgbaImage::from_raw(width, height, raw).ok_or(RenderError::ImageBuffer { width, height })
}

fn paint_for(color: Color32) -> Paint<'static> {
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = true;
    paint
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sized_canvas_is_an_error() {
        assert!(matches!(
            Canvas::new(0, 10),
            Err(RenderError::AllocationFailed { width: 0, height: 10 })
        ));
    }

    #[test]
    fn background_round_trips_through_premultiplication() {
        let image = RgbaImage::from_pixel(4, 3, image::Rgba([200, 100, 50, 255]));
        let canvas = Canvas::with_background(&image, 6, 5).unwrap();
        let out = canvas.into_image().unwrap();
        assert_eq!(out.dimensions(), (6, 5));
        assert_eq!(out.get_pixel(0, 0).0, [200, 100, 50, 255]);
        assert_eq!(out.get_pixel(5, 4).0[3], 0);
    }

    #[test]
    fn filled_circle_marks_pixels() {
        let mut canvas = Canvas::new(20, 20).unwrap();
        canvas.fill_circle(egui::pos2(10.0, 10.0), 4.0, Color32::RED);
        let out = canvas.into_image().unwrap();
        assert_eq!(out.get_pixel(10, 10).0, [255, 0, 0, 255]);
        assert_eq!(out.get_pixel(0, 0).0[3], 0);
    }
}

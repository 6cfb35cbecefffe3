use egui::{Pos2, Rect, Vec2, pos2, vec2};
use log::warn;

/// Canonical reference window (portrait phone, in points) that serialized
/// coordinates are expressed in.
pub const REFERENCE_SIZE: Vec2 = vec2(375.0, 667.0);

/// `min(view_width / 375, view_height / 667)`: the aspect-fit ratio of the
/// reference window inside a view of the given size.
pub fn compute_ratio(view_width: f32, view_height: f32) -> f32 {
    NormalizationRatio::compute(view_width, view_height).value()
}

/// Scalar relating live view points to the reference window.
///
/// Serializing divides geometry by the ratio (view → reference), deserializing
/// multiplies it back (reference → view).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizationRatio(f32);

impl Default for NormalizationRatio {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl NormalizationRatio {
    pub const IDENTITY: Self = Self(1.0);

    pub fn compute(view_width: f32, view_height: f32) -> Self {
        Self::compute_against(vec2(view_width, view_height), REFERENCE_SIZE)
    }

    pub fn compute_against(view: Vec2, reference: Vec2) -> Self {
        let ratio = (view.x / reference.x).min(view.y / reference.y);
        Self::new(ratio)
    }

    /// Wrap a raw ratio, falling back to identity for non-positive or non-finite values
    pub fn new(ratio: f32) -> Self {
        if ratio.is_finite() && ratio > 0.0 {
            Self(ratio)
        } else {
            warn!("degenerate normalization ratio {ratio}, using 1.0");
            Self::IDENTITY
        }
    }

    pub fn value(self) -> f32 {
        self.0
    }

    pub fn to_reference_point(self, point: Pos2) -> Pos2 {
        pos2(point.x / self.0, point.y / self.0)
    }

    pub fn from_reference_point(self, point: Pos2) -> Pos2 {
        pos2(point.x * self.0, point.y * self.0)
    }

    pub fn to_reference_len(self, len: f32) -> f32 {
        len / self.0
    }

    pub fn from_reference_len(self, len: f32) -> f32 {
        len * self.0
    }
}

/// Where a background image is displayed inside its container.
///
/// `image_size` is in pixels, `frame` in container points. This is what the
/// background-image provider hands to the compositor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImageFrame {
    pub image_size: Vec2,
    pub frame: Rect,
}

impl ImageFrame {
    pub fn new(image_size: Vec2, frame: Rect) -> Self {
        Self { image_size, frame }
    }

    /// Frame of an image scaled to fit (preserving aspect) and centered in `container`
    pub fn aspect_fit(image_size: Vec2, container: Vec2) -> Self {
        if image_size.x <= 0.0 || image_size.y <= 0.0 {
            return Self::new(image_size, Rect::from_min_size(Pos2::ZERO, container));
        }

        let scale = (container.x / image_size.x).min(container.y / image_size.y);
        let displayed = image_size * scale;
        let min = pos2(
            (container.x - displayed.x) / 2.0,
            (container.y - displayed.y) / 2.0,
        );
        Self::new(image_size, Rect::from_min_size(min, displayed))
    }

    /// Pixels per container point of the displayed image
    pub fn output_scale(&self) -> f32 {
        let width = self.frame.width();
        if width > 0.0 && self.image_size.x > 0.0 {
            self.image_size.x / width
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_device_is_identity() {
        assert_eq!(compute_ratio(375.0, 667.0), 1.0);
    }

    #[test]
    fn ratio_uses_the_limiting_axis() {
        assert!((compute_ratio(750.0, 2000.0) - 2.0).abs() < 1e-6);
        assert!((compute_ratio(2000.0, 667.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn degenerate_ratio_falls_back_to_identity() {
        assert_eq!(NormalizationRatio::compute(0.0, 667.0), NormalizationRatio::IDENTITY);
        assert_eq!(NormalizationRatio::new(f32::NAN), NormalizationRatio::IDENTITY);
    }

    #[test]
    fn aspect_fit_centers_the_image() {
        let frame = ImageFrame::aspect_fit(vec2(1000.0, 500.0), vec2(200.0, 200.0));
        assert_eq!(frame.frame.min, pos2(0.0, 50.0));
        assert_eq!(frame.frame.size(), vec2(200.0, 100.0));
        assert!((frame.output_scale() - 5.0).abs() < 1e-6);
    }
}

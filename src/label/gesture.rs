use egui::{Pos2, Vec2};

/// Placement of a label in the view: where its center sits, how much it is
/// scaled and how far it is rotated (radians, clockwise on screen)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelTransform {
    pub center: Pos2,
    pub scale: f32,
    pub rotation: f32,
}

impl LabelTransform {
    pub fn at(center: Pos2) -> Self {
        Self {
            center,
            scale: 1.0,
            rotation: 0.0,
        }
    }
}

/// One pan/pinch/rotate interaction on the selected label.
///
/// Each recognizer reports its value relative to the start of the gesture,
/// and the result is always recomputed from the transform captured when the
/// session began. Pinch and rotate therefore combine the same way whatever
/// order their updates arrive in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureSession {
    start: LabelTransform,
    translation: Vec2,
    scale_factor: f32,
    rotation: f32,
    min_scale: f32,
}

impl GestureSession {
    pub fn begin(start: LabelTransform, min_scale: f32) -> Self {
        Self {
            start,
            translation: Vec2::ZERO,
            scale_factor: 1.0,
            rotation: 0.0,
            min_scale: min_scale.max(f32::EPSILON),
        }
    }

    pub fn start(&self) -> LabelTransform {
        self.start
    }

    /// Total pan translation since the gesture began
    pub fn pan(&mut self, translation: Vec2) {
        if translation.is_finite() {
            self.translation = translation;
        }
    }

    /// Total pinch factor since the gesture began
    pub fn pinch(&mut self, scale_factor: f32) {
        if scale_factor.is_finite() && scale_factor > 0.0 {
            self.scale_factor = scale_factor;
        }
    }

    /// Total rotation since the gesture began
    pub fn rotate(&mut self, angle: f32) {
        if angle.is_finite() {
            self.rotation = angle;
        }
    }

    pub fn current(&self) -> LabelTransform {
        LabelTransform {
            center: self.start.center + self.translation,
            scale: (self.start.scale * self.scale_factor).max(self.min_scale),
            rotation: self.start.rotation + self.rotation,
        }
    }
}

#[cfg(test)]
mod tests {
    use egui::{pos2, vec2};

    use super::*;

    #[test]
    fn deltas_apply_to_the_captured_start() {
        let start = LabelTransform {
            center: pos2(10.0, 10.0),
            scale: 2.0,
            rotation: 0.5,
        };
        let mut session = GestureSession::begin(start, 0.2);
        session.pinch(1.5);
        session.pinch(1.25);
        session.pan(vec2(5.0, -5.0));

        let current = session.current();
        assert_eq!(current.scale, 2.5);
        assert_eq!(current.center, pos2(15.0, 5.0));
        assert_eq!(current.rotation, 0.5);
    }

    #[test]
    fn scale_is_clamped_to_the_minimum() {
        let mut session = GestureSession::begin(LabelTransform::at(Pos2::ZERO), 0.2);
        session.pinch(0.01);
        assert_eq!(session.current().scale, 0.2);
        session.pinch(-1.0);
        assert_eq!(session.current().scale, 0.2);
    }
}

use egui::emath::Rot2;
use egui::{Pos2, Rect, pos2};

/// Bounding box of a set of points, expanded on every side by `padding`
pub fn bounds_of(points: &[Pos2], padding: f32) -> Rect {
    if points.is_empty() {
        return Rect::NOTHING;
    }

    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;

    for point in points {
        min_x = min_x.min(point.x);
        min_y = min_y.min(point.y);
        max_x = max_x.max(point.x);
        max_y = max_y.max(point.y);
    }

    Rect::from_min_max(
        pos2(min_x - padding, min_y - padding),
        pos2(max_x + padding, max_y + padding),
    )
}

/// Map a view-space point back into an object's unrotated, unscaled frame.
///
/// The object is drawn as `center + rotation * (scale * (local - reference_center))`;
/// this is the inverse of that mapping. `scale` must be non-zero.
pub fn to_local_point(
    point: Pos2,
    center: Pos2,
    rotation: Rot2,
    scale: f32,
    reference_center: Pos2,
) -> Pos2 {
    let unrotated = rotation.inverse() * (point - center);
    reference_center + unrotated / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_include_padding() {
        let rect = bounds_of(&[pos2(10.0, 10.0), pos2(20.0, 30.0)], 2.0);
        assert_eq!(rect.min, pos2(8.0, 8.0));
        assert_eq!(rect.max, pos2(22.0, 32.0));
        assert_eq!(bounds_of(&[], 1.0), Rect::NOTHING);
    }

    #[test]
    fn local_point_undoes_rotation_and_scale() {
        let center = pos2(100.0, 100.0);
        let reference_center = pos2(50.0, 50.0);
        let rotation = Rot2::from_angle(std::f32::consts::FRAC_PI_2);
        let local = pos2(60.0, 50.0);

        let view = center + rotation * ((local - reference_center) * 2.0);
        let back = to_local_point(view, center, rotation, 2.0, reference_center);
        assert!((back - local).length() < 1e-4);
    }
}

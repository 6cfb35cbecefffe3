use egui::{Color32, Pos2, pos2};
use markup_paint::{
    DrawableObject, MarkupConfig, SmoothingConfig, StrokeError, StrokeSegment, StrokeSmoother,
    StrokeStyle,
};
use markup_paint::surface::DrawingSurface;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// Points along a gentle curve, 10pt apart, so none are dropped as jitter
fn curve(count: usize) -> Vec<Pos2> {
    (0..count)
        .map(|i| {
            let x = i as f32 * 10.0;
            pos2(20.0 + x, 100.0 + (x / 40.0).sin() * 15.0)
        })
        .collect()
}

fn style() -> StrokeStyle {
    StrokeStyle {
        color: Color32::RED,
        width: 6.0,
        ..StrokeStyle::default()
    }
}

// Feed begin + moves and collect the segments emitted while moving
fn feed_moves(smoother: &mut StrokeSmoother, points: &[Pos2]) -> Vec<StrokeSegment> {
    smoother.begin(points[0], style()).unwrap();
    points[1..]
        .iter()
        .filter_map(|p| smoother.move_to(*p).unwrap())
        .collect()
}

#[test]
fn test_segment_count_is_point_count_minus_three() {
    init();
    for count in [4, 5, 9, 30] {
        let mut smoother = StrokeSmoother::new(SmoothingConfig::default());
        let segments = feed_moves(&mut smoother, &curve(count));
        assert_eq!(segments.len(), count - 3, "for {count} points");
        assert_eq!(smoother.accepted_points(), count);
    }
}

#[test]
fn test_consecutive_segments_share_endpoints() {
    init();
    let mut smoother = StrokeSmoother::new(SmoothingConfig::default());
    let mut segments = feed_moves(&mut smoother, &curve(12));
    let closed = smoother.end(pos2(200.0, 140.0)).unwrap();
    let head = closed.head.unwrap();
    assert_eq!(head.start(), curve(12)[0]);
    segments.insert(0, head);
    segments.extend(closed.tail);

    for pair in segments.windows(2) {
        assert_eq!(pair[0].end(), pair[1].start());
        // widths continue across the joint as well
        assert_eq!(pair[0].end_width(), pair[1].start_width());
    }
}

#[test]
fn test_end_adds_a_closing_segment() {
    init();
    let points = curve(6);
    let mut smoother = StrokeSmoother::new(SmoothingConfig::default());
    let during = feed_moves(&mut smoother, &points[..5]);
    let closed = smoother.end(points[5]).unwrap();

    // the last point completes one more window, then the stroke is closed
    assert_eq!(during.len(), 2);
    assert_eq!(closed.tail.len(), 2);
    assert_eq!(closed.tail.last().unwrap().end(), points[5]);
    assert_eq!(closed.head.map(|head| head.end()), Some(points[1]));
    assert!(!smoother.is_active());
}

#[test]
fn test_tap_produces_exactly_one_dot() {
    init();
    let mut smoother = StrokeSmoother::new(SmoothingConfig::default());
    smoother.begin(pos2(50.0, 50.0), style()).unwrap();
    let closed = smoother.end(pos2(50.0, 50.0)).unwrap();

    assert_eq!(closed.len(), 1);
    assert!(closed.head.is_none());
    let dot = &closed.tail[0];
    assert!(dot.is_dot());
    assert_eq!(dot.start(), pos2(50.0, 50.0));
    assert_eq!(dot.control_points(), (pos2(50.0, 50.0), pos2(50.0, 50.0)));
    assert_eq!(dot.start_width(), 6.0);
}

#[test]
fn test_short_stroke_collapses_into_a_dot() {
    init();
    let points = curve(3);
    let mut smoother = StrokeSmoother::new(SmoothingConfig::default());
    assert!(feed_moves(&mut smoother, &points[..2]).is_empty());
    let closed = smoother.end(points[2]).unwrap();

    assert!(closed.head.is_none());
    assert_eq!(closed.tail.len(), 1);
    assert!(closed.tail[0].is_dot());
    assert_eq!(closed.tail[0].start(), points[0]);
}

#[test]
fn test_jitter_below_threshold_is_dropped() {
    init();
    let mut smoother = StrokeSmoother::new(SmoothingConfig::default());
    smoother.begin(pos2(10.0, 10.0), style()).unwrap();
    for i in 0..20 {
        let wobble = if i % 2 == 0 { 0.5 } else { -0.5 };
        assert!(smoother.move_to(pos2(10.0 + wobble, 10.0)).unwrap().is_none());
    }
    assert_eq!(smoother.accepted_points(), 1);
}

#[test]
fn test_constant_width_keeps_base_width() {
    init();
    let mut smoother = StrokeSmoother::new(SmoothingConfig::default());
    let constant = StrokeStyle {
        constant_width: true,
        ..style()
    };
    smoother.begin(pos2(0.0, 0.0), constant).unwrap();
    let mut segments = Vec::new();
    for i in 1..10 {
        // wildly varying speed
        let x = (i * i) as f32 * 7.0;
        segments.extend(smoother.move_to(pos2(x, 0.0)).unwrap());
    }
    assert!(!segments.is_empty());
    for segment in &segments {
        assert_eq!(segment.start_width(), 6.0);
        assert_eq!(segment.end_width(), 6.0);
        assert!(segment.is_constant_width());
    }
}

#[test]
fn test_variable_width_stays_within_bounds() {
    init();
    let config = SmoothingConfig::default();
    let mut smoother = StrokeSmoother::new(config.clone());
    let points: Vec<Pos2> = (0..25)
        .map(|i| pos2((i * i) as f32 * 3.0, (i as f32 * 0.7).cos() * 20.0))
        .collect();
    let segments = feed_moves(&mut smoother, &points);

    let min = 6.0 * config.min_relative_width - 1e-4;
    for segment in &segments {
        for width in [segment.start_width(), segment.end_width()] {
            assert!((min..=6.0 + 1e-4).contains(&width), "width {width} out of range");
        }
    }
}

#[test]
fn test_out_of_order_calls_are_rejected() {
    init();
    let mut smoother = StrokeSmoother::new(SmoothingConfig::default());
    assert_eq!(smoother.move_to(pos2(1.0, 1.0)), Err(StrokeError::NotStarted));
    assert_eq!(smoother.end(pos2(1.0, 1.0)), Err(StrokeError::NotStarted));
    assert!(!smoother.is_active());
}

#[test]
fn test_surface_tap_commits_a_single_dot() {
    init();
    let mut surface = DrawingSurface::new(&MarkupConfig::default());
    assert!(surface.begin_stroke(pos2(30.0, 30.0)));
    assert!(surface.end_stroke(pos2(30.0, 30.0)));

    assert_eq!(surface.committed().len(), 1);
    let batch = &surface.committed()[0];
    assert_eq!(batch.len(), 1);
    match &batch.objects()[0] {
        DrawableObject::Bezier(segment) => assert!(segment.is_dot()),
        other => panic!("expected a bezier dot, got {other:?}"),
    }
}

#[test]
fn test_surface_ignores_moves_without_begin() {
    init();
    let mut surface = DrawingSurface::new(&MarkupConfig::default());
    assert!(!surface.move_stroke(pos2(1.0, 1.0)));
    assert!(!surface.end_stroke(pos2(1.0, 1.0)));
    assert!(surface.committed().is_empty());
    assert!(!surface.is_drawing());
}

#[test]
fn test_committed_stroke_is_painted_from_its_first_point() {
    init();
    let mut surface = DrawingSurface::new(&MarkupConfig::default());
    assert!(surface.begin_stroke(pos2(10.0, 100.0)));
    for x in [60.0, 110.0, 160.0, 210.0] {
        assert!(surface.move_stroke(pos2(x, 100.0)));
    }
    assert!(surface.end_stroke(pos2(260.0, 100.0)));

    let image = surface.render([375, 667]).unwrap();
    for x in [15, 30, 45, 100, 250] {
        assert!(image.get_pixel(x, 100).0[3] > 0, "gap at x = {x}");
    }
}

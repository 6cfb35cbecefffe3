use egui::{Pos2, pos2, vec2};
use markup_paint::{
    DocumentError, DrawableObject, MarkupConfig, MarkupController, MarkupMode, NormalizationRatio,
    compute_ratio,
};
use serde_json::{Value, json};

const EPSILON: f32 = 1e-3;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn controller(view_width: f32, view_height: f32) -> MarkupController {
    let mut controller = MarkupController::new(MarkupConfig::default());
    controller.set_view_size(vec2(view_width, view_height));
    controller.setup_ratio(view_width, view_height);
    controller
}

fn draw_stroke(controller: &mut MarkupController, origin: Pos2) {
    controller.set_mode(MarkupMode::Drawing);
    controller.touch_began(origin);
    for i in 1..9 {
        let t = i as f32;
        controller.touch_moved(origin + vec2(t * 9.0, (t * 0.8).cos() * 10.0));
    }
    controller.touch_ended(origin + vec2(90.0, 0.0));
}

fn draw_line(controller: &mut MarkupController, a: Pos2, b: Pos2) {
    controller.set_mode(MarkupMode::DrawLines);
    controller.touch_began(a);
    controller.touch_ended(b);
}

fn close(a: Pos2, b: Pos2) -> bool {
    (a.x - b.x).abs() < EPSILON && (a.y - b.y).abs() < EPSILON
}

fn assert_same_object(a: &DrawableObject, b: &DrawableObject) {
    match (a, b) {
        (DrawableObject::Bezier(a), DrawableObject::Bezier(b)) => {
            assert!(close(a.start(), b.start()));
            assert!(close(a.end(), b.end()));
            assert!(close(a.control_points().0, b.control_points().0));
            assert!(close(a.control_points().1, b.control_points().1));
            assert!((a.start_width() - b.start_width()).abs() < EPSILON);
            assert!((a.end_width() - b.end_width()).abs() < EPSILON);
            assert_eq!(a.color(), b.color());
            assert_eq!(a.is_dashed(), b.is_dashed());
            assert_eq!(a.is_constant_width(), b.is_constant_width());
        }
        (DrawableObject::Line(a), DrawableObject::Line(b)) => {
            assert!(close(a.point_a(), b.point_a()));
            assert!(close(a.point_b(), b.point_b()));
            assert!((a.stroke_width() - b.stroke_width()).abs() < EPSILON);
            assert_eq!(a.color(), b.color());
        }
        (a, b) => panic!("object kinds differ: {a:?} vs {b:?}"),
    }
}

#[test]
fn test_reference_device_ratio_is_identity() {
    assert_eq!(compute_ratio(375.0, 667.0), 1.0);
    assert_eq!(controller(375.0, 667.0).ratio(), NormalizationRatio::IDENTITY);
}

#[test]
fn test_round_trip_reproduces_the_drawing() {
    init();
    // ratio 1.5: a non power of two, so rounding actually happens
    let mut source = controller(562.5, 1000.5);
    assert!((source.ratio().value() - 1.5).abs() < 1e-6);
    draw_stroke(&mut source, pos2(20.0, 40.0));
    draw_line(&mut source, pos2(30.0, 300.0), pos2(250.0, 320.0));
    draw_stroke(&mut source, pos2(40.0, 500.0));

    let document = source.serialize();
    let mut target = controller(562.5, 1000.5);
    let summary = target.deserialize(&document).unwrap();
    assert_eq!(summary.drawing.skipped, 0);

    let before = source.surface().committed();
    let after = target.surface().committed();
    assert_eq!(before.len(), after.len());
    for (a, b) in before.iter().zip(after) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_same_object(x, y);
        }
    }
}

#[test]
fn test_geometry_is_stored_in_reference_coordinates() {
    init();
    let mut controller = controller(750.0, 1334.0);
    draw_line(&mut controller, pos2(100.0, 200.0), pos2(300.0, 200.0));

    let document = controller.serialize();
    let line = &document["drawView"]["objects"][0];
    assert_eq!(line["type"], "line");
    assert_eq!(line["pointA"], json!({ "x": 50.0, "y": 100.0 }));
    assert_eq!(line["pointB"], json!({ "x": 150.0, "y": 100.0 }));
    assert_eq!(line["strokeWidth"], json!(2.5));
    assert_eq!(line["isDashed"], json!(false));
    assert_eq!(line["color"], json!({ "r": 0, "g": 0, "b": 0, "a": 255 }));
}

#[test]
fn test_bezier_objects_carry_all_fields() {
    init();
    let mut controller = controller(375.0, 667.0);
    draw_stroke(&mut controller, pos2(20.0, 40.0));

    let document = controller.serialize();
    let object = document["drawView"]["objects"][0].as_object().unwrap();
    for key in [
        "type",
        "color",
        "pointA",
        "pointB",
        "pointAControl",
        "pointBControl",
        "strokeStartWidth",
        "strokeEndWidth",
        "isDashed",
        "outputScaleFactor",
    ] {
        assert!(object.contains_key(key), "missing {key}");
    }
    assert_eq!(object["type"], "bezier");
    assert!(document["date"].is_number());
    assert_eq!(document["version"], 1);
}

#[test]
fn test_malformed_entries_are_skipped_individually() {
    init();
    let document = json!({
        "drawView": {
            "objects": [
                { "type": "line", "color": { "r": 255, "g": 0, "b": 0, "a": 255 },
                  "pointA": { "x": 1.0, "y": 2.0 }, "pointB": { "x": 30.0, "y": 2.0 },
                  "strokeWidth": 4.0, "isDashed": true },
                { "type": "spiral", "pointA": { "x": 1.0, "y": 2.0 } },
                { "type": "line", "pointA": { "x": 1.0, "y": 2.0 } },
                "not even an object",
                { "type": "bezier", "color": { "r": 0, "g": 0, "b": 0, "a": 255 },
                  "pointA": { "x": 0.0, "y": 0.0 }, "pointB": { "x": 10.0, "y": 0.0 },
                  "pointAControl": { "x": 3.0, "y": 1.0 }, "pointBControl": { "x": 7.0, "y": 1.0 },
                  "strokeStartWidth": 3.0, "strokeEndWidth": 2.0, "isDashed": false,
                  "outputScaleFactor": 1.0 }
            ],
            "undoArray": [ [ { "type": "unknown" } ], 42 ]
        },
        "labels": [
            { "text": "ok", "fontName": "Helvetica", "fontSize": 20.0,
              "textColor": { "r": 255, "g": 255, "b": 255, "a": 255 },
              "alignment": "left", "center": { "x": 50.0, "y": 60.0 },
              "rotation": 0.0, "scale": 1.0, "fitWidth": false },
            { "text": "no center" }
        ]
    });

    let mut controller = controller(375.0, 667.0);
    let summary = controller.deserialize(&document).unwrap();
    assert_eq!(summary.drawing.loaded, 2);
    assert_eq!(summary.drawing.skipped, 4);
    assert_eq!(summary.labels.loaded, 1);
    assert_eq!(summary.labels.skipped, 1);

    // no batch sizes: everything that loaded forms one batch
    assert_eq!(controller.surface().committed().len(), 1);
    assert_eq!(controller.surface().object_count(), 2);
    assert!(!controller.surface().can_redo());
    assert_eq!(controller.overlay().labels()[0].text(), "ok");
}

#[test]
fn test_undo_granularity_and_redo_stack_survive() {
    init();
    let mut source = controller(375.0, 667.0);
    draw_stroke(&mut source, pos2(20.0, 40.0));
    draw_line(&mut source, pos2(30.0, 300.0), pos2(250.0, 320.0));
    draw_stroke(&mut source, pos2(40.0, 500.0));
    source.undo_drawing();

    let mut target = controller(375.0, 667.0);
    target.from_json_str(&source.to_json_string().unwrap()).unwrap();
    assert_eq!(target.surface().committed().len(), 2);
    assert!(target.can_redo_drawing());

    assert!(target.redo_drawing());
    assert_eq!(target.surface().committed().len(), 3);
    assert!(target.undo_drawing());
    assert!(target.undo_drawing());
    assert_eq!(target.surface().committed().len(), 1);
    assert_eq!(target.surface().committed(), &source.surface().committed()[..1]);
}

#[test]
fn test_inconsistent_batch_sizes_load_as_one_batch() {
    init();
    let mut source = controller(375.0, 667.0);
    draw_line(&mut source, pos2(10.0, 10.0), pos2(100.0, 10.0));
    draw_line(&mut source, pos2(10.0, 50.0), pos2(100.0, 50.0));
    let mut document = source.serialize();
    document["drawView"]["batchSizes"] = json!([7]);

    let mut target = controller(375.0, 667.0);
    target.deserialize(&document).unwrap();
    assert_eq!(target.surface().committed().len(), 1);
    assert_eq!(target.surface().object_count(), 2);
}

#[test]
fn test_labels_round_trip() {
    init();
    let mut source = controller(562.5, 1000.5);
    source.set_mode(MarkupMode::Text);
    source.tap(pos2(200.0, 300.0));
    source.set_text("Hello there");
    source.finish_editing();
    source.begin_label_gesture();
    source.pinch_label(1.4);
    source.rotate_label(0.3);
    source.end_label_gesture();

    let document = source.serialize();
    let record = &document["labels"][0];
    assert_eq!(record["text"], "Hello there");
    assert_eq!(record["fontName"], "Helvetica");
    assert!((record["fontSize"].as_f64().unwrap() - 24.0).abs() < 1e-3);

    let mut target = controller(562.5, 1000.5);
    target.deserialize(&document).unwrap();
    let a = &source.overlay().labels()[0];
    let b = &target.overlay().labels()[0];
    assert_eq!(a.text(), b.text());
    assert!(close(a.center(), b.center()));
    assert!((a.scale() - b.scale()).abs() < 1e-5);
    assert!((a.rotation() - b.rotation()).abs() < 1e-5);
    assert!((a.unscaled_font_size() - b.unscaled_font_size()).abs() < EPSILON);
    assert_eq!(a.color(), b.color());
    assert_eq!(a.alignment(), b.alignment());
    assert!(!b.is_selected());
}

#[test]
fn test_loading_replaces_the_current_document() {
    init();
    let mut controller = controller(375.0, 667.0);
    draw_stroke(&mut controller, pos2(20.0, 40.0));
    controller
        .deserialize(&json!({ "drawView": { "objects": [] }, "labels": [] }))
        .unwrap();
    assert_eq!(controller.surface().object_count(), 0);
    assert!(!controller.can_undo_drawing());
}

#[test]
fn test_unusable_root_is_an_error() {
    init();
    let mut controller = controller(375.0, 667.0);
    assert!(matches!(
        controller.deserialize(&Value::Array(Vec::new())),
        Err(DocumentError::NotAnObject)
    ));
    assert!(matches!(
        controller.from_json_str("{ broken"),
        Err(DocumentError::Json(_))
    ));
}

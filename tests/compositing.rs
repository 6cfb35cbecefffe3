use egui::{Pos2, pos2, vec2};
use image::{Rgba, RgbaImage};
use markup_paint::{MarkupConfig, MarkupController, MarkupMode, RenderError};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn draw_line(controller: &mut MarkupController, a: Pos2, b: Pos2) {
    controller.set_mode(MarkupMode::DrawLines);
    assert!(controller.touch_began(a));
    assert!(controller.touch_ended(b));
}

fn solid(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba(color))
}

#[test]
fn test_output_is_the_componentwise_maximum() {
    init();
    let controller = MarkupController::new(MarkupConfig::default());
    let cases = [
        ((200, 800), (375, 800)),
        ((1000, 100), (1000, 667)),
        ((100, 100), (375, 667)),
        ((2000, 3000), (2000, 3000)),
    ];
    for ((w, h), expected) in cases {
        let output = controller.draw_on_image(&solid(w, h, [255, 255, 255, 255])).unwrap();
        assert_eq!(output.dimensions(), expected, "for a {w}x{h} image");
    }
}

#[test]
fn test_background_is_kept_and_strokes_drawn_on_top() {
    init();
    let mut controller = MarkupController::new(MarkupConfig::default());
    draw_line(&mut controller, pos2(10.0, 10.0), pos2(200.0, 10.0));

    let output = controller.draw_on_image(&solid(375, 667, [255, 0, 0, 255])).unwrap();
    assert_eq!(output.get_pixel(300, 300).0, [255, 0, 0, 255]);
    assert_eq!(output.get_pixel(100, 10).0, [0, 0, 0, 255]);
}

#[test]
fn test_area_outside_a_small_image_stays_transparent() {
    init();
    let controller = MarkupController::new(MarkupConfig::default());
    let output = controller.draw_on_image(&solid(100, 100, [0, 0, 255, 255])).unwrap();
    assert_eq!(output.get_pixel(50, 50).0, [0, 0, 255, 255]);
    assert_eq!(output.get_pixel(200, 200).0[3], 0);
}

#[test]
fn test_strokes_scale_to_the_image_resolution() {
    init();
    let mut controller = MarkupController::new(MarkupConfig::default());
    // a 750x1334 photo shown aspect-fit in a 375x667 view: two pixels per point
    controller.setup_for_image(vec2(750.0, 1334.0), vec2(375.0, 667.0));
    assert_eq!(controller.surface().output_scale_factor(), 2.0);
    draw_line(&mut controller, pos2(10.0, 10.0), pos2(200.0, 10.0));

    let output = controller.draw_on_image(&solid(750, 1334, [255, 255, 255, 255])).unwrap();
    assert_eq!(output.dimensions(), (750, 1334));
    // the 5pt line at y = 10pt lands 10px wide at y = 20px
    assert_eq!(output.get_pixel(300, 20).0, [0, 0, 0, 255]);
    assert_eq!(output.get_pixel(300, 27).0, [255, 255, 255, 255]);
    assert_eq!(output.get_pixel(300, 10).0, [255, 255, 255, 255]);
}

fn first_dark_row(image: &RgbaImage, x: u32) -> Option<u32> {
    (0..image.height()).find(|&y| image.get_pixel(x, y).0[0] < 128)
}

#[test]
fn test_loaded_drawing_lands_on_the_same_pixels_on_another_device() {
    init();
    let photo = solid(750, 1334, [255, 255, 255, 255]);

    // drawn with the photo shown at half size
    let mut phone = MarkupController::new(MarkupConfig::default());
    phone.setup_for_image(vec2(750.0, 1334.0), vec2(375.0, 667.0));
    draw_line(&mut phone, pos2(10.0, 10.0), pos2(200.0, 10.0));
    let document = phone.serialize();

    // loaded where the photo is shown at full size
    let mut tablet = MarkupController::new(MarkupConfig::default());
    tablet.setup_for_image(vec2(750.0, 1334.0), vec2(750.0, 1334.0));
    tablet.deserialize(&document).unwrap();

    let drawn = phone.draw_on_image(&photo).unwrap();
    let loaded = tablet.draw_on_image(&photo).unwrap();
    assert_eq!(loaded.dimensions(), (750, 1334));
    assert_eq!(first_dark_row(&drawn, 300), Some(15));
    assert_eq!(first_dark_row(&loaded, 300), Some(15));
    assert_eq!(loaded.get_pixel(300, 20).0, [0, 0, 0, 255]);
    assert_eq!(loaded.get_pixel(300, 30).0, [255, 255, 255, 255]);
}

#[test]
fn test_letterboxed_image_is_aligned_to_its_frame() {
    init();
    let mut controller = MarkupController::new(MarkupConfig::default());
    // a square image in a tall view is shown 375x375 starting at y = 146pt
    controller.setup_for_image(vec2(375.0, 375.0), vec2(375.0, 667.0));
    let frame = controller.image_frame().unwrap().frame;
    assert_eq!(frame.min, pos2(0.0, 146.0));

    draw_line(&mut controller, pos2(10.0, 156.0), pos2(200.0, 156.0));
    let output = controller.draw_on_image(&solid(375, 375, [255, 255, 255, 255])).unwrap();
    assert_eq!(output.get_pixel(100, 10).0, [0, 0, 0, 255]);
}

#[test]
fn test_labels_are_composited() {
    init();
    let mut config = MarkupConfig::default();
    config.text.background_white = 1.0;
    config.text.background_alpha = 1.0;
    let mut controller = MarkupController::new(config);
    controller.set_mode(MarkupMode::Text);
    controller.tap(pos2(100.0, 100.0)).unwrap();
    controller.set_text("boxed");
    controller.finish_editing();

    let output = controller.draw_on_image(&solid(375, 667, [0, 0, 0, 255])).unwrap();
    assert_eq!(output.get_pixel(100, 100).0, [255, 255, 255, 255]);
    assert_eq!(output.get_pixel(100, 300).0, [0, 0, 0, 255]);
}

#[test]
fn test_label_glyphs_are_drawn_with_the_bundled_font() {
    init();
    let mut controller = MarkupController::new(MarkupConfig::default());
    controller.set_mode(MarkupMode::Text);
    controller.tap(pos2(187.0, 300.0)).unwrap();
    controller.set_text("HELLO WORLD");
    controller.finish_editing();

    let output = controller.draw_on_image(&solid(375, 667, [0, 0, 0, 255])).unwrap();
    let lit = output.pixels().filter(|p| p.0[0] > 128).count();
    assert!(lit > 100, "only {lit} glyph pixels");
    // nothing is painted far from the label
    assert_eq!(output.get_pixel(187, 600).0, [0, 0, 0, 255]);
}

#[test]
fn test_render_with_size_scales_strokes_and_labels() {
    init();
    let mut config = MarkupConfig::default();
    config.text.background_white = 1.0;
    config.text.background_alpha = 1.0;
    let mut controller = MarkupController::new(config);
    draw_line(&mut controller, pos2(10.0, 10.0), pos2(200.0, 10.0));
    controller.set_mode(MarkupMode::Text);
    controller.tap(pos2(100.0, 300.0)).unwrap();

    let output = controller.render_with_size([750, 1334]).unwrap();
    assert_eq!(output.dimensions(), (750, 1334));
    assert_eq!(output.get_pixel(200, 20).0, [0, 0, 0, 255]);
    assert_eq!(output.get_pixel(200, 600).0, [255, 255, 255, 255]);
    assert_eq!(output.get_pixel(600, 1200).0[3], 0);
}

#[test]
fn test_unallocatable_target_is_an_error() {
    init();
    let controller = MarkupController::new(MarkupConfig::default());
    assert!(matches!(
        controller.render_with_size([0, 100]),
        Err(RenderError::AllocationFailed { width: 0, height: 100 })
    ));
}

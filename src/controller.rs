//! Entry point for a host UI: routes touches and gestures by mode, owns the
//! normalization ratio and composites the markup onto images.

use std::rc::Rc;

use egui::{Pos2, Vec2, vec2};
use image::RgbaImage;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tiny_skia::Transform;

use crate::config::MarkupConfig;
use crate::error::{DocumentError, RenderResult};
use crate::event::{EventBus, EventHandler, MarkupEvent};
use crate::geometry::{ImageFrame, NormalizationRatio};
use crate::label::{LabelId, LabelOverlay};
use crate::persistence::{self, DocumentRecord, DocumentSummary, DocumentView};
use crate::render::Canvas;
use crate::surface::DrawingSurface;

/// What touches on the markup view do
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkupMode {
    /// Touches are ignored
    #[default]
    Disabled,
    /// Touches draw smoothed strokes
    Drawing,
    /// Touches draw straight lines
    DrawLines,
    /// Taps select or add labels; gestures move the selected label
    Text,
    /// The selected label's text is being edited
    EditingText,
}

pub struct MarkupController {
    config: MarkupConfig,
    mode: MarkupMode,
    surface: DrawingSurface,
    overlay: LabelOverlay,
    ratio: NormalizationRatio,
    image_frame: Option<ImageFrame>,
    view_size: Vec2,
    events: Rc<EventBus>,
}

impl std::fmt::Debug for MarkupController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkupController")
            .field("mode", &self.mode)
            .field("ratio", &self.ratio)
            .field("image_frame", &self.image_frame)
            .field("view_size", &self.view_size)
            .field("surface", &self.surface)
            .field("overlay", &self.overlay)
            .finish()
    }
}

impl Default for MarkupController {
    fn default() -> Self {
        Self::new(MarkupConfig::default())
    }
}

impl MarkupController {
    pub fn new(config: MarkupConfig) -> Self {
        let events = Rc::new(EventBus::new());
        let surface = DrawingSurface::with_event_bus(&config, Rc::clone(&events));
        let overlay = LabelOverlay::with_event_bus(&config, Rc::clone(&events));
        let view_size = config.reference_size;
        Self {
            config,
            mode: MarkupMode::Disabled,
            surface,
            overlay,
            ratio: NormalizationRatio::IDENTITY,
            image_frame: None,
            view_size,
            events,
        }
    }

    pub fn config(&self) -> &MarkupConfig {
        &self.config
    }

    /// Receive drawing, label and mode notifications
    pub fn subscribe(&self, handler: impl EventHandler + 'static) -> bool {
        self.events.subscribe(handler)
    }

    pub fn event_bus(&self) -> &Rc<EventBus> {
        &self.events
    }

    pub fn surface(&self) -> &DrawingSurface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut DrawingSurface {
        &mut self.surface
    }

    pub fn overlay(&self) -> &LabelOverlay {
        &self.overlay
    }

    pub fn overlay_mut(&mut self) -> &mut LabelOverlay {
        &mut self.overlay
    }

    pub fn mode(&self) -> MarkupMode {
        self.mode
    }

    /// Switch modes, finishing whatever the old mode had in progress
    pub fn set_mode(&mut self, mode: MarkupMode) {
        let old = self.mode;
        if old == mode {
            return;
        }

        if matches!(old, MarkupMode::Drawing | MarkupMode::DrawLines) {
            self.surface.interrupt();
        }
        match mode {
            MarkupMode::EditingText => {
                if !self.overlay.is_selected() {
                    let center = (self.view_size / 2.0).to_pos2();
                    self.overlay.add_label_at(center);
                }
                self.overlay.end_gesture();
                self.overlay.begin_editing();
            }
            MarkupMode::Text => {
                self.overlay.end_editing();
            }
            MarkupMode::Disabled | MarkupMode::Drawing | MarkupMode::DrawLines => {
                self.overlay.deselect();
            }
        }

        self.mode = mode;
        debug!("mode {old:?} -> {mode:?}");
        self.events.emit(MarkupEvent::ModeChanged { old, new: mode });
    }

    // Touch routing

    pub fn touch_began(&mut self, point: Pos2) -> bool {
        match self.mode {
            MarkupMode::Drawing => self.surface.begin_stroke(point),
            MarkupMode::DrawLines => self.surface.begin_line(point),
            _ => false,
        }
    }

    pub fn touch_moved(&mut self, point: Pos2) -> bool {
        match self.mode {
            MarkupMode::Drawing => self.surface.move_stroke(point),
            MarkupMode::DrawLines => self.surface.move_line(point),
            _ => false,
        }
    }

    pub fn touch_ended(&mut self, point: Pos2) -> bool {
        match self.mode {
            MarkupMode::Drawing => self.surface.end_stroke(point),
            MarkupMode::DrawLines => self.surface.end_line(point),
            _ => false,
        }
    }

    /// The touch stream was lost; keep what was drawn so far
    pub fn touch_cancelled(&mut self) -> bool {
        self.interrupt()
    }

    /// Commit partial strokes and finish label gestures
    pub fn interrupt(&mut self) -> bool {
        let committed = self.surface.interrupt();
        let gesture = self.overlay.end_gesture();
        committed || gesture
    }

    /// In text modes: edit the label under `point`, or add one there
    pub fn tap(&mut self, point: Pos2) -> Option<LabelId> {
        if !matches!(self.mode, MarkupMode::Text | MarkupMode::EditingText) {
            return None;
        }
        self.overlay.end_editing();
        let id = match self.overlay.select_label_at(point) {
            Some(id) => id,
            None => self.overlay.add_label_at(point)?,
        };
        self.set_mode(MarkupMode::EditingText);
        self.overlay.begin_editing();
        Some(id)
    }

    /// Replace the text of the label being edited
    pub fn set_text(&mut self, text: impl Into<String>) -> bool {
        self.overlay.set_text(text)
    }

    pub fn finish_editing(&mut self) -> bool {
        if self.mode != MarkupMode::EditingText {
            return false;
        }
        self.set_mode(MarkupMode::Text);
        true
    }

    // Label gestures, only in text mode

    pub fn begin_label_gesture(&mut self) -> bool {
        self.mode == MarkupMode::Text && self.overlay.begin_gesture()
    }

    pub fn pan_label(&mut self, translation: Vec2) -> bool {
        self.mode == MarkupMode::Text && self.overlay.pan(translation)
    }

    pub fn pinch_label(&mut self, scale_factor: f32) -> bool {
        self.mode == MarkupMode::Text && self.overlay.pinch(scale_factor)
    }

    pub fn rotate_label(&mut self, angle: f32) -> bool {
        self.mode == MarkupMode::Text && self.overlay.rotate(angle)
    }

    pub fn end_label_gesture(&mut self) -> bool {
        self.overlay.end_gesture()
    }

    // Geometry

    pub fn ratio(&self) -> NormalizationRatio {
        self.ratio
    }

    /// Fit the reference window into a view of this size
    pub fn setup_ratio(&mut self, width: f32, height: f32) {
        self.ratio = NormalizationRatio::compute_against(vec2(width, height), self.config.reference_size);
        debug!("normalization ratio {}", self.ratio.value());
    }

    pub fn view_size(&self) -> Vec2 {
        self.view_size
    }

    pub fn set_view_size(&mut self, size: Vec2) {
        if !(size.x.is_finite() && size.y.is_finite() && size.x > 0.0 && size.y > 0.0) {
            warn!("ignoring degenerate view size {size:?}");
            return;
        }
        self.view_size = size;
        self.surface.set_view_size(size);
        self.overlay.set_view_size(size);
    }

    pub fn image_frame(&self) -> Option<ImageFrame> {
        self.image_frame
    }

    /// Prepare for annotating an image shown aspect-fit inside `container`
    pub fn setup_for_image(&mut self, image_size: Vec2, container: Vec2) {
        let frame = ImageFrame::aspect_fit(image_size, container);
        self.set_view_size(container);
        self.setup_ratio(container.x, container.y);
        self.surface.set_output_scale_factor(frame.output_scale());
        self.image_frame = Some(frame);
        debug!("image frame {:?}, output scale {}", frame.frame, frame.output_scale());
    }

    // Clearing and history

    pub fn clear_all(&mut self) {
        self.clear_drawing();
        self.clear_text();
    }

    pub fn clear_drawing(&mut self) {
        self.surface.clear();
    }

    pub fn clear_text(&mut self) {
        self.overlay.clear_all();
        if self.mode == MarkupMode::EditingText {
            self.set_mode(MarkupMode::Text);
        }
    }

    pub fn undo_drawing(&mut self) -> bool {
        self.surface.undo()
    }

    pub fn redo_drawing(&mut self) -> bool {
        self.surface.redo()
    }

    pub fn can_undo_drawing(&self) -> bool {
        self.surface.can_undo()
    }

    pub fn can_redo_drawing(&self) -> bool {
        self.surface.can_redo()
    }

    pub fn delete_selected_label(&mut self) -> bool {
        let deleted = self.overlay.delete_selected().is_some();
        if deleted && self.mode == MarkupMode::EditingText {
            self.set_mode(MarkupMode::Text);
        }
        deleted
    }

    pub fn deselect_label(&mut self) -> bool {
        let deselected = self.overlay.deselect();
        if deselected && self.mode == MarkupMode::EditingText {
            self.set_mode(MarkupMode::Text);
        }
        deselected
    }

    pub fn label_is_selected(&self) -> bool {
        self.overlay.is_selected()
    }

    // Persistence

    /// The whole document in reference coordinates
    pub fn serialize(&self) -> Value {
        DocumentRecord::new(
            self.surface.serialize(self.ratio),
            self.overlay.serialize(self.ratio),
        )
        .into_value()
    }

    /// Replace drawing and labels with the document's, in view coordinates.
    ///
    /// Only an unusable root fails; bad entries are skipped and counted.
    pub fn deserialize(&mut self, document: &Value) -> Result<DocumentSummary, DocumentError> {
        let view = DocumentView::parse(document)?;
        if self.mode == MarkupMode::EditingText {
            self.set_mode(MarkupMode::Text);
        }

        let draw_view = view.draw_view.unwrap_or(&Value::Null);
        let drawing = self.surface.deserialize(draw_view, self.ratio);
        let labels = self.overlay.deserialize(view.labels, self.ratio);
        info!(
            "document loaded: {} objects, {} labels ({} entries skipped)",
            drawing.loaded,
            labels.loaded,
            drawing.skipped + labels.skipped
        );
        Ok(DocumentSummary { drawing, labels })
    }

    pub fn from_json_str(&mut self, json: &str) -> Result<DocumentSummary, DocumentError> {
        let document = persistence::parse_str(json)?;
        self.deserialize(&document)
    }

    pub fn to_json_string(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string(&self.serialize())?)
    }

    // Rendering

    /// Strokes and labels on a transparent background, scaled from view size
    /// to `target_size` pixels
    pub fn render_with_size(&self, target_size: [u32; 2]) -> RenderResult<RgbaImage> {
        let [width, height] = target_size;
        let mut canvas = Canvas::new(width, height)?;
        canvas.set_transform(Transform::from_scale(
            width as f32 / self.view_size.x,
            height as f32 / self.view_size.y,
        ));
        self.surface.draw_committed(&mut canvas, false);
        self.overlay.draw(&mut canvas);
        canvas.into_image()
    }

    /// Composite strokes and labels onto `image`.
    ///
    /// The output is never smaller than either the image or the drawing at
    /// image resolution; the image sits at the top-left corner.
    pub fn draw_on_image(&self, image: &RgbaImage) -> RenderResult<RgbaImage> {
        let (scale, offset) = match self.image_frame {
            Some(frame) => {
                let scale = frame.output_scale();
                (scale, frame.frame.min.to_vec2() * -scale)
            }
            None => (1.0, Vec2::ZERO),
        };
        let drawing_size = self.view_size * scale;
        let width = (drawing_size.x.ceil() as u32).max(image.width());
        let height = (drawing_size.y.ceil() as u32).max(image.height());

        let mut canvas = Canvas::with_background(image, width, height)?;
        // stored output scale factors may come from another device; the current frame decides
        canvas.set_transform(
            Transform::from_translate(offset.x, offset.y)
                .pre_concat(Transform::from_scale(scale, scale)),
        );
        self.surface.draw_committed(&mut canvas, false);
        self.overlay.draw(&mut canvas);

        info!("composited markup onto {}x{} image as {width}x{height}", image.width(), image.height());
        canvas.into_image()
    }
}

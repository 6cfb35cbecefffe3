//! The vector drawing: committed batches, the undo/redo stacks and the
//! stroke or line currently being drawn.

mod history;
mod snap;

use std::rc::Rc;

use egui::{Pos2, Vec2};
use image::RgbaImage;
use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::Value;
use tiny_skia::{Pixmap, Transform};

pub use history::{Batch, StrokeHistory};
pub use snap::{DiscreteGrid, PointSnapper, constrain_right_angle};

use crate::config::{DrawingConfig, MarkupConfig};
use crate::element::{DrawableObject, LineSegment, StrokeStyle};
use crate::error::{RenderError, RenderResult};
use crate::event::{DrawingEvent, EventBus, MarkupEvent};
use crate::geometry::{NormalizationRatio, REFERENCE_SIZE, is_finite_point};
use crate::persistence::{DrawViewRecord, LoadSummary, keys};
use crate::render::Canvas;
use crate::stroke::{ClosedStroke, StrokeSmoother};

/// Drawing between a touch-begin and its touch-end
#[derive(Debug, Clone)]
enum ActiveDraw {
    Stroke(Batch),
    Line(LineSegment),
}

pub struct DrawingSurface {
    config: DrawingConfig,
    smoother: StrokeSmoother,
    history: StrokeHistory,
    active: Option<ActiveDraw>,
    /// Size of the live view in points
    view_size: Vec2,
    /// Stamped onto new objects, used when compositing onto a scaled image
    output_scale_factor: f32,
    snapper: Option<Box<dyn PointSnapper>>,
    /// Committed objects rasterized at view size
    bitmap: Option<Pixmap>,
    bitmap_dirty: bool,
    events: Rc<EventBus>,
}

impl std::fmt::Debug for DrawingSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawingSurface")
            .field("config", &self.config)
            .field("history", &self.history)
            .field("active", &self.active)
            .field("view_size", &self.view_size)
            .field("output_scale_factor", &self.output_scale_factor)
            .field("has_snapper", &self.snapper.is_some())
            .field("bitmap_dirty", &self.bitmap_dirty)
            .finish()
    }
}

impl DrawingSurface {
    pub fn new(config: &MarkupConfig) -> Self {
        Self::with_event_bus(config, Rc::new(EventBus::new()))
    }

    /// Create a surface that reports to a shared event bus
    pub fn with_event_bus(config: &MarkupConfig, events: Rc<EventBus>) -> Self {
        Self {
            config: config.drawing.clone(),
            smoother: StrokeSmoother::new(config.smoothing.clone()),
            history: StrokeHistory::new(),
            active: None,
            view_size: REFERENCE_SIZE,
            output_scale_factor: 1.0,
            snapper: None,
            bitmap: None,
            bitmap_dirty: true,
            events,
        }
    }

    pub fn event_bus(&self) -> &Rc<EventBus> {
        &self.events
    }

    pub fn drawing_config(&self) -> &DrawingConfig {
        &self.config
    }

    /// Applies to objects drawn from now on; committed objects keep their style
    pub fn set_drawing_config(&mut self, config: DrawingConfig) {
        self.config = config;
    }

    pub fn set_stroke_color(&mut self, color: egui::Color32) {
        self.config.stroke_color = color;
    }

    pub fn set_stroke_width(&mut self, width: f32) {
        self.config.stroke_width = width;
    }

    /// Replace the grid snapper; `None` falls back to `grid_size` from the config
    pub fn set_snapper(&mut self, snapper: Option<Box<dyn PointSnapper>>) {
        self.snapper = snapper;
    }

    pub fn view_size(&self) -> Vec2 {
        self.view_size
    }

    pub fn set_view_size(&mut self, size: Vec2) {
        if size != self.view_size {
            debug!("surface resized to {size:?}");
            self.view_size = size;
            self.bitmap = None;
            self.bitmap_dirty = true;
        }
    }

    pub fn output_scale_factor(&self) -> f32 {
        self.output_scale_factor
    }

    pub fn set_output_scale_factor(&mut self, factor: f32) {
        self.output_scale_factor = if factor.is_finite() && factor > 0.0 {
            factor
        } else {
            warn!("ignoring output scale factor {factor}, using 1.0");
            1.0
        };
    }

    fn style(&self) -> StrokeStyle {
        StrokeStyle {
            color: self.config.stroke_color,
            width: crate::element::common::sanitize_width("stroke width", self.config.stroke_width),
            constant_width: self.config.constant_width,
            dashed: self.config.dashed,
            output_scale_factor: self.output_scale_factor,
        }
    }

    fn emit(&self, event: DrawingEvent) {
        self.events.emit(MarkupEvent::Drawing(event));
    }

    // Strokes

    /// Start a smoothed stroke. Ignored while another stroke or line is active.
    pub fn begin_stroke(&mut self, point: Pos2) -> bool {
        if !self.can_begin(point) {
            return false;
        }
        if let Err(err) = self.smoother.begin(point, self.style()) {
            warn!("ignoring stroke begin: {err}");
            return false;
        }
        self.active = Some(ActiveDraw::Stroke(Batch::new()));
        self.emit(DrawingEvent::Began);
        true
    }

    pub fn move_stroke(&mut self, point: Pos2) -> bool {
        let Some(ActiveDraw::Stroke(batch)) = &mut self.active else {
            warn!("ignoring stroke move without an active stroke");
            return false;
        };
        match self.smoother.move_to(point) {
            Ok(segment) => {
                if let Some(segment) = segment {
                    batch.push(segment);
                }
                true
            }
            Err(err) => {
                warn!("ignoring stroke move: {err}");
                false
            }
        }
    }

    /// Close the stroke and commit its batch
    pub fn end_stroke(&mut self, point: Pos2) -> bool {
        if !matches!(self.active, Some(ActiveDraw::Stroke(_))) {
            warn!("ignoring stroke end without an active stroke");
            return false;
        }
        let Some(ActiveDraw::Stroke(mut batch)) = self.active.take() else {
            return false;
        };
        match self.smoother.end(point) {
            Ok(closed) => attach_closed(&mut batch, closed),
            Err(err) => warn!("stroke ended in an unexpected state: {err}"),
        }
        self.commit(batch);
        true
    }

    // Lines

    /// Start a straight line. Ignored while another stroke or line is active.
    pub fn begin_line(&mut self, point: Pos2) -> bool {
        if !self.can_begin(point) {
            return false;
        }
        self.active = Some(ActiveDraw::Line(LineSegment::begin(point, &self.style())));
        self.emit(DrawingEvent::Began);
        true
    }

    pub fn move_line(&mut self, point: Pos2) -> bool {
        if !is_finite_point(point) {
            debug!("dropping non-finite point {point:?}");
            return false;
        }
        let right_angle = self.config.right_angle_lines_only;
        let Some(ActiveDraw::Line(line)) = &mut self.active else {
            warn!("ignoring line move without an active line");
            return false;
        };
        let point_b = if right_angle {
            constrain_right_angle(line.point_a(), point)
        } else {
            point
        };
        line.set_point_b(point_b);
        true
    }

    /// Fix point B, snap both endpoints and commit the line
    pub fn end_line(&mut self, point: Pos2) -> bool {
        if !matches!(self.active, Some(ActiveDraw::Line(_))) {
            warn!("ignoring line end without an active line");
            return false;
        }
        self.move_line(point);
        if let Some(ActiveDraw::Line(line)) = self.active.take() {
            self.commit_line(line);
        }
        true
    }

    fn commit_line(&mut self, mut line: LineSegment) {
        let (a, b) = (self.snap(line.point_a()), self.snap(line.point_b()));
        line.set_point_a(a);
        line.set_point_b(b);
        let mut batch = Batch::new();
        batch.push(line);
        self.commit(batch);
    }

    fn snap(&self, point: Pos2) -> Pos2 {
        match (&self.snapper, self.config.grid_size) {
            (Some(snapper), _) => snapper.snap(point),
            (None, Some(size)) => DiscreteGrid::new(size).snap(point),
            (None, None) => point,
        }
    }

    fn can_begin(&self, point: Pos2) -> bool {
        if self.active.is_some() {
            warn!("ignoring begin while another drawing is in progress");
            return false;
        }
        if !is_finite_point(point) {
            warn!("ignoring begin at non-finite point {point:?}");
            return false;
        }
        true
    }

    /// Commit whatever is in progress after the input stream was lost
    pub fn interrupt(&mut self) -> bool {
        match self.active.take() {
            Some(ActiveDraw::Stroke(mut batch)) => {
                match self.smoother.finish() {
                    Ok(closed) => attach_closed(&mut batch, closed),
                    Err(err) => warn!("stroke interrupted in an unexpected state: {err}"),
                }
                debug!("committing interrupted stroke of {} segments", batch.len());
                self.commit(batch);
                true
            }
            Some(ActiveDraw::Line(line)) => {
                debug!("committing interrupted line");
                self.commit_line(line);
                true
            }
            None => false,
        }
    }

    pub fn is_drawing(&self) -> bool {
        self.active.is_some()
    }

    /// Segments emitted so far by the stroke in progress
    pub fn active_batch(&self) -> Option<&Batch> {
        match &self.active {
            Some(ActiveDraw::Stroke(batch)) => Some(batch),
            _ => None,
        }
    }

    pub fn active_line(&self) -> Option<&LineSegment> {
        match &self.active {
            Some(ActiveDraw::Line(line)) => Some(line),
            _ => None,
        }
    }

    fn cancel_active(&mut self) {
        if let Some(ActiveDraw::Stroke(_)) = self.active.take() {
            let _ = self.smoother.finish();
        }
    }

    // History

    fn commit(&mut self, batch: Batch) {
        if batch.is_empty() {
            return;
        }
        let was_empty = !self.history.can_undo();
        self.draw_onto_bitmap(&batch);
        debug!("committed batch of {} objects", batch.len());
        self.history.commit(batch);

        self.emit(DrawingEvent::Ended);
        if was_empty {
            self.emit(DrawingEvent::ShouldEnableUndo);
        }
    }

    /// Move the newest batch to the redo stack; a no-op when nothing is committed
    pub fn undo(&mut self) -> bool {
        if !self.history.undo() {
            return false;
        }
        debug!("undo, {} batches left", self.history.committed().len());
        self.bitmap_dirty = true;
        if !self.history.can_undo() {
            self.emit(DrawingEvent::ShouldDisableUndo);
        }
        true
    }

    /// Re-append the most recently undone batch; a no-op when nothing was undone
    pub fn redo(&mut self) -> bool {
        let was_empty = !self.history.can_undo();
        if self.history.redo().is_none() {
            return false;
        }
        debug!("redo, {} batches committed", self.history.committed().len());
        self.bitmap_dirty = true;
        if was_empty {
            self.emit(DrawingEvent::ShouldEnableUndo);
        }
        true
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Drop every batch, the redo stack and anything in progress. Irreversible.
    pub fn clear(&mut self) {
        let had_undo = self.history.can_undo();
        self.cancel_active();
        self.history.clear();
        self.bitmap_dirty = true;
        debug!("drawing cleared");
        self.emit(DrawingEvent::Cleared);
        if had_undo {
            self.emit(DrawingEvent::ShouldDisableUndo);
        }
    }

    pub fn history(&self) -> &StrokeHistory {
        &self.history
    }

    pub fn committed(&self) -> &[Batch] {
        self.history.committed()
    }

    pub fn redo_batches(&self) -> &[Batch] {
        self.history.redo_batches()
    }

    pub fn objects(&self) -> impl Iterator<Item = &DrawableObject> {
        self.history.committed().iter().flat_map(Batch::iter)
    }

    pub fn object_count(&self) -> usize {
        self.history.committed().iter().map(Batch::len).sum()
    }

    // Rendering

    /// Paint every committed object in the canvas' current transform
    pub fn draw_committed(&self, canvas: &mut Canvas, with_scaling: bool) {
        for object in self.objects() {
            object.draw(canvas, with_scaling);
        }
    }

    /// Paint the stroke or line in progress, for live feedback
    pub fn draw_active(&self, canvas: &mut Canvas) {
        match &self.active {
            Some(ActiveDraw::Stroke(batch)) => batch.iter().for_each(|o| o.draw(canvas, false)),
            Some(ActiveDraw::Line(line)) => {
                DrawableObject::Line(line.clone()).draw(canvas, false);
            }
            None => {}
        }
    }

    /// Rasterize the committed drawing (never the batch in progress), scaled
    /// from view size to `target_size` pixels
    pub fn render(&self, target_size: [u32; 2]) -> RenderResult<RgbaImage> {
        let [width, height] = target_size;
        let mut canvas = Canvas::new(width, height)?;
        canvas.set_transform(view_to_target(self.view_size, target_size));
        self.draw_committed(&mut canvas, false);
        canvas.into_image()
    }

    /// The committed drawing at view size, redrawn only when stale
    pub fn bitmap(&mut self) -> RenderResult<&Pixmap> {
        if self.bitmap_dirty || self.bitmap.is_none() {
            return self.refresh_bitmap();
        }
        let [width, height] = self.bitmap_size();
        self.bitmap
            .as_ref()
            .ok_or(RenderError::AllocationFailed { width, height })
    }

    /// Redraw the bitmap from every committed batch
    pub fn refresh_bitmap(&mut self) -> RenderResult<&Pixmap> {
        let [width, height] = self.bitmap_size();
        let mut canvas = Canvas::new(width, height)?;
        self.draw_committed(&mut canvas, false);
        self.bitmap_dirty = false;
        let pixmap: &Pixmap = self.bitmap.insert(canvas.into_pixmap());
        Ok(pixmap)
    }

    pub fn is_bitmap_dirty(&self) -> bool {
        self.bitmap_dirty || self.bitmap.is_none()
    }

    fn bitmap_size(&self) -> [u32; 2] {
        [
            self.view_size.x.max(0.0).ceil() as u32,
            self.view_size.y.max(0.0).ceil() as u32,
        ]
    }

    /// Appending a batch only needs that batch drawn on top of a fresh bitmap
    fn draw_onto_bitmap(&mut self, batch: &Batch) {
        if self.bitmap_dirty {
            return;
        }
        if let Some(pixmap) = self.bitmap.take() {
            let mut canvas = Canvas::from_pixmap(pixmap);
            batch.iter().for_each(|object| object.draw(&mut canvas, false));
            self.bitmap = Some(canvas.into_pixmap());
        }
    }

    // Persistence

    /// Serialize the committed objects and the redo stack, in reference coordinates
    pub fn serialize(&self, ratio: NormalizationRatio) -> Value {
        let objects: Vec<Value> = self.objects().map(|o| o.serialize(ratio)).collect();
        let batch_sizes: Vec<usize> = self.committed().iter().map(Batch::len).collect();
        let undo_array: Vec<Value> = self
            .redo_batches()
            .iter()
            .map(|batch| Value::Array(batch.iter().map(|o| o.serialize(ratio)).collect()))
            .collect();

        DrawViewRecord {
            objects,
            undo_array,
            batch_sizes,
        }
        .into_value()
    }

    /// Replace the drawing with the one in `draw_view`.
    ///
    /// Malformed objects are skipped one by one; the rest still load.
    pub fn deserialize(&mut self, draw_view: &Value, ratio: NormalizationRatio) -> LoadSummary {
        let mut summary = LoadSummary::default();

        let objects = draw_view
            .get(keys::OBJECTS)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let decoded: Vec<Option<DrawableObject>> = objects
            .iter()
            .enumerate()
            .map(|(i, value)| {
                summary.record("drawing object", i, DrawableObject::deserialize(value, ratio))
            })
            .collect();
        let committed = group_batches(decoded, draw_view.get(keys::BATCH_SIZES));

        let undo_entries = draw_view
            .get(keys::UNDO_ARRAY)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let mut redo_stack = Vec::with_capacity(undo_entries.len());
        for (i, entry) in undo_entries.iter().enumerate() {
            let values = match entry {
                Value::Array(values) => values.as_slice(),
                Value::Object(_) => std::slice::from_ref(entry),
                _ => {
                    warn!("skipping undone batch #{i}: not a list");
                    continue;
                }
            };
            let batch: Batch = values
                .iter()
                .enumerate()
                .filter_map(|(j, value)| {
                    summary.record("undone object", j, DrawableObject::deserialize(value, ratio))
                })
                .collect();
            if !batch.is_empty() {
                redo_stack.push(batch);
            }
        }

        self.cancel_active();
        self.history.restore(committed, redo_stack);
        self.bitmap_dirty = true;
        info!(
            "loaded {} drawing objects in {} batches ({} skipped)",
            summary.loaded,
            self.history.committed().len(),
            summary.skipped
        );
        self.emit(if self.history.can_undo() {
            DrawingEvent::ShouldEnableUndo
        } else {
            DrawingEvent::ShouldDisableUndo
        });
        summary
    }
}

/// Split loaded objects back into their batches; without usable sizes
/// everything becomes one batch
fn group_batches(decoded: Vec<Option<DrawableObject>>, sizes: Option<&Value>) -> Vec<Batch> {
    let sizes = sizes.and_then(|value| match Vec::<usize>::deserialize(value) {
        Ok(sizes) if sizes.iter().sum::<usize>() == decoded.len() => Some(sizes),
        Ok(_) => {
            warn!("batch sizes do not match the object list, loading one batch");
            None
        }
        Err(err) => {
            warn!("unreadable batch sizes ({err}), loading one batch");
            None
        }
    });

    let batches: Vec<Batch> = match sizes {
        Some(sizes) => {
            let mut objects = decoded.into_iter();
            sizes
                .into_iter()
                .map(|n| objects.by_ref().take(n).flatten().collect())
                .collect()
        }
        None => vec![decoded.into_iter().flatten().collect()],
    };
    batches.into_iter().filter(|b| !b.is_empty()).collect()
}

fn attach_closed(batch: &mut Batch, closed: ClosedStroke) {
    if let Some(head) = closed.head {
        batch.push_front(head);
    }
    closed.tail.into_iter().for_each(|s| batch.push(s));
}

fn view_to_target(view_size: Vec2, target_size: [u32; 2]) -> Transform {
    if view_size.x <= 0.0 || view_size.y <= 0.0 {
        return Transform::identity();
    }
    Transform::from_scale(
        target_size[0] as f32 / view_size.x,
        target_size[1] as f32 / view_size.y,
    )
}

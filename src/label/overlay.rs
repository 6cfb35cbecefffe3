use std::rc::Rc;

use egui::{Color32, Pos2, Vec2};
use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::Value;

use super::{GestureSession, LabelId, LabelRecord, TextAlignment, TextLabel};
use crate::config::{MarkupConfig, TextConfig};
use crate::event::{EventBus, LabelEvent, MarkupEvent};
use crate::geometry::{NormalizationRatio, REFERENCE_SIZE, is_finite_point};
use crate::persistence::LoadSummary;
use crate::render::{Canvas, FontBook};

/// Where the overlay is in the select / transform / edit cycle.
///
/// At most one label is selected in every state but `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayState {
    Idle,
    Selected(LabelId),
    Transforming(LabelId),
    Editing(LabelId),
}

impl OverlayState {
    pub fn selected(&self) -> Option<LabelId> {
        match *self {
            Self::Idle => None,
            Self::Selected(id) | Self::Transforming(id) | Self::Editing(id) => Some(id),
        }
    }
}

/// All text labels of a document, drawn in insertion order
pub struct LabelOverlay {
    labels: Vec<TextLabel>,
    state: OverlayState,
    session: Option<GestureSession>,
    config: TextConfig,
    fonts: FontBook,
    view_size: Vec2,
    events: Rc<EventBus>,
}

impl std::fmt::Debug for LabelOverlay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabelOverlay")
            .field("labels", &self.labels.len())
            .field("state", &self.state)
            .field("view_size", &self.view_size)
            .finish()
    }
}

impl LabelOverlay {
    pub fn new(config: &MarkupConfig) -> Self {
        Self::with_event_bus(config, Rc::new(EventBus::new()))
    }

    pub fn with_event_bus(config: &MarkupConfig, events: Rc<EventBus>) -> Self {
        Self {
            labels: Vec::new(),
            state: OverlayState::Idle,
            session: None,
            config: config.text.clone(),
            fonts: FontBook::new(),
            view_size: REFERENCE_SIZE,
            events,
        }
    }

    pub fn event_bus(&self) -> &Rc<EventBus> {
        &self.events
    }

    pub fn text_config(&self) -> &TextConfig {
        &self.config
    }

    /// Applies to labels added from now on
    pub fn set_text_config(&mut self, config: TextConfig) {
        self.config = config;
    }

    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }

    /// Register fonts here, then call [`Self::relayout_all`]
    pub fn fonts_mut(&mut self) -> &mut FontBook {
        &mut self.fonts
    }

    pub fn view_size(&self) -> Vec2 {
        self.view_size
    }

    /// Fitted labels follow the view width
    pub fn set_view_size(&mut self, size: Vec2) {
        if size == self.view_size {
            return;
        }
        self.view_size = size;
        for label in &mut self.labels {
            if label.fits_width() {
                label.set_fit_width(Some(size.x), &self.fonts);
            }
        }
    }

    pub fn relayout_all(&mut self) {
        for label in &mut self.labels {
            label.relayout(&self.fonts);
        }
    }

    fn emit(&self, event: LabelEvent) {
        self.events.emit(MarkupEvent::Label(event));
    }

    pub fn labels(&self) -> &[TextLabel] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn label(&self, id: LabelId) -> Option<&TextLabel> {
        self.labels.iter().find(|label| label.id() == id)
    }

    fn label_mut(&mut self, id: LabelId) -> Option<&mut TextLabel> {
        self.labels.iter_mut().find(|label| label.id() == id)
    }

    pub fn state(&self) -> OverlayState {
        self.state
    }

    pub fn selected_id(&self) -> Option<LabelId> {
        self.state.selected()
    }

    pub fn selected_label(&self) -> Option<&TextLabel> {
        self.selected_id().and_then(|id| self.label(id))
    }

    pub fn is_selected(&self) -> bool {
        self.state.selected().is_some()
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.state, OverlayState::Editing(_))
    }

    /// Add an empty label centered on `point` and select it
    pub fn add_label_at(&mut self, point: Pos2) -> Option<LabelId> {
        if !is_finite_point(point) {
            warn!("ignoring label at non-finite point {point:?}");
            return None;
        }
        let fit_width = self.config.fit_to_width.then_some(self.view_size.x);
        let label = TextLabel::new(&self.config, point, fit_width, &self.fonts);
        let id = label.id();
        self.labels.push(label);
        debug!("added label {id} at {point:?}");
        self.emit(LabelEvent::Added(id));
        self.select(id);
        Some(id)
    }

    /// Topmost label under `point`
    pub fn label_at(&self, point: Pos2) -> Option<LabelId> {
        self.labels
            .iter()
            .rev()
            .find(|label| label.contains(point))
            .map(TextLabel::id)
    }

    /// Select `id`, deselecting whatever was selected before
    pub fn select(&mut self, id: LabelId) -> bool {
        if self.label(id).is_none() {
            return false;
        }
        if self.selected_id() == Some(id) {
            return true;
        }
        self.deselect();
        if let Some(label) = self.label_mut(id) {
            label.set_selected(true);
        }
        self.state = OverlayState::Selected(id);
        debug!("selected label {id}");
        self.emit(LabelEvent::Selected(id));
        true
    }

    pub fn select_label_at(&mut self, point: Pos2) -> Option<LabelId> {
        let id = self.label_at(point)?;
        self.select(id).then_some(id)
    }

    /// Finish any edit or gesture and clear the selection
    pub fn deselect(&mut self) -> bool {
        let Some(id) = self.selected_id() else {
            return false;
        };
        match self.state {
            OverlayState::Editing(_) => {
                self.emit(LabelEvent::EditingEnded(id));
            }
            OverlayState::Transforming(_) => {
                self.session = None;
                self.emit(LabelEvent::TransformEnded(id));
            }
            _ => {}
        }
        if let Some(label) = self.label_mut(id) {
            label.set_selected(false);
        }
        self.state = OverlayState::Idle;
        debug!("deselected label {id}");
        self.emit(LabelEvent::Deselected(id));
        true
    }

    pub fn delete_selected(&mut self) -> Option<TextLabel> {
        let id = self.selected_id()?;
        self.deselect();
        let index = self.labels.iter().position(|label| label.id() == id)?;
        let label = self.labels.remove(index);
        debug!("deleted label {id}");
        self.emit(LabelEvent::Deleted(id));
        Some(label)
    }

    pub fn clear_all(&mut self) {
        self.deselect();
        self.labels.clear();
        self.emit(LabelEvent::Cleared);
    }

    // Editing

    /// Enter text editing on the selected label
    pub fn begin_editing(&mut self) -> bool {
        match self.state {
            OverlayState::Selected(id) => {
                self.state = OverlayState::Editing(id);
                self.emit(LabelEvent::EditingBegan(id));
                true
            }
            OverlayState::Editing(_) => true,
            _ => false,
        }
    }

    /// Replace the text of the label being edited; frame and font size follow
    pub fn set_text(&mut self, text: impl Into<String>) -> bool {
        let OverlayState::Editing(id) = self.state else {
            warn!("ignoring text change outside of editing");
            return false;
        };
        let fonts = &self.fonts;
        match self.labels.iter_mut().find(|label| label.id() == id) {
            Some(label) => {
                label.set_text(text, fonts);
                true
            }
            None => false,
        }
    }

    pub fn end_editing(&mut self) -> bool {
        let OverlayState::Editing(id) = self.state else {
            return false;
        };
        self.state = OverlayState::Selected(id);
        self.emit(LabelEvent::EditingEnded(id));
        true
    }

    pub fn set_selected_color(&mut self, color: Color32) -> bool {
        match self.selected_id().and_then(|id| self.label_mut(id)) {
            Some(label) => {
                label.set_color(color);
                true
            }
            None => false,
        }
    }

    pub fn set_selected_alignment(&mut self, alignment: TextAlignment) -> bool {
        match self.selected_id().and_then(|id| self.label_mut(id)) {
            Some(label) => {
                label.set_alignment(alignment);
                true
            }
            None => false,
        }
    }

    pub fn set_selected_font(&mut self, name: &str, size: f32) -> bool {
        let Some(id) = self.selected_id() else {
            return false;
        };
        let fonts = &self.fonts;
        match self.labels.iter_mut().find(|label| label.id() == id) {
            Some(label) => {
                label.set_font(name, size, fonts);
                true
            }
            None => false,
        }
    }

    // Gestures

    /// Capture the selected label's transform; later updates are relative to it
    pub fn begin_gesture(&mut self) -> bool {
        let id = match self.state {
            OverlayState::Selected(id) => id,
            // pinch and rotate recognizers both begin the same session
            OverlayState::Transforming(_) => return true,
            OverlayState::Idle | OverlayState::Editing(_) => return false,
        };
        let Some(label) = self.label(id) else {
            return false;
        };
        self.session = Some(GestureSession::begin(label.transform(), self.config.min_scale));
        self.state = OverlayState::Transforming(id);
        self.emit(LabelEvent::TransformBegan(id));
        true
    }

    /// Translation since the gesture began
    pub fn pan(&mut self, translation: Vec2) -> bool {
        self.update_gesture(|session| session.pan(translation))
    }

    /// Scale factor since the gesture began
    pub fn pinch(&mut self, scale_factor: f32) -> bool {
        self.update_gesture(|session| session.pinch(scale_factor))
    }

    /// Rotation in radians since the gesture began
    pub fn rotate(&mut self, angle: f32) -> bool {
        self.update_gesture(|session| session.rotate(angle))
    }

    fn update_gesture(&mut self, update: impl FnOnce(&mut GestureSession)) -> bool {
        let OverlayState::Transforming(id) = self.state else {
            return false;
        };
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        update(session);
        let transform = session.current();
        match self.label_mut(id) {
            Some(label) => {
                label.set_transform(transform);
                true
            }
            None => false,
        }
    }

    pub fn end_gesture(&mut self) -> bool {
        let OverlayState::Transforming(id) = self.state else {
            return false;
        };
        self.session = None;
        self.state = OverlayState::Selected(id);
        self.emit(LabelEvent::TransformEnded(id));
        true
    }

    /// Paint every label in the canvas' current transform
    pub fn draw(&self, canvas: &mut Canvas) {
        for label in &self.labels {
            label.draw(canvas, &self.fonts);
        }
    }

    pub fn serialize(&self, ratio: NormalizationRatio) -> Vec<Value> {
        self.labels
            .iter()
            .map(|label| serde_json::to_value(label.to_record(ratio)).unwrap_or(Value::Null))
            .collect()
    }

    /// Replace every label with the ones in `values`, skipping malformed entries
    pub fn deserialize(&mut self, values: &[Value], ratio: NormalizationRatio) -> LoadSummary {
        self.deselect();
        let mut summary = LoadSummary::default();
        let fit_width = self.view_size.x;
        let labels: Vec<TextLabel> = values
            .iter()
            .enumerate()
            .filter_map(|(i, value)| {
                let label = LabelRecord::deserialize(value)
                    .map_err(Into::into)
                    .and_then(|record| {
                        TextLabel::from_record(record, ratio, &self.config, fit_width, &self.fonts)
                    });
                summary.record("label", i, label)
            })
            .collect();
        self.labels = labels;
        info!("loaded {} labels ({} skipped)", summary.loaded, summary.skipped);
        summary
    }
}

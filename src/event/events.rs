use uuid::Uuid;

use crate::controller::MarkupMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawingEvent {
    /// A stroke or line started
    Began,
    /// A stroke or line was committed
    Ended,
    /// The committed sequence became non-empty
    ShouldEnableUndo,
    /// The committed sequence became empty
    ShouldDisableUndo,
    Cleared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelEvent {
    Added(Uuid),
    Selected(Uuid),
    Deselected(Uuid),
    EditingBegan(Uuid),
    EditingEnded(Uuid),
    TransformBegan(Uuid),
    TransformEnded(Uuid),
    Deleted(Uuid),
    Cleared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupEvent {
    Drawing(DrawingEvent),
    Label(LabelEvent),
    ModeChanged { old: MarkupMode, new: MarkupMode },
}

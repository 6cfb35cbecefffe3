use egui::Rect;

use crate::element::DrawableObject;

/// Every object produced between one touch-begin and its touch-end.
///
/// The atomic unit of undo and redo.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    objects: Vec<DrawableObject>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, object: impl Into<DrawableObject>) {
        self.objects.push(object.into());
    }

    pub fn push_front(&mut self, object: impl Into<DrawableObject>) {
        self.objects.insert(0, object.into());
    }

    pub fn objects(&self) -> &[DrawableObject] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DrawableObject> {
        self.objects.iter()
    }

    pub fn bounding_rect(&self) -> Rect {
        self.objects
            .iter()
            .fold(Rect::NOTHING, |acc, object| acc.union(object.bounding_rect()))
    }
}

impl FromIterator<DrawableObject> for Batch {
    fn from_iter<I: IntoIterator<Item = DrawableObject>>(iter: I) -> Self {
        Self {
            objects: iter.into_iter().collect(),
        }
    }
}

/// Committed batches plus the batches popped by undo since the last fresh commit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrokeHistory {
    /// Batches currently part of the drawing, oldest first
    committed: Vec<Batch>,
    /// Batches that can be redone, the next one to redo last
    redo_stack: Vec<Batch>,
}

impl StrokeHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fresh batch; anything that could have been redone is dropped
    pub fn commit(&mut self, batch: Batch) {
        self.committed.push(batch);
        self.redo_stack.clear();
    }

    /// Move the newest committed batch onto the redo stack
    pub fn undo(&mut self) -> bool {
        match self.committed.pop() {
            Some(batch) => {
                self.redo_stack.push(batch);
                true
            }
            None => false,
        }
    }

    /// Move the most recently undone batch back into the drawing
    pub fn redo(&mut self) -> Option<&Batch> {
        let batch = self.redo_stack.pop()?;
        self.committed.push(batch);
        self.committed.last()
    }

    pub fn can_undo(&self) -> bool {
        !self.committed.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn committed(&self) -> &[Batch] {
        &self.committed
    }

    pub fn redo_batches(&self) -> &[Batch] {
        &self.redo_stack
    }

    /// Replace both stacks, e.g. after loading a document
    pub fn restore(&mut self, committed: Vec<Batch>, redo_stack: Vec<Batch>) {
        self.committed = committed;
        self.redo_stack = redo_stack;
    }

    pub fn clear(&mut self) {
        self.committed.clear();
        self.redo_stack.clear();
    }
}

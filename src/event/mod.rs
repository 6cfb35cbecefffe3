mod bus;
mod events;

pub use bus::EventBus;
pub use events::*;

/// Receives notifications from a drawing surface, label overlay or controller
pub trait EventHandler {
    fn handle_event(&mut self, event: &MarkupEvent);
}

impl<F: FnMut(&MarkupEvent)> EventHandler for F {
    fn handle_event(&mut self, event: &MarkupEvent) {
        self(event)
    }
}

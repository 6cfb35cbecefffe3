use std::cell::RefCell;

use crate::event::{EventHandler, MarkupEvent};

/// Broadcasts markup events to registered handlers.
///
/// Components share one bus through `Rc`; delivery is synchronous, on the
/// thread that triggered the event.
pub struct EventBus {
    handlers: RefCell<Vec<Box<dyn EventHandler>>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &format!("<{} handlers>", self.handlers.borrow().len()))
            .finish()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            handlers: RefCell::new(Vec::new()),
        }
    }

    /// Subscribe a handler to receive events.
    ///
    /// Returns false, dropping the handler, when called from inside a handler.
    pub fn subscribe(&self, handler: impl EventHandler + 'static) -> bool {
        let Ok(mut handlers) = self.handlers.try_borrow_mut() else {
            log::warn!("ignoring subscription made while an event is being delivered");
            return false;
        };
        handlers.push(Box::new(handler));
        true
    }

    /// Emit an event to all registered handlers.
    ///
    /// Handlers must not emit on the same bus while handling an event.
    pub fn emit(&self, event: MarkupEvent) {
        let Ok(mut handlers) = self.handlers.try_borrow_mut() else {
            log::warn!("dropping re-entrant event {event:?}");
            return;
        };
        for handler in handlers.iter_mut() {
            handler.handle_event(&event);
        }
    }
}

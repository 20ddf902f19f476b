use std::sync::Arc;
use parking_lot::Mutex;
use crate::event::{EditorEvent, EventHandler};
use crate::geometry::PixelRect;

/// Collects events so the host can drain them once per frame.
///
/// Clones share the same log; subscribe one clone and keep the other.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<EditorEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn drain(&self) -> Vec<EditorEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Union of every invalidated area, clearing the log.
    pub fn take_dirty_rect(&self) -> PixelRect {
        self.drain()
            .iter()
            .filter_map(EditorEvent::dirty_rect)
            .fold(PixelRect::EMPTY, |acc, rect| acc.union(&rect))
    }
}

impl EventHandler for EventLog {
    fn handle_event(&mut self, event: &EditorEvent) {
        self.events.lock().push(event.clone());
    }
}

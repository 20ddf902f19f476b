use crate::geometry::PixelRect;

#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    Document(DocumentEvent),
    History(HistoryEvent),
    ToolChanged { old: &'static str, new: &'static str },
}

#[derive(Debug, Clone, PartialEq)]
pub enum DocumentEvent {
    /// Pixels inside the rectangle changed and need redrawing.
    ContentsChanged(PixelRect),
    SizeChanged { width: u32, height: u32 },
    ModifiedChanged(bool),
    /// Selection bounds before and after; both areas need redrawing.
    SelectionChanged {
        old: Option<PixelRect>,
        new: Option<PixelRect>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum HistoryEvent {
    /// Undo/redo availability or names changed (menu text refresh).
    Changed {
        undo_name: Option<String>,
        redo_name: Option<String>,
    },
}

impl EditorEvent {
    /// The document area this event invalidates, if any.
    pub fn dirty_rect(&self) -> Option<PixelRect> {
        match self {
            EditorEvent::Document(DocumentEvent::ContentsChanged(rect)) => Some(*rect),
            EditorEvent::Document(DocumentEvent::SelectionChanged { old, new }) => {
                match (old, new) {
                    (Some(a), Some(b)) => Some(a.union(b)),
                    (Some(r), None) | (None, Some(r)) => Some(*r),
                    (None, None) => None,
                }
            }
            _ => None,
        }
    }
}

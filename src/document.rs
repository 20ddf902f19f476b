use std::path::{Path, PathBuf};
use uuid::Uuid;
use crate::color::Color;
use crate::error::PixelError;
use crate::event::{DocumentEvent, EditorEvent, EventBus};
use crate::geometry::{PixelPoint, PixelRect};
use crate::pixel_buffer::PixelBuffer;
use crate::selection::Selection;

/// Owns the canonical pixels of an image plus its current selection.
#[derive(Debug, Clone)]
pub struct Document {
    id: Uuid,
    buffer: PixelBuffer,
    selection: Option<Selection>,
    url: Option<PathBuf>,
    modified: bool,
    /// Still the single-color canvas made by [`Document::new`].
    blank: bool,
    event_bus: EventBus,
}

impl Document {
    /// A new, unsaved document filled with `background`.
    pub fn new(width: u32, height: u32, background: Color) -> Result<Self, PixelError> {
        let mut doc = Self::from_buffer(PixelBuffer::new(width, height, background)?);
        doc.blank = true;
        Ok(doc)
    }

    /// Wraps existing pixels, e.g. an opened or pasted image.

    pub fn from_buffer(buffer: PixelBuffer) -> Self {
        Self {
            id: Uuid::new_v4(),
            buffer,
            selection: None,
            url: None,
            modified: false,
            blank: false,
            event_bus: EventBus::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn rect(&self) -> PixelRect {
        self.buffer.rect()
    }

    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    /// Direct mutable access for in-place operations. Callers report what they changed via
    /// [`Document::contents_changed`].
    pub fn buffer_mut(&mut self) -> &mut PixelBuffer {
        self.blank = false;
        &mut self.buffer
    }

    pub fn url(&self) -> Option<&Path> {
        self.url.as_deref()
    }

    pub fn set_url(&mut self, url: Option<PathBuf>) {
        self.url = url;
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Created blank by [`Document::new`] and never saved or edited since.
    pub fn is_pristine(&self) -> bool {
        self.blank && self.url.is_none() && !self.modified
    }

    pub fn set_modified(&mut self, modified: bool) {
        if self.modified != modified {
            self.modified = modified;
            self.event_bus
                .emit(EditorEvent::Document(DocumentEvent::ModifiedChanged(modified)));
        }
    }

    pub fn mark_modified(&mut self) {
        self.set_modified(true);
    }

    /// Announces that `rect` changed; marks the document modified.
    pub fn contents_changed(&mut self, rect: PixelRect) {
        self.blank = false;
        self.mark_modified();
        let clipped = rect.intersect(&self.rect());
        if !clipped.is_empty() {
            self.event_bus
                .emit(EditorEvent::Document(DocumentEvent::ContentsChanged(clipped)));
        }
    }

    pub fn pixel_region(&self, rect: PixelRect) -> Result<PixelBuffer, PixelError> {
        self.buffer.region(rect)
    }

    /// Pastes `pixels` at `top_left` (clipped) and reports the change.
    pub fn set_pixel_region(&mut self, pixels: &PixelBuffer, top_left: PixelPoint) {
        self.buffer.set_region(pixels, top_left);
        self.contents_changed(PixelRect::new(
            top_left.x,
            top_left.y,
            pixels.width() as i32,
            pixels.height() as i32,
        ));
    }

    pub fn fill(&mut self, color: Color) {
        self.buffer.fill(color);
        self.contents_changed(self.rect());
    }

    /// Replaces the whole image, possibly with different dimensions.
    pub fn set_buffer(&mut self, buffer: PixelBuffer) -> PixelBuffer {
        let size_changed = buffer.width() != self.width() || buffer.height() != self.height();
        let old = std::mem::replace(&mut self.buffer, buffer);
        if size_changed {
            self.event_bus.emit(EditorEvent::Document(DocumentEvent::SizeChanged {
                width: self.width(),
                height: self.height(),
            }));
        }
        self.contents_changed(self.rect().union(&old.rect()));
        old
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Mutable selection access. Report bound changes with [`Document::selection_changed`].
    pub fn selection_mut(&mut self) -> Option<&mut Selection> {
        self.selection.as_mut()
    }

    pub fn set_selection(&mut self, selection: Option<Selection>) -> Option<Selection> {
        let old = std::mem::replace(&mut self.selection, selection);
        let new_rect = self.selection.as_ref().map(Selection::bounding_rect);
        self.selection_changed(old.as_ref().map(Selection::bounding_rect), new_rect);
        old
    }

    pub fn take_selection(&mut self) -> Option<Selection> {
        self.set_selection(None)
    }

    pub fn selection_changed(&mut self, old: Option<PixelRect>, new: Option<PixelRect>) {
        self.event_bus
            .emit(EditorEvent::Document(DocumentEvent::SelectionChanged { old, new }));
    }

    /// Moves the selection and invalidates exactly the old and new bounds.
    pub fn move_selection_by(&mut self, dx: i32, dy: i32) -> Option<[PixelRect; 2]> {
        let rects = self.selection.as_mut()?.move_by(dx, dy);
        self.selection_changed(Some(rects[0]), Some(rects[1]));
        Some(rects)
    }

    /// The current image with the selection's content painted on top, for display/export.
    pub fn composited(&self) -> PixelBuffer {
        let mut out = self.buffer.clone();
        if let Some(selection) = &self.selection {
            selection.paint_onto(&mut out);
        }
        out
    }
}

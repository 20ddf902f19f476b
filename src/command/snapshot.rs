use crate::error::PixelError;
use crate::geometry::{PixelPoint, PixelRect};
use crate::pixel_buffer::PixelBuffer;

/// A rectangular copy of pixels kept for undo.
///
/// The snapshot owns its pixels; dropping the command that holds it releases them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelSnapshot {
    rect: PixelRect,
    pixels: PixelBuffer,
}

impl PixelSnapshot {
    /// Copies `rect` (clipped to the buffer) out of `buffer`.
    pub fn capture(buffer: &PixelBuffer, rect: PixelRect) -> Result<Self, PixelError> {
        let clipped = rect.intersect(&buffer.rect());
        let pixels = buffer.region(clipped)?;
        Ok(Self {
            rect: clipped,
            pixels,
        })
    }

    pub fn capture_all(buffer: &PixelBuffer) -> Self {
        Self {
            rect: buffer.rect(),
            pixels: buffer.clone(),
        }
    }

    pub fn rect(&self) -> PixelRect {
        self.rect
    }

    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    pub fn size_bytes(&self) -> usize {
        self.pixels.size_bytes()
    }

    /// Writes the stored pixels back. Consumes the snapshot.
    pub fn restore_into(self, buffer: &mut PixelBuffer) {
        buffer.set_region(&self.pixels, self.rect.top_left());
    }

    /// Exchanges the stored pixels with what the buffer currently holds at the same place.
    ///
    /// Calling it twice is a no-op, so one snapshot serves both directions.
    pub fn swap_with(&mut self, buffer: &mut PixelBuffer) -> Result<(), PixelError> {
        buffer.swap_region(&mut self.pixels, self.rect.top_left())
    }

    /// Shrinks the snapshot to `rect`, discarding pixels outside it.
    pub fn crop_to(&mut self, rect: PixelRect) -> Result<(), PixelError> {
        let clipped = rect.intersect(&self.rect);
        let local = clipped.translated(-self.rect.x, -self.rect.y);
        self.pixels = self.pixels.region(local)?;
        self.rect = clipped;
        Ok(())
    }

    pub fn top_left(&self) -> PixelPoint {
        self.rect.top_left()
    }
}

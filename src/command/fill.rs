use crate::color::{Color, ColorSimilarity};
use crate::document::Document;
use crate::flood_fill::FloodFill;
use crate::geometry::PixelPoint;
use super::{CommandError, CommandResult, PixelSnapshot};

/// Flood fill as an undoable edit. Only the fill's bounding rectangle is kept for undo.
#[derive(Debug)]
pub struct FloodFillCommand {
    fill: FloodFill,
    before: Option<PixelSnapshot>,
}

impl FloodFillCommand {
    pub fn new(seed: PixelPoint, color: Color, similarity: ColorSimilarity) -> Self {
        Self {
            fill: FloodFill::new(seed, color, similarity),
            before: None,
        }
    }

    /// Enables the whole-canvas shortcut when `document` is still its untouched initial canvas.
    pub fn for_document(seed: PixelPoint, color: Color, similarity: ColorSimilarity, document: &Document) -> Self {
        let mut cmd = Self::new(seed, color, similarity);
        cmd.fill = cmd.fill.with_fill_entire_buffer(document.is_pristine());
        cmd
    }

    pub fn flood_fill(&self) -> &FloodFill {
        &self.fill
    }

    /// Records the seed color. Fails if the seed is outside the document.
    pub fn prepare_color_to_change(&mut self, document: &Document) -> Result<Color, CommandError> {
        Ok(self.fill.prepare_color_to_change(document.buffer())?)
    }

    pub fn size_bytes(&self) -> usize {
        self.before.as_ref().map_or(0, PixelSnapshot::size_bytes)
    }

    pub fn execute(&mut self, document: &mut Document) -> CommandResult {
        let rect = self.fill.bounding_rect(document.buffer())?;
        if rect.is_empty() {
            return Ok(());
        }

        self.before = Some(PixelSnapshot::capture(document.buffer(), rect)?);
        self.fill.fill(document.buffer_mut())?;
        document.contents_changed(rect);
        Ok(())
    }

    pub fn unexecute(&mut self, document: &mut Document) -> CommandResult {
        let Some(before) = self.before.take() else {
            log::warn!("Undo of flood fill at {} that never ran", self.fill.seed());
            return Err(CommandError::NotExecuted("Flood Fill".to_owned()));
        };

        let rect = before.rect();
        before.restore_into(document.buffer_mut());
        document.contents_changed(rect);
        Ok(())
    }
}

use crate::color::{Color, ColorSimilarity};
use crate::command::{Command, FloodFillCommand};
use crate::document::Document;
use crate::geometry::PixelPoint;
use crate::tools::Tool;

/// Fills on pointer down; the command is handed over on release.
#[derive(Debug)]
pub struct FloodFillTool {
    color: Color,
    similarity: ColorSimilarity,
    pending: Option<FloodFillCommand>,
}

impl FloodFillTool {
    pub fn new(color: Color, similarity: ColorSimilarity) -> Self {
        Self {
            color,
            similarity,
            pending: None,
        }
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn similarity(&self) -> ColorSimilarity {
        self.similarity
    }

    pub fn set_similarity(&mut self, similarity: ColorSimilarity) {
        self.similarity = similarity;
    }
}

impl Tool for FloodFillTool {
    fn name(&self) -> &'static str {
        "Flood Fill"
    }

    fn on_pointer_down(&mut self, pos: PixelPoint, doc: &mut Document) -> Option<Command> {
        self.cancel_shape(doc);

        let mut command = FloodFillCommand::for_document(pos, self.color, self.similarity, doc);
        if let Err(err) = command.prepare_color_to_change(doc) {
            log::info!("Not filling: {}", err);
            return None;
        }
        match command.execute(doc) {
            Ok(()) => self.pending = Some(command),
            Err(err) => log::warn!("Flood fill at {} failed: {}", pos, err),
        }
        None
    }

    fn on_pointer_move(&mut self, _pos: PixelPoint, _doc: &mut Document) -> Option<Command> {
        None
    }

    fn on_pointer_up(&mut self, _pos: PixelPoint, _doc: &mut Document) -> Option<Command> {
        self.pending.take().map(Command::FloodFill)
    }

    fn has_begun_shape(&self) -> bool {
        self.pending.is_some()
    }

    fn cancel_shape(&mut self, doc: &mut Document) {
        if let Some(mut command) = self.pending.take() {
            if let Err(err) = command.unexecute(doc) {
                log::warn!("Could not cancel flood fill: {}", err);
            }
        }
    }
}

use std::time::Duration;
use crate::command::Command;
use crate::document::Document;
use crate::geometry::PixelPoint;

mod fill_tool;
mod freehand_tool;
mod selection_tool;

pub use fill_tool::FloodFillTool;
pub use freehand_tool::FreehandTool;
pub use selection_tool::{SelectionTool, SelectionToolState};

/// How often the host should call [`Tool::tick`] while a timed tool (the airbrush) is held down.
pub const AIRBRUSH_TICK: Duration = Duration::from_millis(25);

/// Tool trait defines the interface for all drawing tools.
///
/// Tools draw live onto the document while the pointer is held. The command a tool returns is
/// already applied; the caller records it with `already_executed = true`.
pub trait Tool: Send {
    /// Return the name of the tool
    fn name(&self) -> &'static str;

    /// Called when the tool is selected.
    fn activate(&mut self, _doc: &Document) {}

    /// Called when another tool is selected. Cancels any shape in progress and may return a
    /// final command (e.g. committing a floating selection).
    fn deactivate(&mut self, doc: &mut Document) -> Option<Command> {
        self.cancel_shape(doc);
        None
    }

    /// Handle pointer press on the canvas.
    fn on_pointer_down(&mut self, pos: PixelPoint, doc: &mut Document) -> Option<Command>;

    /// Handle pointer movement while the pointer is held down.
    fn on_pointer_move(&mut self, pos: PixelPoint, doc: &mut Document) -> Option<Command>;

    /// Handle pointer release. Returns the finished command, if the gesture produced one.
    fn on_pointer_up(&mut self, pos: PixelPoint, doc: &mut Document) -> Option<Command>;

    /// Timer callback, every [`AIRBRUSH_TICK`] while [`Tool::wants_ticks`] is true.
    fn tick(&mut self, _doc: &mut Document) -> Option<Command> {
        None
    }

    fn wants_ticks(&self) -> bool {
        false
    }

    /// True between pointer down and pointer up of a gesture that changes something.
    fn has_begun_shape(&self) -> bool;

    /// Throws away the gesture in progress, restoring whatever it changed.
    fn cancel_shape(&mut self, doc: &mut Document);
}

/// Enum representing all available tool types
#[derive(Debug)]
pub enum ToolType {
    Freehand(FreehandTool),
    FloodFill(FloodFillTool),
    Selection(SelectionTool),
}

impl ToolType {
    pub fn is_selection_tool(&self) -> bool {
        matches!(self, Self::Selection(_))
    }

    pub fn as_selection_tool(&self) -> Option<&SelectionTool> {
        match self {
            Self::Selection(tool) => Some(tool),
            _ => None,
        }
    }

    fn inner(&self) -> &dyn Tool {
        match self {
            Self::Freehand(tool) => tool,
            Self::FloodFill(tool) => tool,
            Self::Selection(tool) => tool,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Tool {
        match self {
            Self::Freehand(tool) => tool,
            Self::FloodFill(tool) => tool,
            Self::Selection(tool) => tool,
        }
    }
}

impl Tool for ToolType {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn activate(&mut self, doc: &Document) {
        self.inner_mut().activate(doc)
    }

    fn deactivate(&mut self, doc: &mut Document) -> Option<Command> {
        self.inner_mut().deactivate(doc)
    }

    fn on_pointer_down(&mut self, pos: PixelPoint, doc: &mut Document) -> Option<Command> {
        self.inner_mut().on_pointer_down(pos, doc)
    }

    fn on_pointer_move(&mut self, pos: PixelPoint, doc: &mut Document) -> Option<Command> {
        self.inner_mut().on_pointer_move(pos, doc)
    }

    fn on_pointer_up(&mut self, pos: PixelPoint, doc: &mut Document) -> Option<Command> {
        self.inner_mut().on_pointer_up(pos, doc)
    }

    fn tick(&mut self, doc: &mut Document) -> Option<Command> {
        self.inner_mut().tick(doc)
    }

    fn wants_ticks(&self) -> bool {
        self.inner().wants_ticks()
    }

    fn has_begun_shape(&self) -> bool {
        self.inner().has_begun_shape()
    }

    fn cancel_shape(&mut self, doc: &mut Document) {
        self.inner_mut().cancel_shape(doc)
    }
}

impl From<FreehandTool> for ToolType {
    fn from(tool: FreehandTool) -> Self {
        Self::Freehand(tool)
    }
}

impl From<FloodFillTool> for ToolType {
    fn from(tool: FloodFillTool) -> Self {
        Self::FloodFill(tool)
    }
}

impl From<SelectionTool> for ToolType {
    fn from(tool: SelectionTool) -> Self {
        Self::Selection(tool)
    }
}

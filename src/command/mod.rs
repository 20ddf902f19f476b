mod context;
mod effects;
mod fill;
mod flow;
mod group;
mod history;
mod selection;
mod snapshot;
mod transform;

use thiserror::Error;
use crate::document::Document;
use crate::error::{FillError, PixelError};
use crate::geometry::PixelRect;
use crate::pixel_buffer::PixelBuffer;

pub use context::CommandContext;
pub use effects::{ColorEffect, EffectCommand, ReduceColorsMode};
pub use fill::FloodFillCommand;
pub use flow::{BrushShape, FlowCommand, FlowTool};
pub use group::MacroCommand;
pub use history::{CommandHistory, HistoryLimits};
pub use selection::SelectionCommand;
pub use snapshot::PixelSnapshot;
pub use transform::{ResizeScaleMode, Transform, TransformCommand};

/// Result type for command operations
pub type CommandResult = Result<(), CommandError>;

/// Errors that can occur during command execution. None of them leave the document half-edited.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,

    #[error("\"{0}\" was undone without having been executed")]
    NotExecuted(String),

    #[error("\"{0}\" is still being drawn")]
    StillDrawing(String),

    #[error("There is no selection")]
    NoSelection,

    #[error("The selection has no pixels")]
    NoSelectionContent,

    #[error(transparent)]
    Pixel(#[from] PixelError),

    #[error(transparent)]
    Fill(#[from] FillError),
}

/// A reversible document edit.
///
/// `unexecute()` after `execute()` restores the document exactly. Commands either store the
/// pixels they overwrite, or (when [`Command::is_invertible`]) re-apply a self-inverse function.
#[derive(Debug)]
pub enum Command {
    Effect(EffectCommand),
    Transform(TransformCommand),
    Flow(FlowCommand),
    FloodFill(FloodFillCommand),
    Selection(SelectionCommand),
    Macro(MacroCommand),
}

impl Command {
    /// Text shown in the Undo/Redo menu entries.
    pub fn name(&self) -> String {
        match self {
            Command::Effect(cmd) => cmd.name(),
            Command::Transform(cmd) => cmd.name(),
            Command::Flow(cmd) => cmd.name().to_owned(),
            Command::FloodFill(_) => "Flood Fill".to_owned(),
            Command::Selection(cmd) => cmd.name().to_owned(),
            Command::Macro(cmd) => cmd.name().to_owned(),
        }
    }

    /// Bytes of pixel data held for undo. Advisory; drives size-based history trimming.
    pub fn size_bytes(&self) -> usize {
        match self {
            Command::Effect(cmd) => cmd.size_bytes(),
            Command::Transform(cmd) => cmd.size_bytes(),
            Command::Flow(cmd) => cmd.size_bytes(),
            Command::FloodFill(cmd) => cmd.size_bytes(),
            Command::Selection(cmd) => cmd.size_bytes(),
            Command::Macro(cmd) => cmd.size_bytes(),
        }
    }

    pub fn is_invertible(&self) -> bool {
        match self {
            Command::Effect(cmd) => cmd.is_invertible(),
            Command::Transform(cmd) => cmd.is_invertible(),
            _ => false,
        }
    }

    pub fn acts_on_selection(&self) -> bool {
        match self {
            Command::Effect(cmd) => cmd.acts_on_selection(),
            Command::Transform(cmd) => cmd.acts_on_selection(),
            Command::Selection(_) => true,
            _ => false,
        }
    }

    pub fn execute(&mut self, document: &mut Document) -> CommandResult {
        match self {
            Command::Effect(cmd) => cmd.execute(document),
            Command::Transform(cmd) => cmd.execute(document),
            Command::Flow(cmd) => cmd.execute(document),
            Command::FloodFill(cmd) => cmd.execute(document),
            Command::Selection(cmd) => cmd.execute(document),
            Command::Macro(cmd) => cmd.execute(document),
        }
    }

    pub fn unexecute(&mut self, document: &mut Document) -> CommandResult {
        match self {
            Command::Effect(cmd) => cmd.unexecute(document),
            Command::Transform(cmd) => cmd.unexecute(document),
            Command::Flow(cmd) => cmd.unexecute(document),
            Command::FloodFill(cmd) => cmd.unexecute(document),
            Command::Selection(cmd) => cmd.unexecute(document),
            Command::Macro(cmd) => cmd.unexecute(document),
        }
    }
}

impl From<EffectCommand> for Command {
    fn from(cmd: EffectCommand) -> Self {
        Command::Effect(cmd)
    }
}

impl From<TransformCommand> for Command {
    fn from(cmd: TransformCommand) -> Self {
        Command::Transform(cmd)
    }
}

impl From<FlowCommand> for Command {
    fn from(cmd: FlowCommand) -> Self {
        Command::Flow(cmd)
    }
}

impl From<FloodFillCommand> for Command {
    fn from(cmd: FloodFillCommand) -> Self {
        Command::FloodFill(cmd)
    }
}

impl From<SelectionCommand> for Command {
    fn from(cmd: SelectionCommand) -> Self {
        Command::Selection(cmd)
    }
}

impl From<MacroCommand> for Command {
    fn from(cmd: MacroCommand) -> Self {
        Command::Macro(cmd)
    }
}

/// Prefix used for commands that operate on the selection rather than the whole image.
fn selection_prefixed(name: &str, act_on_selection: bool) -> String {
    if act_on_selection {
        format!("Selection: {name}")
    } else {
        name.to_owned()
    }
}

/// The pixels an effect operates on: the selection's content or the whole document.
fn target_buffer(document: &mut Document, act_on_selection: bool) -> Result<&mut PixelBuffer, CommandError> {
    if !act_on_selection {
        return Ok(document.buffer_mut());
    }

    let selection = document.selection_mut().ok_or_else(|| {
        log::warn!("Selection command without a selection");
        CommandError::NoSelection
    })?;
    selection.pixels_mut().ok_or_else(|| {
        log::warn!("Selection command on a selection without pixels");
        CommandError::NoSelectionContent
    })
}

/// Announces a change to the target and marks the document modified.
fn target_changed(document: &mut Document, act_on_selection: bool, rect: PixelRect) {
    if act_on_selection {
        let bounds = document.selection().map(|s| s.bounding_rect());
        document.selection_changed(bounds, bounds);
        document.mark_modified();
    } else {
        document.contents_changed(rect);
    }
}

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use crate::command::{
    ColorEffect, Command, CommandContext, CommandHistory, CommandResult, EffectCommand, MacroCommand,
    SelectionCommand, Transform, TransformCommand,
};
use crate::document::Document;
use crate::event::EditorEvent;
use crate::geometry::PixelPoint;
use crate::selection::{SelectionMode, SelectionTransparency};
use crate::tools::{FloodFillTool, FreehandTool, SelectionTool, Tool, ToolType};
use super::{EditorState, Settings};

/// The tools a host can switch between; [`Editor::select_tool`] builds them from the settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToolKind {
    Pen,
    Brush,
    Eraser,
    ColorWasher,
    Airbrush,
    FloodFill,
    Selection(SelectionMode),
}

/// The main context for the paint editor: one document, its history, the settings and the
/// active tool.
#[derive(Debug)]
pub struct Editor {
    document: Document,
    history: CommandHistory,
    settings: Settings,
    tool: ToolType,
    state: EditorState,
}

impl Editor {
    /// Starts with the pen selected.
    pub fn new(document: Document, settings: Settings) -> Self {
        let history = CommandHistory::with_limits(settings.history);
        let tool = build_tool(ToolKind::Pen, &settings);
        Self {
            document,
            history,
            settings,
            tool,
            state: EditorState::Idle,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn tool(&self) -> &ToolType {
        &self.tool
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    /// Replaces the settings; undo limits apply immediately, tool options from the next tool switch.
    pub fn set_settings(&mut self, settings: Settings) {
        self.history.set_limits(settings.history, &mut self.document);
        self.settings = settings;
    }

    pub fn set_undo_limit(&mut self, limit: usize) {
        self.history.set_undo_limit(limit, &mut self.document);
        self.settings.history = self.history.limits();
    }

    /// Switches tools. A shape in progress is cancelled. Leaving the selection tools for a
    /// drawing tool commits the selection as an undoable deselect; switching selection modes
    /// keeps it floating.
    pub fn select_tool(&mut self, kind: ToolKind) {
        let new_tool = build_tool(kind, &self.settings);
        let old_name = self.tool.name();

        if self.tool.is_selection_tool() && new_tool.is_selection_tool() {
            self.tool.cancel_shape(&mut self.document);
        } else if let Some(command) = self.tool.deactivate(&mut self.document) {
            self.record(command);
        }
        self.state = EditorState::Idle;

        self.tool = new_tool;
        self.tool.activate(&self.document);
        log::info!("Tool changed: {} -> {}", old_name, self.tool.name());
        self.document.event_bus().emit(EditorEvent::ToolChanged {
            old: old_name,
            new: self.tool.name(),
        });
    }

    pub fn pointer_down(&mut self, pos: PixelPoint) {
        let command = self.tool.on_pointer_down(pos, &mut self.document);
        self.after_tool_event(command);
    }

    pub fn pointer_move(&mut self, pos: PixelPoint) {
        let command = self.tool.on_pointer_move(pos, &mut self.document);
        self.after_tool_event(command);
    }

    pub fn pointer_up(&mut self, pos: PixelPoint) {
        let command = self.tool.on_pointer_up(pos, &mut self.document);
        self.after_tool_event(command);
    }

    /// Timer callback for tools that draw while held still (see [`crate::tools::AIRBRUSH_TICK`]).
    pub fn tick(&mut self) {
        if self.tool.wants_ticks() {
            let command = self.tool.tick(&mut self.document);
            self.after_tool_event(command);
        }
    }

    pub fn wants_ticks(&self) -> bool {
        self.tool.wants_ticks()
    }

    /// Cancels the shape in progress, or undoes the last command.
    pub fn undo(&mut self) -> CommandResult {
        let mut ctx = CommandContext::with_tool(&mut self.document, &mut self.tool);
        let result = self.history.undo(&mut ctx);
        self.sync_state();
        result
    }

    /// Cancels the shape in progress, or redoes the last undone command.
    pub fn redo(&mut self) -> CommandResult {
        let mut ctx = CommandContext::with_tool(&mut self.document, &mut self.tool);
        let result = self.history.redo(&mut ctx);
        self.sync_state();
        result
    }

    /// Applies a color effect to the selection if there is one, otherwise to the whole image.
    pub fn apply_effect(&mut self, effect: ColorEffect) -> CommandResult {
        self.cancel_shape();
        self.settings.remember_effect(&effect);
        let on_selection = self.document.selection().is_some();
        let command = EffectCommand::new(effect, on_selection);
        let name = command.name();
        self.execute_on_target(command.into(), name)
    }

    /// Applies a transform to the selection if there is one, otherwise to the whole image.
    pub fn apply_transform(&mut self, transform: Transform) -> CommandResult {
        self.cancel_shape();
        self.settings.remember_transform(&transform);
        let on_selection = self.document.selection().is_some();
        let command = TransformCommand::new(transform, on_selection, self.settings.background);
        let name = command.name();
        self.execute_on_target(command.into(), name)
    }

    /// Commits the selection onto the document.
    pub fn deselect(&mut self) -> CommandResult {
        self.cancel_shape();
        if self.document.selection().is_none() {
            return Ok(());
        }
        self.history.execute(SelectionCommand::deselect(), &mut self.document)
    }

    /// Remembers the rule for new selections and applies it to the current one.
    pub fn set_selection_transparency(&mut self, transparency: SelectionTransparency) -> CommandResult {
        self.settings.selection_transparency = transparency;
        if self.document.selection().is_none() {
            return Ok(());
        }
        self.history
            .execute(SelectionCommand::set_transparency(transparency), &mut self.document)
    }

    /// Records a save of the current state under `url`.
    pub fn document_saved(&mut self, url: PathBuf) {
        log::info!("Document saved to {}", url.display());
        self.document.set_url(Some(url));
        self.document.set_modified(false);
        self.history.document_saved();
    }

    /// Swaps in a different image; the history no longer applies to it.
    pub fn replace_document(&mut self, document: Document) -> Document {
        self.cancel_shape();
        let old = std::mem::replace(&mut self.document, document);
        self.history.clear(&mut self.document);
        old
    }

    fn cancel_shape(&mut self) {
        if self.tool.has_begun_shape() {
            log::debug!("Cancelling {} shape", self.tool.name());
            self.tool.cancel_shape(&mut self.document);
        }
        self.state = EditorState::Idle;
    }

    /// Commands acting on a selection without pixels lift the pixels first, as one history entry.
    fn execute_on_target(&mut self, command: Command, name: String) -> CommandResult {
        let needs_pull = command.acts_on_selection()
            && self.document.selection().is_some_and(|s| !s.has_content());
        if needs_pull {
            let group = MacroCommand::with_commands(
                name,
                vec![SelectionCommand::pull_from_document(self.settings.background).into(), command],
            );
            self.history.execute(group, &mut self.document)
        } else {
            self.history.execute(command, &mut self.document)
        }
    }

    fn after_tool_event(&mut self, command: Option<Command>) {
        if let Some(command) = command {
            self.record(command);
        }
        self.sync_state();
    }

    /// Adds a command a tool has already applied.
    fn record(&mut self, command: Command) {
        if let Err(err) = self.history.add_command(command, &mut self.document, true) {
            log::error!("Could not record tool command: {}", err);
        }
    }

    fn sync_state(&mut self) {
        self.state = if self.tool.has_begun_shape() {
            EditorState::CommandInProgress {
                tool: self.tool.name(),
            }
        } else {
            EditorState::Idle
        };
    }
}

fn build_tool(kind: ToolKind, settings: &Settings) -> ToolType {
    match kind {
        ToolKind::Pen => FreehandTool::new(crate::command::FlowTool::Pen, settings.foreground).into(),
        ToolKind::Brush => FreehandTool::new(settings.brush(), settings.foreground).into(),
        ToolKind::Eraser => FreehandTool::new(settings.eraser(), settings.background).into(),
        ToolKind::ColorWasher => FreehandTool::new(settings.color_washer(), settings.background).into(),
        ToolKind::Airbrush => FreehandTool::new(settings.airbrush(), settings.foreground).into(),
        ToolKind::FloodFill => FloodFillTool::new(settings.foreground, settings.fill_similarity).into(),
        ToolKind::Selection(mode) => {
            SelectionTool::new(mode, settings.background, settings.selection_transparency).into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::geometry::PixelRect;

    fn editor() -> Editor {
        Editor::new(Document::new(16, 16, Color::WHITE).unwrap(), Settings::default())
    }

    #[test]
    fn stroke_goes_through_in_progress_state() {
        let mut editor = editor();
        editor.pointer_down(PixelPoint::new(1, 1));
        assert_eq!(editor.state().tool_in_progress(), Some("Pen"));
        editor.pointer_move(PixelPoint::new(8, 1));
        editor.pointer_up(PixelPoint::new(8, 1));

        assert!(editor.state().is_idle());
        assert_eq!(editor.history().undo_name().as_deref(), Some("Pen"));
        assert_eq!(editor.document().buffer().pixel(4, 1), Some(Color::BLACK));
    }

    #[test]
    fn undo_during_drag_only_cancels_the_drag() {
        let mut editor = editor();
        editor.pointer_down(PixelPoint::new(1, 1));
        editor.pointer_up(PixelPoint::new(3, 1));
        let after_first = editor.document().buffer().clone();

        editor.pointer_down(PixelPoint::new(1, 5));
        editor.pointer_move(PixelPoint::new(10, 5));
        editor.undo().unwrap();

        assert!(editor.state().is_idle());
        assert_eq!(editor.document().buffer(), &after_first);
        assert_eq!(editor.history().undo_count(), 1);
    }

    #[test]
    fn leaving_selection_tool_commits_selection() {
        let mut editor = editor();
        editor.select_tool(ToolKind::Selection(SelectionMode::Rectangle));
        editor.pointer_down(PixelPoint::new(2, 2));
        editor.pointer_move(PixelPoint::new(5, 5));
        editor.pointer_up(PixelPoint::new(5, 5));
        editor.apply_effect(ColorEffect::INVERT_ALL).unwrap();
        assert!(editor.document().selection().unwrap().has_content());

        editor.select_tool(ToolKind::Pen);
        assert!(editor.document().selection().is_none());
        assert_eq!(editor.document().buffer().pixel(3, 3), Some(Color::BLACK));
        assert_eq!(editor.history().undo_name().as_deref(), Some("Deselect"));

        editor.undo().unwrap();
        assert_eq!(
            editor.document().selection().map(|s| s.bounding_rect()),
            Some(PixelRect::new(2, 2, 4, 4))
        );
    }

    #[test]
    fn switching_selection_mode_keeps_selection() {
        let mut editor = editor();
        editor.select_tool(ToolKind::Selection(SelectionMode::Rectangle));
        editor.pointer_down(PixelPoint::new(2, 2));
        editor.pointer_move(PixelPoint::new(5, 5));
        editor.pointer_up(PixelPoint::new(5, 5));
        let undo_count = editor.history().undo_count();

        editor.select_tool(ToolKind::Selection(SelectionMode::Ellipse));
        assert_eq!(
            editor.document().selection().map(|s| s.bounding_rect()),
            Some(PixelRect::new(2, 2, 4, 4))
        );
        assert_eq!(editor.history().undo_count(), undo_count);
        assert_ne!(editor.history().undo_name().as_deref(), Some("Deselect"));
    }

    #[test]
    fn saving_then_undoing_back_clears_modified() {
        let mut editor = editor();
        editor.apply_effect(ColorEffect::Grayscale).unwrap();
        editor.document_saved(PathBuf::from("/tmp/saved.png"));
        editor.apply_transform(Transform::Flip { horizontal: true, vertical: false }).unwrap();
        assert!(editor.document().is_modified());

        editor.undo().unwrap();
        assert!(!editor.document().is_modified());
    }

    #[test]
    fn effect_remembers_parameters() {
        let mut editor = editor();
        editor
            .apply_effect(ColorEffect::HsvAdjust {
                hue: 30,
                saturation: 0,
                value: -10,
            })
            .unwrap();
        assert_eq!(editor.settings().last_hsv, (30, 0, -10));
    }
}

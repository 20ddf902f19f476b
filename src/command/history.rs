use serde::{Deserialize, Serialize};
use super::{Command, CommandContext, CommandError, CommandResult};
use crate::document::Document;
use crate::event::{EditorEvent, HistoryEvent};

/// Bounds on how much undo history is retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryLimits {
    /// Always keep at least this many commands, regardless of size
    pub undo_min_limit: usize,
    /// Never keep more than this many commands
    pub undo_max_limit: usize,
    /// Between the two counts, stop keeping commands once their snapshots exceed this
    pub undo_max_limit_size_bytes: usize,
}

impl Default for HistoryLimits {
    fn default() -> Self {
        Self {
            undo_min_limit: 10,
            undo_max_limit: 500,
            undo_max_limit_size_bytes: 16 * 1024 * 1024,
        }
    }
}

impl HistoryLimits {
    /// Clamps the fields into a consistent state: `1 <= min <= max`.
    pub fn normalized(mut self) -> Self {
        self.undo_max_limit = self.undo_max_limit.max(1);
        self.undo_min_limit = self.undo_min_limit.clamp(1, self.undo_max_limit);
        self
    }
}

/// Manages the history of executed commands for undo/redo functionality
#[derive(Debug)]
pub struct CommandHistory {
    /// Commands that can be undone, most recent last
    undo_stack: Vec<Command>,
    /// Commands that can be redone, most recent last
    redo_stack: Vec<Command>,
    limits: HistoryLimits,
    /// Commands applied (positive) or undone (negative) since the last save.
    /// `None` once the saved state can no longer be reached.
    saved_offset: Option<isize>,
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandHistory {
    /// Creates a new empty command history
    pub fn new() -> Self {
        Self::with_limits(HistoryLimits::default())
    }

    pub fn with_limits(limits: HistoryLimits) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            limits: limits.normalized(),
            saved_offset: Some(0),
        }
    }

    /// Adds a command to the history, running it first unless the caller already applied it.
    ///
    /// A command that fails to execute is dropped and the history is left untouched.
    pub fn add_command(
        &mut self,
        command: impl Into<Command>,
        document: &mut Document,
        already_executed: bool,
    ) -> CommandResult {
        let mut command = command.into();
        if !already_executed {
            if let Err(err) = command.execute(document) {
                log::warn!("\"{}\" failed, not adding it to the history: {}", command.name(), err);
                return Err(err);
            }
        }

        log::debug!("Adding \"{}\" ({} bytes) to history", command.name(), command.size_bytes());
        self.undo_stack.push(command);
        if !self.redo_stack.is_empty() {
            log::debug!("Discarding {} redoable commands", self.redo_stack.len());
            self.redo_stack.clear();
        }
        self.saved_offset = match self.saved_offset {
            Some(offset) if offset >= 0 => Some(offset + 1),
            _ => None,
        };

        self.trim();
        self.history_changed(document);
        Ok(())
    }

    /// Executes a command and adds it to the history if successful
    pub fn execute(&mut self, command: impl Into<Command>, document: &mut Document) -> CommandResult {
        self.add_command(command, document, false)
    }

    /// Undo the last executed command.
    ///
    /// If the active tool is in the middle of a shape, that shape is cancelled instead.
    pub fn undo(&mut self, ctx: &mut CommandContext<'_>) -> CommandResult {
        if ctx.cancel_shape_in_progress() {
            return Ok(());
        }

        let mut command = self.undo_stack.pop().ok_or(CommandError::NothingToUndo)?;
        if let Err(err) = command.unexecute(ctx.document) {
            log::warn!("Undo of \"{}\" failed: {}", command.name(), err);
            self.undo_stack.push(command);
            return Err(err);
        }

        log::debug!("Undid \"{}\"", command.name());
        self.redo_stack.push(command);
        self.saved_offset = self.saved_offset.map(|offset| offset - 1);
        self.trim();
        self.history_changed(ctx.document);
        Ok(())
    }

    /// Redo the last undone command.
    pub fn redo(&mut self, ctx: &mut CommandContext<'_>) -> CommandResult {
        if ctx.cancel_shape_in_progress() {
            return Ok(());
        }

        let mut command = self.redo_stack.pop().ok_or(CommandError::NothingToRedo)?;
        if let Err(err) = command.execute(ctx.document) {
            log::warn!("Redo of \"{}\" failed: {}", command.name(), err);
            self.redo_stack.push(command);
            return Err(err);
        }

        log::debug!("Redid \"{}\"", command.name());
        self.undo_stack.push(command);
        self.saved_offset = self.saved_offset.map(|offset| offset + 1);
        self.trim();
        self.history_changed(ctx.document);
        Ok(())
    }

    /// Undoes up to `times` commands, stopping at the first failure. Returns how many were undone.
    pub fn undo_times(&mut self, times: usize, ctx: &mut CommandContext<'_>) -> usize {
        if ctx.cancel_shape_in_progress() {
            return 0;
        }
        (0..times).take_while(|_| self.undo(ctx).is_ok()).count()
    }

    pub fn redo_times(&mut self, times: usize, ctx: &mut CommandContext<'_>) -> usize {
        if ctx.cancel_shape_in_progress() {
            return 0;
        }
        (0..times).take_while(|_| self.redo(ctx).is_ok()).count()
    }

    /// Sets the maximum depth; the minimum is clamped to it.
    pub fn set_undo_limit(&mut self, limit: usize, document: &mut Document) {
        self.set_limits(
            HistoryLimits {
                undo_max_limit: limit,
                ..self.limits
            },
            document,
        );
    }

    pub fn set_limits(&mut self, limits: HistoryLimits, document: &mut Document) {
        self.limits = limits.normalized();
        log::info!(
            "Undo limits: {}..={} commands, {} bytes",
            self.limits.undo_min_limit,
            self.limits.undo_max_limit,
            self.limits.undo_max_limit_size_bytes
        );
        if self.trim() {
            self.history_changed(document);
        }
    }

    pub fn limits(&self) -> HistoryLimits {
        self.limits
    }

    /// Name of the command that undo would revert
    pub fn undo_name(&self) -> Option<String> {
        self.undo_stack.last().map(Command::name)
    }

    pub fn redo_name(&self) -> Option<String> {
        self.redo_stack.last().map(Command::name)
    }

    /// Undoable command names, most recent first.
    pub fn undo_names(&self) -> Vec<String> {
        self.undo_stack.iter().rev().map(Command::name).collect()
    }

    pub fn redo_names(&self) -> Vec<String> {
        self.redo_stack.iter().rev().map(Command::name).collect()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Total snapshot bytes held by both stacks.
    pub fn memory_usage(&self) -> usize {
        self.undo_stack
            .iter()
            .chain(self.redo_stack.iter())
            .map(Command::size_bytes)
            .sum()
    }

    /// Drops all history, e.g. when a different image is opened.
    pub fn clear(&mut self, document: &mut Document) {
        log::debug!(
            "Clearing history ({} undo, {} redo)",
            self.undo_stack.len(),
            self.redo_stack.len()
        );
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.saved_offset = if document.is_modified() {
            None
        } else {
            Some(0)
        };
        self.history_changed(document);
    }

    /// Records that the document was just saved in its current state.
    pub fn document_saved(&mut self) {
        self.saved_offset = Some(0);
    }

    /// Applies the limits to both stacks. Returns `true` if anything was dropped.
    fn trim(&mut self) -> bool {
        let undo_dropped = trim_stack(&mut self.undo_stack, &self.limits);
        let redo_dropped = trim_stack(&mut self.redo_stack, &self.limits);

        if let Some(offset) = self.saved_offset {
            let unreachable = (offset > 0 && offset as usize > self.undo_stack.len())
                || (offset < 0 && offset.unsigned_abs() > self.redo_stack.len());
            if unreachable {
                self.saved_offset = None;
            }
        }
        undo_dropped + redo_dropped > 0
    }

    /// Clears the modified flag when back at the saved position, then notifies listeners.
    fn history_changed(&self, document: &mut Document) {
        if self.saved_offset == Some(0) {
            document.set_modified(false);
        }
        document.event_bus().emit(EditorEvent::History(HistoryEvent::Changed {
            undo_name: self.undo_name(),
            redo_name: self.redo_name(),
        }));
    }
}

/// Drops the oldest entries of `stack` (most recent last) beyond the limits. Returns the count.
fn trim_stack(stack: &mut Vec<Command>, limits: &HistoryLimits) -> usize {
    let mut kept = 0;
    let mut size_so_far = 0usize;
    for command in stack.iter().rev() {
        if size_so_far <= limits.undo_max_limit_size_bytes {
            size_so_far = size_so_far.saturating_add(command.size_bytes());
        }
        let keep = kept < limits.undo_min_limit
            || (kept < limits.undo_max_limit && size_so_far <= limits.undo_max_limit_size_bytes);
        if !keep {
            break;
        }
        kept += 1;
    }

    let dropped = stack.len() - kept;
    if dropped > 0 {
        log::debug!("Trimming {} old commands from history", dropped);
        stack.drain(..dropped);
    }
    dropped
}

use crate::document::Document;
use super::{Command, CommandResult};

/// Several commands that undo and redo as one history entry.
#[derive(Debug)]
pub struct MacroCommand {
    name: String,
    commands: Vec<Command>,
}

impl MacroCommand {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commands: Vec::new(),
        }
    }

    pub fn with_commands(name: impl Into<String>, commands: Vec<Command>) -> Self {
        Self {
            name: name.into(),
            commands,
        }
    }

    pub fn push(&mut self, command: impl Into<Command>) {
        self.commands.push(command.into());
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn size_bytes(&self) -> usize {
        self.commands.iter().map(Command::size_bytes).sum()
    }

    /// Runs the children in order. If one fails, the ones already run are undone.
    pub fn execute(&mut self, document: &mut Document) -> CommandResult {
        for i in 0..self.commands.len() {
            if let Err(err) = self.commands[i].execute(document) {
                log::warn!("\"{}\" failed at step {}: {}", self.name, i, err);
                self.rollback(document, i, false);
                return Err(err);
            }
        }
        Ok(())
    }

    /// Undoes the children in reverse order. If one fails, the ones already undone are redone.
    pub fn unexecute(&mut self, document: &mut Document) -> CommandResult {
        for i in (0..self.commands.len()).rev() {
            if let Err(err) = self.commands[i].unexecute(document) {
                log::warn!("Undo of \"{}\" failed at step {}: {}", self.name, i, err);
                self.rollback(document, i + 1, true);
                return Err(err);
            }
        }
        Ok(())
    }

    /// Reverts steps `[from, len)` when redoing, or `[0, from)` when undoing was interrupted.
    fn rollback(&mut self, document: &mut Document, from: usize, redo: bool) {
        let result = if redo {
            self.commands[from..]
                .iter_mut()
                .try_for_each(|cmd| cmd.execute(document))
        } else {
            self.commands[..from]
                .iter_mut()
                .rev()
                .try_for_each(|cmd| cmd.unexecute(document))
        };
        if let Err(err) = result {
            log::error!("Could not roll back \"{}\": {}", self.name, err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::command::{ColorEffect, EffectCommand, SelectionCommand};
    use crate::geometry::PixelRect;
    use crate::selection::Selection;

    #[test]
    fn undoes_children_in_reverse() {
        let mut doc = Document::new(6, 6, Color::RED).unwrap();
        doc.mark_modified();
        let original = doc.buffer().clone();

        let mut group = MacroCommand::new("Move Selection");
        group.push(SelectionCommand::create(Selection::rectangle(PixelRect::new(0, 0, 2, 2))));
        group.push(SelectionCommand::pull_from_document(Color::WHITE));
        group.push(SelectionCommand::move_by(3, 3));
        group.push(SelectionCommand::deselect());
        group.execute(&mut doc).unwrap();

        assert_eq!(doc.buffer().pixel(0, 0), Some(Color::WHITE));
        assert_eq!(doc.buffer().pixel(4, 4), Some(Color::RED));
        assert!(doc.selection().is_none());

        group.unexecute(&mut doc).unwrap();
        assert_eq!(doc.buffer(), &original);
        assert!(doc.selection().is_none());
    }

    #[test]
    fn failed_step_rolls_back_earlier_steps() {
        let mut doc = Document::new(4, 4, Color::BLACK).unwrap();
        let mut group = MacroCommand::new("Broken");
        group.push(EffectCommand::new(ColorEffect::INVERT_ALL, false));
        group.push(SelectionCommand::move_by(1, 1));

        assert!(group.execute(&mut doc).is_err());
        assert!(doc.buffer().pixels().iter().all(|&c| c == Color::BLACK));
    }

    #[test]
    fn size_is_sum_of_children() {
        let group = MacroCommand::with_commands(
            "Empty",
            vec![SelectionCommand::move_by(1, 0).into(), SelectionCommand::move_by(0, 1).into()],
        );
        assert_eq!(group.len(), 2);
        assert_eq!(group.size_bytes(), 0);
    }
}

use crate::color::Color;
use crate::document::Document;
use crate::selection::{Selection, SelectionTransparency};
use super::{CommandError, CommandResult, PixelSnapshot};

/// Edits of the selection itself.
#[derive(Debug)]
pub enum SelectionCommand {
    /// Makes `selection` the current selection, remembering whatever it replaced.
    Create {
        selection: Selection,
        replaced: Option<Selection>,
    },
    /// Paints the selection's pixels onto the document and drops the selection.
    Deselect {
        removed: Option<Selection>,
        covered: Option<PixelSnapshot>,
    },
    /// Lifts the selected pixels off the document, leaving `background` behind.
    PullFromDocument {
        background: Color,
        original: Option<Selection>,
        covered: Option<PixelSnapshot>,
    },
    Move { dx: i32, dy: i32 },
    SetTransparency {
        transparency: SelectionTransparency,
        previous: Option<SelectionTransparency>,
    },
}

impl SelectionCommand {
    pub fn create(selection: Selection) -> Self {
        SelectionCommand::Create {
            selection,
            replaced: None,
        }
    }

    pub fn deselect() -> Self {
        SelectionCommand::Deselect {
            removed: None,
            covered: None,
        }
    }

    pub fn pull_from_document(background: Color) -> Self {
        SelectionCommand::PullFromDocument {
            background,
            original: None,
            covered: None,
        }
    }

    pub fn move_by(dx: i32, dy: i32) -> Self {
        SelectionCommand::Move { dx, dy }
    }

    pub fn set_transparency(transparency: SelectionTransparency) -> Self {
        SelectionCommand::SetTransparency {
            transparency,
            previous: None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SelectionCommand::Create { .. } => "Selection: Create",
            SelectionCommand::Deselect { .. } => "Deselect",
            SelectionCommand::PullFromDocument { .. } => "Selection: Pull From Document",
            SelectionCommand::Move { .. } => "Selection: Move",
            SelectionCommand::SetTransparency { .. } => "Selection: Transparency",
        }
    }

    pub fn size_bytes(&self) -> usize {
        let selection_size = |s: &Option<Selection>| s.as_ref().map_or(0, Selection::size_bytes);
        let snapshot_size = |s: &Option<PixelSnapshot>| s.as_ref().map_or(0, PixelSnapshot::size_bytes);
        match self {
            SelectionCommand::Create { selection, replaced } => selection.size_bytes() + selection_size(replaced),
            SelectionCommand::Deselect { removed, covered } => selection_size(removed) + snapshot_size(covered),
            SelectionCommand::PullFromDocument { original, covered, .. } => {
                selection_size(original) + snapshot_size(covered)
            }
            SelectionCommand::Move { .. } | SelectionCommand::SetTransparency { .. } => 0,
        }
    }

    pub fn execute(&mut self, document: &mut Document) -> CommandResult {
        match self {
            SelectionCommand::Create { selection, replaced } => {
                *replaced = document.set_selection(Some(selection.clone()));
            }
            SelectionCommand::Deselect { removed, covered } => {
                let selection = document.take_selection().ok_or_else(no_selection)?;
                if selection.has_content() {
                    let rect = selection.bounding_rect();
                    *covered = PixelSnapshot::capture(document.buffer(), rect).ok();
                    selection.paint_onto(document.buffer_mut());
                    document.contents_changed(rect);
                }
                *removed = Some(selection);
            }
            SelectionCommand::PullFromDocument { background, original, covered } => {
                let background = *background;
                let selection = document.selection().ok_or_else(no_selection)?;
                if selection.has_content() {
                    log::debug!("Selection already holds pixels, nothing to pull");
                    return Ok(());
                }
                let rect = selection.bounding_rect();
                *original = Some(selection.clone());
                *covered = PixelSnapshot::capture(document.buffer(), rect).ok();

                let mut lifted = selection.clone();
                lifted.pull_from(document.buffer_mut(), background);
                document.set_selection(Some(lifted));
                document.contents_changed(rect);
            }
            SelectionCommand::Move { dx, dy } => {
                document.move_selection_by(*dx, *dy).ok_or_else(no_selection)?;
                document.mark_modified();
            }
            SelectionCommand::SetTransparency { transparency, previous } => {
                let selection = document.selection_mut().ok_or_else(no_selection)?;
                *previous = Some(selection.transparency());
                selection.set_transparency(*transparency);
                let rect = selection.bounding_rect();
                document.selection_changed(Some(rect), Some(rect));
            }
        }
        Ok(())
    }

    pub fn unexecute(&mut self, document: &mut Document) -> CommandResult {
        let name = self.name();
        let not_executed = || {
            log::warn!("Undo of \"{name}\" before it was executed");
            CommandError::NotExecuted(name.to_owned())
        };

        match self {
            SelectionCommand::Create { replaced, .. } => {
                document.set_selection(replaced.take());
            }
            SelectionCommand::Deselect { removed, covered } => {
                let selection = removed.take().ok_or_else(not_executed)?;
                if let Some(covered) = covered.take() {
                    let rect = covered.rect();
                    covered.restore_into(document.buffer_mut());
                    document.contents_changed(rect);
                }
                document.set_selection(Some(selection));
            }
            SelectionCommand::PullFromDocument { original, covered, .. } => {
                let Some(selection) = original.take() else {
                    // Nothing was pulled.
                    return Ok(());
                };
                if let Some(covered) = covered.take() {
                    let rect = covered.rect();
                    covered.restore_into(document.buffer_mut());
                    document.contents_changed(rect);
                }
                document.set_selection(Some(selection));
            }
            SelectionCommand::Move { dx, dy } => {
                document.move_selection_by(-*dx, -*dy).ok_or_else(no_selection)?;
                document.mark_modified();
            }
            SelectionCommand::SetTransparency { previous, .. } => {
                let previous = previous.take().ok_or_else(not_executed)?;
                let selection = document.selection_mut().ok_or_else(no_selection)?;
                selection.set_transparency(previous);
                let rect = selection.bounding_rect();
                document.selection_changed(Some(rect), Some(rect));
            }
        }
        Ok(())
    }
}

fn no_selection() -> CommandError {
    log::warn!("Selection command without a selection");
    CommandError::NoSelection
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{PixelPoint, PixelRect};
    use crate::pixel_buffer::PixelBuffer;

    fn doc_with_pattern() -> Document {
        let buffer = PixelBuffer::from_fn(12, 12, |x, y| Color::rgb(x as u8 * 20, y as u8 * 20, 0)).unwrap();
        Document::from_buffer(buffer)
    }

    #[test]
    fn create_then_undo_restores_previous() {
        let mut doc = doc_with_pattern();
        let first = Selection::rectangle(PixelRect::new(0, 0, 3, 3));
        doc.set_selection(Some(first.clone()));

        let mut cmd = SelectionCommand::create(Selection::ellipse(PixelRect::new(2, 2, 5, 5)));
        cmd.execute(&mut doc).unwrap();
        assert_eq!(doc.selection().unwrap().bounding_rect(), PixelRect::new(2, 2, 5, 5));
        cmd.unexecute(&mut doc).unwrap();
        assert_eq!(doc.selection(), Some(&first));
    }

    #[test]
    fn pull_move_deselect_and_undo_everything() {
        let mut doc = doc_with_pattern();
        let original = doc.buffer().clone();
        doc.set_selection(Some(Selection::rectangle(PixelRect::new(1, 1, 3, 3))));

        let mut pull = SelectionCommand::pull_from_document(Color::WHITE);
        let mut shift = SelectionCommand::move_by(5, 4);
        let mut deselect = SelectionCommand::deselect();
        pull.execute(&mut doc).unwrap();
        assert_eq!(doc.buffer().pixel(2, 2), Some(Color::WHITE));
        shift.execute(&mut doc).unwrap();
        deselect.execute(&mut doc).unwrap();

        assert!(doc.selection().is_none());
        assert_eq!(doc.buffer().pixel(6, 5), original.pixel(1, 1));

        deselect.unexecute(&mut doc).unwrap();
        assert_eq!(doc.selection().unwrap().bounding_rect(), PixelRect::new(6, 5, 3, 3));
        shift.unexecute(&mut doc).unwrap();
        pull.unexecute(&mut doc).unwrap();

        assert_eq!(doc.buffer(), &original);
        assert!(!doc.selection().unwrap().has_content());
    }

    #[test]
    fn transparent_selection_lets_background_through() {
        let mut doc = Document::new(6, 6, Color::BLUE).unwrap();
        let mut selection = Selection::rectangle(PixelRect::new(0, 0, 2, 1));
        selection.set_pixmap(PixelBuffer::from_pixels(2, 1, vec![Color::WHITE, Color::RED]).unwrap());
        doc.set_selection(Some(selection));

        let mut transparency = SelectionCommand::set_transparency(SelectionTransparency::transparent(
            Color::WHITE,
            crate::color::ColorSimilarity::EXACT,
        ));
        transparency.execute(&mut doc).unwrap();
        SelectionCommand::deselect().execute(&mut doc).unwrap();

        assert_eq!(doc.buffer().pixel(0, 0), Some(Color::BLUE));
        assert_eq!(doc.buffer().pixel(1, 0), Some(Color::RED));
    }

    #[test]
    fn move_without_selection_fails() {
        let mut doc = doc_with_pattern();
        assert!(matches!(
            SelectionCommand::move_by(1, 1).execute(&mut doc),
            Err(CommandError::NoSelection)
        ));
        assert_eq!(doc.selection().map(|s| s.bounding_rect().top_left()), None::<PixelPoint>);
    }
}

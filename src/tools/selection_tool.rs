use crate::color::Color;
use crate::command::{Command, MacroCommand, SelectionCommand};
use crate::document::Document;
use crate::geometry::{PixelPoint, PixelRect};
use crate::selection::{Selection, SelectionMode, SelectionTransparency};
use crate::tools::Tool;

/// What the selection tool is doing between pointer down and pointer up.
#[derive(Debug, Default)]
pub enum SelectionToolState {
    #[default]
    Idle,
    /// Dragging out a new selection. The previous selection, if any, was already committed.
    Creating {
        start: PixelPoint,
        points: Vec<PixelPoint>,
        deselect: Option<SelectionCommand>,
    },
    /// Dragging the current selection around.
    Moving {
        last: PixelPoint,
        total: (i32, i32),
        pull: Option<SelectionCommand>,
    },
}

/// Rectangle, ellipse and free-form selection, plus moving the selection.
#[derive(Debug)]
pub struct SelectionTool {
    mode: SelectionMode,
    /// Left behind where pixels are lifted off the document
    background: Color,
    transparency: SelectionTransparency,
    state: SelectionToolState,
}

impl SelectionTool {
    pub fn new(mode: SelectionMode, background: Color, transparency: SelectionTransparency) -> Self {
        Self {
            mode,
            background,
            transparency,
            state: SelectionToolState::Idle,
        }
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn state(&self) -> &SelectionToolState {
        &self.state
    }

    pub fn set_background(&mut self, background: Color) {
        self.background = background;
    }

    /// The selection being dragged out, for drawing its outline.
    pub fn preview(&self, doc: &Document) -> Option<Selection> {
        match &self.state {
            SelectionToolState::Creating { start, points, .. } => self.build_selection(*start, points, doc),
            _ => None,
        }
    }

    fn build_selection(&self, start: PixelPoint, points: &[PixelPoint], doc: &Document) -> Option<Selection> {
        let end = points.last().copied().unwrap_or(start);
        let selection = match self.mode {
            SelectionMode::Rectangle | SelectionMode::Ellipse => {
                let rect = PixelRect::from_corners(start, end).intersect(&doc.rect());
                if rect.width < 2 && rect.height < 2 {
                    return None;
                }
                if self.mode == SelectionMode::Rectangle {
                    Selection::rectangle(rect)
                } else {
                    Selection::ellipse(rect)
                }
            }
            SelectionMode::FreeForm => {
                let bounds = doc.rect();
                let mut polygon = Vec::with_capacity(points.len() + 1);
                polygon.push(start);
                polygon.extend_from_slice(points);
                for point in &mut polygon {
                    point.x = point.x.clamp(bounds.left(), bounds.right());
                    point.y = point.y.clamp(bounds.top(), bounds.bottom());
                }
                polygon.dedup();
                if polygon.len() < 3 {
                    return None;
                }
                Selection::free_form(polygon)
            }
        };
        Some(selection.with_transparency(self.transparency))
    }

    /// Commits the current selection (if any) as a live-applied deselect.
    fn deselect_live(doc: &mut Document) -> Option<SelectionCommand> {
        doc.selection()?;
        let mut deselect = SelectionCommand::deselect();
        match deselect.execute(doc) {
            Ok(()) => Some(deselect),
            Err(err) => {
                log::warn!("Could not deselect: {}", err);
                None
            }
        }
    }
}

impl Tool for SelectionTool {
    fn name(&self) -> &'static str {
        match self.mode {
            SelectionMode::Rectangle => "Selection (Rectangular)",
            SelectionMode::Ellipse => "Selection (Elliptical)",
            SelectionMode::FreeForm => "Selection (Free-Form)",
        }
    }

    fn deactivate(&mut self, doc: &mut Document) -> Option<Command> {
        self.cancel_shape(doc);
        Self::deselect_live(doc).map(Command::Selection)
    }

    fn on_pointer_down(&mut self, pos: PixelPoint, doc: &mut Document) -> Option<Command> {
        self.cancel_shape(doc);

        let grabbed = doc.selection().is_some_and(|s| s.contains(pos));
        self.state = if grabbed {
            let needs_pull = doc.selection().is_some_and(|s| !s.has_content());
            let pull = needs_pull.then(|| SelectionCommand::pull_from_document(self.background));
            let pull = pull.and_then(|mut pull| match pull.execute(doc) {
                Ok(()) => Some(pull),
                Err(err) => {
                    log::warn!("Could not lift selection: {}", err);
                    None
                }
            });
            SelectionToolState::Moving {
                last: pos,
                total: (0, 0),
                pull,
            }
        } else {
            SelectionToolState::Creating {
                start: pos,
                points: Vec::new(),
                deselect: Self::deselect_live(doc),
            }
        };
        None
    }

    fn on_pointer_move(&mut self, pos: PixelPoint, doc: &mut Document) -> Option<Command> {
        match &mut self.state {
            SelectionToolState::Idle => {}
            SelectionToolState::Creating { points, .. } => {
                if points.last() != Some(&pos) {
                    points.push(pos);
                }
            }
            SelectionToolState::Moving { last, total, .. } => {
                let (dx, dy) = (pos.x - last.x, pos.y - last.y);
                if (dx, dy) != (0, 0) && doc.move_selection_by(dx, dy).is_some() {
                    total.0 += dx;
                    total.1 += dy;
                    *last = pos;
                }
            }
        }
        None
    }

    fn on_pointer_up(&mut self, pos: PixelPoint, doc: &mut Document) -> Option<Command> {
        self.on_pointer_move(pos, doc);

        match std::mem::take(&mut self.state) {
            SelectionToolState::Idle => None,
            SelectionToolState::Creating { start, points, deselect } => {
                let Some(selection) = self.build_selection(start, &points, doc) else {
                    // A click without a drag only commits the old selection.
                    return deselect.map(Command::Selection);
                };

                let mut create = SelectionCommand::create(selection);
                if let Err(err) = create.execute(doc) {
                    log::warn!("Could not create selection: {}", err);
                    return deselect.map(Command::Selection);
                }
                match deselect {
                    Some(deselect) => Some(
                        MacroCommand::with_commands(
                            "Selection: Create",
                            vec![deselect.into(), create.into()],
                        )
                        .into(),
                    ),
                    None => Some(create.into()),
                }
            }
            SelectionToolState::Moving { total, pull, .. } => {
                let mut commands: Vec<Command> = pull.into_iter().map(Command::from).collect();
                if total != (0, 0) {
                    doc.mark_modified();
                    commands.push(SelectionCommand::move_by(total.0, total.1).into());
                }
                match commands.len() {
                    0 => None,
                    1 => commands.pop(),
                    _ => Some(MacroCommand::with_commands("Selection: Move", commands).into()),
                }
            }
        }
    }

    fn has_begun_shape(&self) -> bool {
        !matches!(self.state, SelectionToolState::Idle)
    }

    fn cancel_shape(&mut self, doc: &mut Document) {
        match std::mem::take(&mut self.state) {
            SelectionToolState::Idle => {}
            SelectionToolState::Creating { deselect, .. } => {
                if let Some(mut deselect) = deselect {
                    if let Err(err) = deselect.unexecute(doc) {
                        log::warn!("Could not restore selection: {}", err);
                    }
                }
            }
            SelectionToolState::Moving { total, pull, .. } => {
                if total != (0, 0) {
                    doc.move_selection_by(-total.0, -total.1);
                }
                if let Some(mut pull) = pull {
                    if let Err(err) = pull.unexecute(doc) {
                        log::warn!("Could not put selection back: {}", err);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_tool() -> SelectionTool {
        SelectionTool::new(SelectionMode::Rectangle, Color::WHITE, SelectionTransparency::default())
    }

    fn drag(tool: &mut SelectionTool, doc: &mut Document, from: PixelPoint, to: PixelPoint) -> Option<Command> {
        tool.on_pointer_down(from, doc);
        tool.on_pointer_move(to, doc);
        tool.on_pointer_up(to, doc)
    }

    #[test]
    fn drag_creates_clipped_selection() {
        let mut doc = Document::new(10, 10, Color::WHITE).unwrap();
        let mut tool = rect_tool();
        let command = drag(&mut tool, &mut doc, PixelPoint::new(2, 3), PixelPoint::new(20, 5));

        assert!(matches!(command, Some(Command::Selection(_))));
        assert_eq!(doc.selection().unwrap().bounding_rect(), PixelRect::new(2, 3, 8, 3));
    }

    #[test]
    fn dragging_selection_lifts_and_moves_pixels() {
        let mut doc = Document::new(10, 10, Color::WHITE).unwrap();
        doc.buffer_mut().fill_rect(PixelRect::new(1, 1, 2, 2), Color::RED);
        doc.set_selection(Some(Selection::rectangle(PixelRect::new(1, 1, 2, 2))));
        let mut tool = rect_tool();

        let command = drag(&mut tool, &mut doc, PixelPoint::new(1, 1), PixelPoint::new(6, 4));
        assert!(matches!(command, Some(Command::Macro(_))));
        assert_eq!(doc.buffer().pixel(1, 1), Some(Color::WHITE));
        assert_eq!(doc.selection().unwrap().bounding_rect(), PixelRect::new(6, 4, 2, 2));
        assert_eq!(doc.composited().pixel(7, 5), Some(Color::RED));
    }

    #[test]
    fn click_outside_commits_selection() {
        let mut doc = Document::new(10, 10, Color::WHITE).unwrap();
        let mut selection = Selection::rectangle(PixelRect::new(0, 0, 2, 2));
        selection.set_pixmap(crate::pixel_buffer::PixelBuffer::new(2, 2, Color::BLUE).unwrap());
        doc.set_selection(Some(selection));
        let mut tool = rect_tool();

        let command = drag(&mut tool, &mut doc, PixelPoint::new(8, 8), PixelPoint::new(8, 8));
        assert!(matches!(command, Some(Command::Selection(SelectionCommand::Deselect { .. }))));
        assert!(doc.selection().is_none());
        assert_eq!(doc.buffer().pixel(1, 1), Some(Color::BLUE));
    }

    #[test]
    fn cancel_mid_move_restores_everything() {
        let mut doc = Document::new(10, 10, Color::WHITE).unwrap();
        doc.buffer_mut().fill_rect(PixelRect::new(1, 1, 2, 2), Color::RED);
        let original = doc.buffer().clone();
        doc.set_selection(Some(Selection::rectangle(PixelRect::new(1, 1, 2, 2))));
        let mut tool = rect_tool();

        tool.on_pointer_down(PixelPoint::new(1, 1), &mut doc);
        tool.on_pointer_move(PixelPoint::new(5, 5), &mut doc);
        assert!(tool.has_begun_shape());
        tool.cancel_shape(&mut doc);

        assert_eq!(doc.buffer(), &original);
        let selection = doc.selection().unwrap();
        assert_eq!(selection.bounding_rect(), PixelRect::new(1, 1, 2, 2));
        assert!(!selection.has_content());
    }

    #[test]
    fn free_form_needs_three_points() {
        let mut doc = Document::new(10, 10, Color::WHITE).unwrap();
        let mut tool = SelectionTool::new(SelectionMode::FreeForm, Color::WHITE, SelectionTransparency::default());

        tool.on_pointer_down(PixelPoint::new(1, 1), &mut doc);
        tool.on_pointer_move(PixelPoint::new(6, 1), &mut doc);
        assert!(tool.preview(&doc).is_none());
        tool.on_pointer_move(PixelPoint::new(6, 6), &mut doc);
        assert!(tool.preview(&doc).is_some());
        tool.on_pointer_up(PixelPoint::new(6, 6), &mut doc);

        assert_eq!(doc.selection().unwrap().bounding_rect(), PixelRect::new(1, 1, 6, 6));
    }
}

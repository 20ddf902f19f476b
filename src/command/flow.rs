use rand::Rng;
use serde::{Deserialize, Serialize};
use crate::color::{Color, ColorSimilarity};
use crate::document::Document;
use crate::geometry::{PixelPoint, PixelRect};
use crate::pixel_buffer::{MAX_DIMENSION, PixelBuffer};
use super::{CommandError, CommandResult, PixelSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BrushShape {
    #[default]
    Circle,
    Square,
}

/// Freehand tools that paint continuously while the pointer is dragged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FlowTool {
    Pen,
    Brush { width: u32, shape: BrushShape },
    /// Paints the background color with a square.
    Eraser { width: u32 },
    /// Replaces only pixels similar to `color_to_replace`.
    ColorWasher { width: u32, color_to_replace: Color, similarity: ColorSimilarity },
    Airbrush { diameter: u32, dots_per_spray: u32 },
}

impl FlowTool {
    pub fn name(&self) -> &'static str {
        match self {
            FlowTool::Pen => "Pen",
            FlowTool::Brush { .. } => "Brush",
            FlowTool::Eraser { .. } => "Eraser",
            FlowTool::ColorWasher { .. } => "Color Eraser",
            FlowTool::Airbrush { .. } => "Spraycan",
        }
    }

    /// Stamps the tool at `at`, returning the rectangle it may have touched.
    fn stamp(&self, buffer: &mut PixelBuffer, at: PixelPoint, color: Color) -> PixelRect {
        match *self {
            FlowTool::Pen => {
                buffer.set_pixel(at.x, at.y, color);
                PixelRect::new(at.x, at.y, 1, 1)
            }
            FlowTool::Brush { width, shape } => {
                let rect = centered_square(at, width);
                match shape {
                    BrushShape::Square => buffer.fill_rect(rect, color),
                    BrushShape::Circle => {
                        let radius = width as f32 / 2.0;
                        for y in rect.top()..=rect.bottom() {
                            for x in rect.left()..=rect.right() {
                                let dx = x as f32 + 0.5 - (rect.x as f32 + radius);
                                let dy = y as f32 + 0.5 - (rect.y as f32 + radius);
                                if dx * dx + dy * dy <= radius * radius {
                                    buffer.set_pixel(x, y, color);
                                }
                            }
                        }
                    }
                }
                rect
            }
            FlowTool::Eraser { width } => {
                let rect = centered_square(at, width);
                buffer.fill_rect(rect, color);
                rect
            }
            FlowTool::ColorWasher { width, color_to_replace, similarity } => {
                let rect = centered_square(at, width);
                let processed = similarity.processed();
                for y in rect.top()..=rect.bottom() {
                    for x in rect.left()..=rect.right() {
                        if buffer.pixel(x, y).is_some_and(|c| c.is_similar(&color_to_replace, processed)) {
                            buffer.set_pixel(x, y, color);
                        }
                    }
                }
                rect
            }
            // The airbrush only paints through `spray`.
            FlowTool::Airbrush { .. } => PixelRect::EMPTY,
        }
    }
}

/// Widest stamp that can still matter: it covers any canvas from any point on it.
const MAX_STAMP_WIDTH: u32 = 2 * MAX_DIMENSION + 1;

fn centered_square(center: PixelPoint, width: u32) -> PixelRect {
    let width = width.clamp(1, MAX_STAMP_WIDTH) as i32;
    PixelRect::new(center.x - width / 2, center.y - width / 2, width, width)
}

/// Points of the line from `from` to `to` (inclusive), Bresenham.
pub fn line_points(from: PixelPoint, to: PixelPoint) -> Vec<PixelPoint> {
    let dx = (to.x - from.x).abs();
    let dy = -(to.y - from.y).abs();
    let sx = if from.x < to.x { 1 } else { -1 };
    let sy = if from.y < to.y { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (from.x, from.y);

    let mut points = Vec::with_capacity((dx.max(-dy) + 1) as usize);
    loop {
        points.push(PixelPoint::new(x, y));
        if x == to.x && y == to.y {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
    points
}

/// A freehand stroke, drawn live onto the document while the user drags.
///
/// The whole image is captured when the stroke begins; [`FlowCommand::finalize`] cuts that
/// down to the stroke's bounding rectangle. Afterwards execute and unexecute both swap the
/// stored pixels with the document.
#[derive(Debug)]
pub struct FlowCommand {
    tool: FlowTool,
    color: Color,
    snapshot: Option<PixelSnapshot>,
    bounding_rect: PixelRect,
    finalized: bool,
    applied: bool,
}

impl FlowCommand {
    /// Starts a stroke. `color` is the paint color (the background color for the eraser).
    pub fn begin(tool: FlowTool, color: Color, document: &Document) -> Self {
        Self {
            tool,
            color,
            snapshot: Some(PixelSnapshot::capture_all(document.buffer())),
            bounding_rect: PixelRect::EMPTY,
            finalized: false,
            applied: true,
        }
    }

    pub fn name(&self) -> &'static str {
        self.tool.name()
    }

    pub fn tool(&self) -> &FlowTool {
        &self.tool
    }

    pub fn bounding_rect(&self) -> PixelRect {
        self.bounding_rect
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn size_bytes(&self) -> usize {
        self.snapshot.as_ref().map_or(0, PixelSnapshot::size_bytes)
    }

    /// Grows the affected area (clipped to the document).
    pub fn update_bounding_rect(&mut self, rect: PixelRect, document: &Document) {
        self.bounding_rect = self.bounding_rect.union(&rect.intersect(&document.rect()));
    }

    pub fn draw_point(&mut self, document: &mut Document, at: PixelPoint) {
        self.draw_line(document, at, at);
    }

    /// Stamps the tool along the line and reports the touched area.
    pub fn draw_line(&mut self, document: &mut Document, from: PixelPoint, to: PixelPoint) {
        if self.finalized {
            log::warn!("{} stroke drawn after it was finalized", self.name());
            return;
        }

        let mut dirty = PixelRect::EMPTY;
        for point in line_points(from, to) {
            dirty = dirty.union(&self.tool.stamp(document.buffer_mut(), point, self.color));
        }
        self.update_bounding_rect(dirty, document);
        document.contents_changed(dirty);
    }

    /// One burst of airbrush dots around `center`.
    pub fn spray(&mut self, document: &mut Document, center: PixelPoint, rng: &mut impl Rng) {
        let FlowTool::Airbrush { diameter, dots_per_spray } = self.tool else {
            self.draw_point(document, center);
            return;
        };
        if self.finalized {
            return;
        }

        let radius = (diameter.clamp(1, MAX_STAMP_WIDTH) / 2) as i32;
        let radius_sq = i64::from(radius) * i64::from(radius);
        let buffer = document.buffer_mut();
        for _ in 0..dots_per_spray {
            let dx = rng.random_range(-radius..=radius);
            let dy = rng.random_range(-radius..=radius);
            if i64::from(dx) * i64::from(dx) + i64::from(dy) * i64::from(dy) <= radius_sq {
                buffer.set_pixel(center.x.saturating_add(dx), center.y.saturating_add(dy), self.color);
            }
        }

        let dirty = centered_square(center, (radius * 2 + 1) as u32);
        self.update_bounding_rect(dirty, document);
        document.contents_changed(dirty);
    }

    /// Ends the stroke: keeps only the pixels under the bounding rectangle.
    ///
    /// Returns `false` if nothing was drawn, in which case the command should be dropped.
    pub fn finalize(&mut self) -> Result<bool, CommandError> {
        if self.finalized {
            return Ok(!self.bounding_rect.is_empty());
        }
        self.finalized = true;

        if self.bounding_rect.is_empty() {
            self.snapshot = None;
            return Ok(false);
        }
        if let Some(snapshot) = &mut self.snapshot {
            snapshot.crop_to(self.bounding_rect)?;
        }
        log::debug!("{} stroke finalized over {}", self.name(), self.bounding_rect);
        Ok(true)
    }

    /// Restores the document to how it was before the stroke. The command is spent afterwards.
    pub fn cancel(mut self, document: &mut Document) {
        let rect = self.bounding_rect;
        if let Some(mut snapshot) = self.snapshot.take() {
            if !self.finalized && !rect.is_empty() {
                if let Err(err) = snapshot.crop_to(rect) {
                    log::warn!("Cannot crop stroke snapshot: {err}");
                }
            }
            if self.applied && !rect.is_empty() {
                snapshot.restore_into(document.buffer_mut());
                document.contents_changed(rect);
            }
        }
    }

    pub fn execute(&mut self, document: &mut Document) -> CommandResult {
        if !self.finalized {
            return Err(CommandError::StillDrawing(self.name().to_owned()));
        }
        if self.applied {
            log::debug!("{} stroke is already on the document", self.name());
            return Ok(());
        }
        self.swap(document)?;
        self.applied = true;
        Ok(())
    }

    pub fn unexecute(&mut self, document: &mut Document) -> CommandResult {
        if !self.finalized {
            return Err(CommandError::StillDrawing(self.name().to_owned()));
        }
        if !self.applied {
            log::warn!("Undo of \"{}\" that is not applied", self.name());
            return Err(CommandError::NotExecuted(self.name().to_owned()));
        }
        self.swap(document)?;
        self.applied = false;
        Ok(())
    }

    fn swap(&mut self, document: &mut Document) -> CommandResult {
        let Some(snapshot) = &mut self.snapshot else {
            return Ok(());
        };
        snapshot.swap_with(document.buffer_mut())?;
        document.contents_changed(snapshot.rect());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn line_includes_both_ends() {
        let points = line_points(PixelPoint::new(0, 0), PixelPoint::new(5, 2));
        assert_eq!(points.first(), Some(&PixelPoint::new(0, 0)));
        assert_eq!(points.last(), Some(&PixelPoint::new(5, 2)));
        assert_eq!(points.len(), 6);
    }

    #[test]
    fn finalize_shrinks_snapshot_to_stroke() {
        let mut doc = Document::new(50, 50, Color::WHITE).unwrap();
        let mut stroke = FlowCommand::begin(FlowTool::Pen, Color::BLACK, &doc);
        assert_eq!(stroke.size_bytes(), 50 * 50 * std::mem::size_of::<Color>());

        stroke.draw_line(&mut doc, PixelPoint::new(10, 10), PixelPoint::new(14, 10));
        assert!(stroke.finalize().unwrap());
        assert_eq!(stroke.bounding_rect(), PixelRect::new(10, 10, 5, 1));
        assert_eq!(stroke.size_bytes(), 5 * std::mem::size_of::<Color>());
    }

    #[test]
    fn undo_redo_swaps_stroke() {
        let mut doc = Document::new(20, 20, Color::WHITE).unwrap();
        let original = doc.buffer().clone();
        let mut stroke = FlowCommand::begin(
            FlowTool::Brush { width: 3, shape: BrushShape::Square },
            Color::RED,
            &doc,
        );
        stroke.draw_line(&mut doc, PixelPoint::new(2, 2), PixelPoint::new(8, 6));
        stroke.finalize().unwrap();
        let drawn = doc.buffer().clone();

        stroke.unexecute(&mut doc).unwrap();
        assert_eq!(doc.buffer(), &original);
        stroke.execute(&mut doc).unwrap();
        assert_eq!(doc.buffer(), &drawn);
    }

    #[test]
    fn cancel_restores_document() {
        let mut doc = Document::new(20, 20, Color::WHITE).unwrap();
        let original = doc.buffer().clone();
        let mut stroke = FlowCommand::begin(FlowTool::Eraser { width: 4 }, Color::BLUE, &doc);
        stroke.draw_line(&mut doc, PixelPoint::new(0, 0), PixelPoint::new(19, 19));
        stroke.cancel(&mut doc);
        assert_eq!(doc.buffer(), &original);
    }

    #[test]
    fn empty_stroke_finalizes_to_nothing() {
        let doc = Document::new(5, 5, Color::WHITE).unwrap();
        let mut stroke = FlowCommand::begin(FlowTool::Pen, Color::BLACK, &doc);
        assert!(!stroke.finalize().unwrap());
        assert_eq!(stroke.size_bytes(), 0);
    }

    #[test]
    fn color_washer_only_touches_matching_pixels() {
        let mut doc = Document::new(10, 1, Color::WHITE).unwrap();
        doc.buffer_mut().set_pixel(5, 0, Color::BLACK);
        let mut stroke = FlowCommand::begin(
            FlowTool::ColorWasher { width: 20, color_to_replace: Color::BLACK, similarity: ColorSimilarity::EXACT },
            Color::RED,
            &doc,
        );
        stroke.draw_point(&mut doc, PixelPoint::new(5, 0));
        assert_eq!(doc.buffer().pixel(5, 0), Some(Color::RED));
        assert_eq!(doc.buffer().pixel(4, 0), Some(Color::WHITE));
    }

    #[test]
    fn spray_stays_inside_its_circle() {
        let mut doc = Document::new(30, 30, Color::WHITE).unwrap();
        let mut rng = SmallRng::seed_from_u64(7);
        let mut stroke = FlowCommand::begin(FlowTool::Airbrush { diameter: 9, dots_per_spray: 40 }, Color::BLACK, &doc);
        stroke.spray(&mut doc, PixelPoint::new(15, 15), &mut rng);
        stroke.finalize().unwrap();

        let area = stroke.bounding_rect();
        assert_eq!(area, PixelRect::new(11, 11, 9, 9));
        for y in 0..30 {
            for x in 0..30 {
                if doc.buffer().pixel(x, y) == Some(Color::BLACK) {
                    assert!(area.contains(PixelPoint::new(x, y)));
                }
            }
        }
    }

    #[test]
    fn oversized_airbrush_is_bounded() {
        let mut doc = Document::new(20, 20, Color::WHITE).unwrap();
        let mut rng = SmallRng::seed_from_u64(3);
        let tool = FlowTool::Airbrush { diameter: u32::MAX, dots_per_spray: 200 };
        let mut stroke = FlowCommand::begin(tool, Color::BLACK, &doc);
        stroke.spray(&mut doc, PixelPoint::new(10, 10), &mut rng);
        stroke.finalize().unwrap();

        assert_eq!(stroke.bounding_rect(), doc.rect());
        stroke.unexecute(&mut doc).unwrap();
        assert!(doc.buffer().pixels().iter().all(|&c| c == Color::WHITE));
    }
}

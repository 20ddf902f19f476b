use rand::SeedableRng;
use rand::rngs::SmallRng;
use crate::color::Color;
use crate::command::{Command, FlowCommand, FlowTool};
use crate::document::Document;
use crate::geometry::PixelPoint;
use crate::tools::Tool;

/// Pen, brush, eraser, color washer and airbrush.
#[derive(Debug)]
pub struct FreehandTool {
    flow_tool: FlowTool,
    color: Color,
    // Transient state: the stroke being drawn (if any)
    stroke: Option<Stroke>,
    rng: SmallRng,
}

#[derive(Debug)]
struct Stroke {
    command: FlowCommand,
    last: PixelPoint,
}

impl FreehandTool {
    /// `color` is the paint color; for the eraser, pass the background color.
    pub fn new(flow_tool: FlowTool, color: Color) -> Self {
        Self::with_rng(flow_tool, color, SmallRng::from_rng(&mut rand::rng()))
    }

    /// Same as [`FreehandTool::new`] with a reproducible airbrush pattern.
    pub fn with_seed(flow_tool: FlowTool, color: Color, seed: u64) -> Self {
        Self::with_rng(flow_tool, color, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(flow_tool: FlowTool, color: Color, rng: SmallRng) -> Self {
        Self {
            flow_tool,
            color,
            stroke: None,
            rng,
        }
    }

    pub fn flow_tool(&self) -> &FlowTool {
        &self.flow_tool
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// Takes effect from the next stroke.
    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    fn is_airbrush(&self) -> bool {
        matches!(self.flow_tool, FlowTool::Airbrush { .. })
    }
}

impl Tool for FreehandTool {
    fn name(&self) -> &'static str {
        self.flow_tool.name()
    }

    fn on_pointer_down(&mut self, pos: PixelPoint, doc: &mut Document) -> Option<Command> {
        if let Some(stroke) = self.stroke.take() {
            log::warn!("{} stroke still in progress on pointer down, cancelling it", self.name());
            stroke.command.cancel(doc);
        }

        let mut command = FlowCommand::begin(self.flow_tool, self.color, doc);
        if self.is_airbrush() {
            command.spray(doc, pos, &mut self.rng);
        } else {
            command.draw_point(doc, pos);
        }
        self.stroke = Some(Stroke { command, last: pos });
        None
    }

    fn on_pointer_move(&mut self, pos: PixelPoint, doc: &mut Document) -> Option<Command> {
        let airbrush = self.is_airbrush();
        if let Some(stroke) = &mut self.stroke {
            if airbrush {
                stroke.command.spray(doc, pos, &mut self.rng);
            } else if pos != stroke.last {
                stroke.command.draw_line(doc, stroke.last, pos);
            }
            stroke.last = pos;
        }
        None
    }

    fn on_pointer_up(&mut self, pos: PixelPoint, doc: &mut Document) -> Option<Command> {
        self.on_pointer_move(pos, doc);
        let mut stroke = self.stroke.take()?;

        match stroke.command.finalize() {
            Ok(true) => Some(Command::Flow(stroke.command)),
            Ok(false) => None,
            Err(err) => {
                log::error!("Could not finish {} stroke: {}", self.name(), err);
                stroke.command.cancel(doc);
                None
            }
        }
    }

    fn tick(&mut self, doc: &mut Document) -> Option<Command> {
        if let Some(stroke) = &mut self.stroke {
            stroke.command.spray(doc, stroke.last, &mut self.rng);
        }
        None
    }

    fn wants_ticks(&self) -> bool {
        self.is_airbrush() && self.stroke.is_some()
    }

    fn has_begun_shape(&self) -> bool {
        self.stroke.is_some()
    }

    fn cancel_shape(&mut self, doc: &mut Document) {
        if let Some(stroke) = self.stroke.take() {
            log::debug!("Cancelling {} stroke", self.name());
            stroke.command.cancel(doc);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::BrushShape;

    #[test]
    fn pen_stroke_is_applied_live_and_returned_on_release() {
        let mut doc = Document::new(10, 10, Color::WHITE).unwrap();
        let mut pen = FreehandTool::new(FlowTool::Pen, Color::BLACK);

        assert!(pen.on_pointer_down(PixelPoint::new(1, 1), &mut doc).is_none());
        pen.on_pointer_move(PixelPoint::new(5, 1), &mut doc);
        assert_eq!(doc.buffer().pixel(3, 1), Some(Color::BLACK));
        assert!(pen.has_begun_shape());

        let command = pen.on_pointer_up(PixelPoint::new(5, 1), &mut doc);
        assert!(matches!(command, Some(Command::Flow(_))));
        assert!(!pen.has_begun_shape());
    }

    #[test]
    fn cancel_restores_document() {
        let mut doc = Document::new(10, 10, Color::WHITE).unwrap();
        let original = doc.buffer().clone();
        let mut brush = FreehandTool::new(
            FlowTool::Brush {
                width: 3,
                shape: BrushShape::Square,
            },
            Color::RED,
        );
        brush.on_pointer_down(PixelPoint::new(2, 2), &mut doc);
        brush.on_pointer_move(PixelPoint::new(7, 7), &mut doc);
        brush.cancel_shape(&mut doc);

        assert_eq!(doc.buffer(), &original);
        assert!(brush.on_pointer_up(PixelPoint::new(7, 7), &mut doc).is_none());
    }

    #[test]
    fn airbrush_sprays_on_tick() {
        let mut doc = Document::new(20, 20, Color::WHITE).unwrap();
        let mut airbrush = FreehandTool::with_seed(
            FlowTool::Airbrush {
                diameter: 9,
                dots_per_spray: 5,
            },
            Color::BLUE,
            7,
        );
        airbrush.on_pointer_down(PixelPoint::new(10, 10), &mut doc);
        assert!(airbrush.wants_ticks());
        let after_down = doc.buffer().pixels().iter().filter(|&&c| c == Color::BLUE).count();
        for _ in 0..20 {
            airbrush.tick(&mut doc);
        }
        let after_ticks = doc.buffer().pixels().iter().filter(|&&c| c == Color::BLUE).count();
        assert!(after_ticks > after_down);
        assert!(airbrush.on_pointer_up(PixelPoint::new(10, 10), &mut doc).is_some());
    }
}

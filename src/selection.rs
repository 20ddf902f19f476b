use crate::color::{Color, ColorSimilarity};
use crate::geometry::{Affine, PixelPoint, PixelRect};
use crate::pixel_buffer::PixelBuffer;
use serde::{Deserialize, Serialize};

/// Number of vertices used when an ellipse has to be turned into a polygon.
const ELLIPSE_POLYGON_VERTICES: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionShape {
    Rectangle,
    Ellipse,
    FreeForm(Vec<PixelPoint>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SelectionMode {
    Rectangle,
    Ellipse,
    FreeForm,
}

/// Which pixels of a selection are see-through when it is painted onto the document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectionTransparency {
    pub opaque: bool,
    pub transparent_color: Color,
    pub similarity: ColorSimilarity,
}

impl Default for SelectionTransparency {
    fn default() -> Self {
        Self {
            opaque: true,
            transparent_color: Color::WHITE,
            similarity: ColorSimilarity::EXACT,
        }
    }
}

impl SelectionTransparency {
    /// Transparent mode: pixels similar to `transparent_color` let the document show through.
    pub fn transparent(transparent_color: Color, similarity: ColorSimilarity) -> Self {
        Self {
            opaque: false,
            transparent_color,
            similarity,
        }
    }

    pub fn is_see_through(&self, pixel: Color) -> bool {
        pixel.is_transparent()
            || (!self.opaque
                && pixel.is_similar(&self.transparent_color, self.similarity.processed()))
    }
}

/// A region of the document carrying its own pixels until it is committed.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    shape: SelectionShape,
    rect: PixelRect,
    pixels: Option<PixelBuffer>,
    transparency: SelectionTransparency,
}

impl Selection {
    pub fn rectangle(rect: PixelRect) -> Self {
        Self::with_shape(SelectionShape::Rectangle, rect)
    }

    pub fn ellipse(rect: PixelRect) -> Self {
        Self::with_shape(SelectionShape::Ellipse, rect)
    }

    pub fn free_form(points: Vec<PixelPoint>) -> Self {
        let rect = PixelRect::from_points(&points);
        Self::with_shape(SelectionShape::FreeForm(points), rect)
    }

    fn with_shape(shape: SelectionShape, rect: PixelRect) -> Self {
        Self {
            shape,
            rect,
            pixels: None,
            transparency: SelectionTransparency::default(),
        }
    }

    pub fn with_transparency(mut self, transparency: SelectionTransparency) -> Self {
        self.transparency = transparency;
        self
    }

    pub fn shape(&self) -> &SelectionShape {
        &self.shape
    }

    pub fn mode(&self) -> SelectionMode {
        match self.shape {
            SelectionShape::Rectangle => SelectionMode::Rectangle,
            SelectionShape::Ellipse => SelectionMode::Ellipse,
            SelectionShape::FreeForm(_) => SelectionMode::FreeForm,
        }
    }

    pub fn bounding_rect(&self) -> PixelRect {
        self.rect
    }

    pub fn transparency(&self) -> SelectionTransparency {
        self.transparency
    }

    pub fn set_transparency(&mut self, transparency: SelectionTransparency) {
        self.transparency = transparency;
    }

    /// `true` once pixels have been lifted from the document or pasted in.
    pub fn has_content(&self) -> bool {
        self.pixels.is_some()
    }

    pub fn pixels(&self) -> Option<&PixelBuffer> {
        self.pixels.as_ref()
    }

    pub fn pixels_mut(&mut self) -> Option<&mut PixelBuffer> {
        self.pixels.as_mut()
    }

    pub fn take_pixels(&mut self) -> Option<PixelBuffer> {
        self.pixels.take()
    }

    pub fn size_bytes(&self) -> usize {
        let points = match &self.shape {
            SelectionShape::FreeForm(points) => points.len() * std::mem::size_of::<PixelPoint>(),
            _ => 0,
        };
        points + self.pixels.as_ref().map_or(0, PixelBuffer::size_bytes)
    }

    pub fn contains(&self, point: PixelPoint) -> bool {
        if !self.rect.contains(point) {
            return false;
        }

        match &self.shape {
            SelectionShape::Rectangle => true,
            SelectionShape::Ellipse => {
                let rx = self.rect.width as f32 / 2.0;
                let ry = self.rect.height as f32 / 2.0;
                let dx = (point.x as f32 + 0.5 - (self.rect.x as f32 + rx)) / rx;
                let dy = (point.y as f32 + 0.5 - (self.rect.y as f32 + ry)) / ry;
                dx * dx + dy * dy <= 1.0
            }
            SelectionShape::FreeForm(points) => polygon_contains(points, point),
        }
    }

    /// Translates the selection. Returns the old and new bounding rectangles (both need redrawing).
    pub fn move_by(&mut self, dx: i32, dy: i32) -> [PixelRect; 2] {
        let old = self.rect;
        self.rect = self.rect.translated(dx, dy);
        if let SelectionShape::FreeForm(points) = &mut self.shape {
            for point in points.iter_mut() {
                *point = point.offset(dx, dy);
            }
        }
        [old, self.rect]
    }

    /// Moves the top-left corner to `point`.
    pub fn move_to(&mut self, point: PixelPoint) -> [PixelRect; 2] {
        self.move_by(point.x - self.rect.x, point.y - self.rect.y)
    }

    /// Replaces the selection's pixels. A differently sized pixmap resizes the shape to match,
    /// anchored at the current top-left.
    pub fn set_pixmap(&mut self, pixmap: PixelBuffer) {
        let (new_width, new_height) = (pixmap.width() as i32, pixmap.height() as i32);
        if new_width != self.rect.width || new_height != self.rect.height {
            self.resize_shape(new_width, new_height);
        }
        self.pixels = Some(pixmap);
    }

    fn resize_shape(&mut self, new_width: i32, new_height: i32) {
        let old = self.rect;
        let resized = old.with_size(new_width, new_height);

        if let SelectionShape::FreeForm(points) = &self.shape {
            if old.width <= 1 || old.height <= 1 {
                // A degenerate polygon cannot be scaled into a 2D area.
                self.shape = SelectionShape::Rectangle;
            } else {
                let scale = Affine::translate(-old.x as f32, -old.y as f32)
                    .then(&Affine::scale(
                        (new_width - 1) as f32 / (old.width - 1) as f32,
                        (new_height - 1) as f32 / (old.height - 1) as f32,
                    ))
                    .then(&Affine::translate(old.x as f32, old.y as f32));
                let scaled = points.iter().map(|&p| scale.map_point(p)).collect();
                self.shape = SelectionShape::FreeForm(scaled);
            }
        }
        self.rect = resized;
    }

    /// Mirrors the shape inside its bounding rectangle.
    pub fn flip_shape(&mut self, horizontal: bool, vertical: bool) {
        let rect = self.rect;
        if let SelectionShape::FreeForm(points) = &mut self.shape {
            for point in points.iter_mut() {
                if horizontal {
                    point.x = rect.left() + rect.right() - point.x;
                }
                if vertical {
                    point.y = rect.top() + rect.bottom() - point.y;
                }
            }
        }
    }

    /// Outline of the shape as a polygon.
    pub fn outline(&self) -> Vec<PixelPoint> {
        let r = self.rect;
        match &self.shape {
            SelectionShape::Rectangle => vec![
                PixelPoint::new(r.left(), r.top()),
                PixelPoint::new(r.right(), r.top()),
                PixelPoint::new(r.right(), r.bottom()),
                PixelPoint::new(r.left(), r.bottom()),
            ],
            SelectionShape::Ellipse => {
                let rx = (r.width - 1) as f32 / 2.0;
                let ry = (r.height - 1) as f32 / 2.0;
                let (cx, cy) = (r.x as f32 + rx, r.y as f32 + ry);
                (0..ELLIPSE_POLYGON_VERTICES)
                    .map(|i| {
                        let angle = i as f32 / ELLIPSE_POLYGON_VERTICES as f32 * std::f32::consts::TAU;
                        PixelPoint::new(
                            (cx + rx * angle.cos()).round() as i32,
                            (cy + ry * angle.sin()).round() as i32,
                        )
                    })
                    .collect()
            }
            SelectionShape::FreeForm(points) => points.clone(),
        }
    }

    /// Applies `transform` to the outline (the result becomes free-form), keeps the shape
    /// centred where it was, and installs `pixmap` as the new content.
    pub fn transform_shape(&mut self, transform: &Affine, pixmap: PixelBuffer) {
        let old = self.rect;
        let mapped: Vec<PixelPoint> = self.outline().iter().map(|&p| transform.map_point(p)).collect();
        let bounds = PixelRect::from_points(&mapped);

        let dx = (old.x + old.width / 2) - (bounds.x + bounds.width / 2);
        let dy = (old.y + old.height / 2) - (bounds.y + bounds.height / 2);
        let points: Vec<PixelPoint> = mapped.iter().map(|p| p.offset(dx, dy)).collect();

        self.rect = PixelRect::from_points(&points);
        self.shape = SelectionShape::FreeForm(points);
        self.set_pixmap(pixmap);
    }

    /// Copies the selected pixels out of `buffer` and leaves `background` behind.
    ///
    /// Pixels inside the bounding rectangle but outside the shape become transparent in the
    /// selection's content.
    pub fn pull_from(&mut self, buffer: &mut PixelBuffer, background: Color) {
        let rect = self.rect;
        let content = PixelBuffer::from_fn(rect.width.max(1) as u32, rect.height.max(1) as u32, |x, y| {
            let point = PixelPoint::new(rect.x + x as i32, rect.y + y as i32);
            if self.contains(point) {
                buffer.pixel(point.x, point.y).unwrap_or(Color::Transparent)
            } else {
                Color::Transparent
            }
        });

        match content {
            Ok(content) => {
                for y in rect.top()..=rect.bottom() {
                    for x in rect.left()..=rect.right() {
                        if self.contains(PixelPoint::new(x, y)) {
                            buffer.set_pixel(x, y, background);
                        }
                    }
                }
                self.pixels = Some(content);
            }
            Err(err) => log::warn!("Cannot lift selection {}: {}", rect, err),
        }
    }

    /// Paints the content onto `buffer`, honouring the shape and the transparency rule.
    pub fn paint_onto(&self, buffer: &mut PixelBuffer) {
        let Some(pixels) = &self.pixels else {
            return;
        };

        for y in 0..pixels.height() as i32 {
            for x in 0..pixels.width() as i32 {
                let point = PixelPoint::new(self.rect.x + x, self.rect.y + y);
                let Some(color) = pixels.pixel(x, y) else {
                    continue;
                };
                if self.contains(point) && !self.transparency.is_see_through(color) {
                    buffer.set_pixel(point.x, point.y, color);
                }
            }
        }
    }
}

/// Even-odd test of the pixel centre against the polygon.
fn polygon_contains(points: &[PixelPoint], point: PixelPoint) -> bool {
    if points.len() < 3 {
        return points.contains(&point);
    }
    if points.contains(&point) {
        return true;
    }

    let (px, py) = (point.x as f32 + 0.5, point.y as f32 + 0.5);
    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let (xi, yi) = (points[i].x as f32 + 0.5, points[i].y as f32 + 0.5);
        let (xj, yj) = (points[j].x as f32 + 0.5, points[j].y as f32 + 0.5);
        if (yi > py) != (yj > py) && px < (xj - xi) * (py - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ellipse_excludes_corners() {
        let selection = Selection::ellipse(PixelRect::new(0, 0, 10, 10));
        assert!(!selection.contains(PixelPoint::new(0, 0)));
        assert!(selection.contains(PixelPoint::new(5, 5)));
        assert!(!selection.contains(PixelPoint::new(9, 9)));
        assert!(selection.contains(PixelPoint::new(0, 5)));
    }

    #[test]
    fn free_form_bounds_are_tight() {
        let selection = Selection::free_form(vec![
            PixelPoint::new(2, 2),
            PixelPoint::new(8, 2),
            PixelPoint::new(2, 8),
        ]);
        assert_eq!(selection.bounding_rect(), PixelRect::new(2, 2, 7, 7));
        assert!(selection.contains(PixelPoint::new(3, 3)));
        assert!(!selection.contains(PixelPoint::new(7, 7)));
    }

    #[test]
    fn move_reports_both_rects() {
        let mut selection = Selection::free_form(vec![
            PixelPoint::new(0, 0),
            PixelPoint::new(4, 0),
            PixelPoint::new(0, 4),
        ]);
        let [old, new] = selection.move_by(3, 1);
        assert_eq!(old, PixelRect::new(0, 0, 5, 5));
        assert_eq!(new, PixelRect::new(3, 1, 5, 5));
        assert_eq!(PixelRect::from_points(&selection.outline()), new);
    }

    #[test]
    fn set_pixmap_rescales_free_form() {
        let mut selection = Selection::free_form(vec![
            PixelPoint::new(10, 10),
            PixelPoint::new(14, 10),
            PixelPoint::new(14, 14),
        ]);
        selection.set_pixmap(PixelBuffer::new(9, 3, Color::RED).unwrap());
        assert_eq!(selection.bounding_rect(), PixelRect::new(10, 10, 9, 3));
        assert_eq!(PixelRect::from_points(&selection.outline()), selection.bounding_rect());
    }

    #[test]
    fn set_pixmap_resizes_rectangle_in_place() {
        let mut selection = Selection::rectangle(PixelRect::new(4, 5, 2, 2));
        selection.set_pixmap(PixelBuffer::new(6, 7, Color::RED).unwrap());
        assert_eq!(selection.bounding_rect(), PixelRect::new(4, 5, 6, 7));
    }

    #[test]
    fn see_through_respects_rule() {
        let opaque = SelectionTransparency::default();
        assert!(!opaque.is_see_through(Color::WHITE));
        assert!(opaque.is_see_through(Color::Transparent));

        let transparent = SelectionTransparency::transparent(Color::WHITE, ColorSimilarity::from_percent(5));
        assert!(transparent.is_see_through(Color::rgb(250, 250, 250)));
        assert!(!transparent.is_see_through(Color::BLACK));
    }

    #[test]
    fn pull_and_paint_round_trip() {
        let mut buffer = PixelBuffer::from_fn(6, 6, |x, _| Color::rgb(x as u8 * 10, 0, 0)).unwrap();
        let original = buffer.clone();
        let mut selection = Selection::rectangle(PixelRect::new(1, 1, 3, 3));
        selection.pull_from(&mut buffer, Color::WHITE);
        assert_eq!(buffer.pixel(2, 2), Some(Color::WHITE));
        selection.paint_onto(&mut buffer);
        assert_eq!(buffer, original);
    }
}

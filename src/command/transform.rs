use serde::{Deserialize, Serialize};
use crate::color::Color;
use crate::document::Document;
use crate::error::PixelError;
use crate::geometry::Affine;
use crate::pixel_buffer::PixelBuffer;
use crate::selection::Selection;
use super::{CommandError, CommandResult, selection_prefixed};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ResizeScaleMode {
    /// Change the canvas size; existing pixels keep their place.
    #[default]
    Resize,
    /// Stretch the pixels (nearest neighbour).
    Scale,
    /// Stretch the pixels with interpolation.
    SmoothScale,
}

/// A geometric image transformation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Transform {
    Flip { horizontal: bool, vertical: bool },
    /// Clockwise.
    Rotate { degrees: f32 },
    Skew { horizontal_degrees: f32, vertical_degrees: f32 },
    ResizeScale { width: u32, height: u32, mode: ResizeScaleMode },
}

impl Transform {
    pub fn name(&self) -> &'static str {
        match self {
            Transform::Flip { horizontal: true, vertical: true } => "Rotate 180 Degrees",
            Transform::Flip { horizontal: true, .. } => "Flip Horizontally",
            Transform::Flip { .. } => "Flip Vertically",
            Transform::Rotate { .. } => "Rotate",
            Transform::Skew { .. } => "Skew",
            Transform::ResizeScale { mode: ResizeScaleMode::Resize, .. } => "Resize",
            Transform::ResizeScale { mode: ResizeScaleMode::Scale, .. } => "Scale",
            Transform::ResizeScale { mode: ResizeScaleMode::SmoothScale, .. } => "Smooth Scale",
        }
    }

    /// Produces the transformed pixels; newly exposed areas get `background`.
    pub fn apply(&self, source: &PixelBuffer, background: Color) -> Result<PixelBuffer, PixelError> {
        let (w, h) = (source.width() as i32, source.height() as i32);
        let at = |x: i32, y: i32| source.pixel(x, y).unwrap_or(background);

        match *self {
            Transform::Flip { horizontal, vertical } => {
                PixelBuffer::from_fn(source.width(), source.height(), |x, y| {
                    let sx = if horizontal {
                        w - 1 - x as i32
                    } else {
                        x as i32
                    };
                    let sy = if vertical { h - 1 - y as i32 } else { y as i32 };
                    at(sx, sy)
                })
            }
            Transform::Rotate { degrees } => match quarter_turns(degrees) {
                Some(0) => Ok(source.clone()),
                Some(1) => PixelBuffer::from_fn(source.height(), source.width(), |x, y| {
                    at(y as i32, h - 1 - x as i32)
                }),
                Some(2) => Transform::Flip { horizontal: true, vertical: true }.apply(source, background),
                Some(_) => PixelBuffer::from_fn(source.height(), source.width(), |x, y| {
                    at(w - 1 - y as i32, x as i32)
                }),
                None => map_affine(source, &Affine::rotate_degrees(degrees), background),
            },
            Transform::Skew { horizontal_degrees, vertical_degrees } => map_affine(
                source,
                &Affine::skew_degrees(horizontal_degrees, vertical_degrees),
                background,
            ),
            Transform::ResizeScale { width, height, mode } => match mode {
                ResizeScaleMode::Resize => {
                    let mut out = PixelBuffer::new(width, height, background)?;
                    out.set_region(source, crate::geometry::PixelPoint::new(0, 0));
                    Ok(out)
                }
                ResizeScaleMode::Scale | ResizeScaleMode::SmoothScale => {
                    // Reject bad target sizes before resampling.
                    PixelBuffer::new(width, height, background)?;
                    let filter = if mode == ResizeScaleMode::Scale {
                        image::imageops::FilterType::Nearest
                    } else {
                        image::imageops::FilterType::Triangle
                    };
                    let scaled = image::imageops::resize(&source.to_rgba_image(), width, height, filter);
                    PixelBuffer::from_rgba_image(&scaled)
                }
            },
        }
    }

    /// The shape transform applied to a selection outline, when not a plain resize or flip.
    fn outline_affine(&self) -> Option<Affine> {
        match *self {
            Transform::Rotate { degrees } => Some(Affine::rotate_degrees(degrees)),
            Transform::Skew { horizontal_degrees, vertical_degrees } => {
                Some(Affine::skew_degrees(horizontal_degrees, vertical_degrees))
            }
            _ => None,
        }
    }
}

/// `Some(n)` for a multiple of 90 degrees (n clockwise quarter turns, `0..4`).
fn quarter_turns(degrees: f32) -> Option<u32> {
    let normalized = degrees.rem_euclid(360.0);
    let turns = (normalized / 90.0).round();
    ((normalized - turns * 90.0).abs() < 1e-3).then_some(turns as u32 % 4)
}

/// Resamples `source` through `transform` (nearest neighbour), sizing the output to the
/// transformed bounds.
fn map_affine(source: &PixelBuffer, transform: &Affine, background: Color) -> Result<PixelBuffer, PixelError> {
    let (w, h) = (source.width() as f32, source.height() as f32);
    let corners = [(0.0, 0.0), (w, 0.0), (0.0, h), (w, h)].map(|(x, y)| transform.map(x, y));
    let min_x = corners.iter().map(|c| c.0).fold(f32::INFINITY, f32::min);
    let min_y = corners.iter().map(|c| c.1).fold(f32::INFINITY, f32::min);
    let max_x = corners.iter().map(|c| c.0).fold(f32::NEG_INFINITY, f32::max);
    let max_y = corners.iter().map(|c| c.1).fold(f32::NEG_INFINITY, f32::max);

    let out_width = (max_x - min_x).round().max(1.0) as u32;
    let out_height = (max_y - min_y).round().max(1.0) as u32;

    let Some(inverse) = transform.inverse() else {
        return PixelBuffer::new(out_width, out_height, background);
    };

    PixelBuffer::from_fn(out_width, out_height, |x, y| {
        let (sx, sy) = inverse.map(x as f32 + 0.5 + min_x, y as f32 + 0.5 + min_y);
        source
            .pixel(sx.floor() as i32, sy.floor() as i32)
            .unwrap_or(background)
    })
}

#[derive(Debug)]
enum TransformBefore {
    Document(PixelBuffer),
    Selection(Selection),
}

/// Applies a [`Transform`] to the document or to the selection.
#[derive(Debug)]
pub struct TransformCommand {
    transform: Transform,
    act_on_selection: bool,
    background: Color,
    before: Option<TransformBefore>,
    executed: bool,
}

impl TransformCommand {
    /// `background` fills areas the transform exposes on the document. Exposed selection
    /// areas are always transparent.
    pub fn new(transform: Transform, act_on_selection: bool, background: Color) -> Self {
        Self {
            transform,
            act_on_selection,
            background,
            before: None,
            executed: false,
        }
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn name(&self) -> String {
        selection_prefixed(self.transform.name(), self.act_on_selection)
    }

    pub fn acts_on_selection(&self) -> bool {
        self.act_on_selection
    }

    /// Flips are their own inverse; so is a half turn of the whole image.
    pub fn is_invertible(&self) -> bool {
        match self.transform {
            Transform::Flip { .. } => true,
            Transform::Rotate { degrees } => !self.act_on_selection && quarter_turns(degrees) == Some(2),
            _ => false,
        }
    }

    pub fn size_bytes(&self) -> usize {
        match &self.before {
            Some(TransformBefore::Document(buffer)) => buffer.size_bytes(),
            Some(TransformBefore::Selection(selection)) => selection.size_bytes(),
            None => 0,
        }
    }

    pub fn execute(&mut self, document: &mut Document) -> CommandResult {
        if self.act_on_selection {
            self.execute_on_selection(document)?;
        } else {
            let transformed = self.transform.apply(document.buffer(), self.background)?;
            let old = document.set_buffer(transformed);
            if !self.is_invertible() {
                self.before = Some(TransformBefore::Document(old));
            }
        }
        self.executed = true;
        Ok(())
    }

    fn execute_on_selection(&mut self, document: &mut Document) -> CommandResult {
        let invertible = self.is_invertible();
        let selection = document.selection_mut().ok_or(CommandError::NoSelection)?;
        let pixels = selection.pixels().ok_or(CommandError::NoSelectionContent)?;
        let transformed = self.transform.apply(pixels, Color::Transparent)?;

        let old_rect = selection.bounding_rect();
        if !invertible {
            self.before = Some(TransformBefore::Selection(selection.clone()));
        }

        match (self.transform, self.transform.outline_affine()) {
            (Transform::Flip { horizontal, vertical }, _) => {
                selection.flip_shape(horizontal, vertical);
                selection.set_pixmap(transformed);
            }
            (_, Some(affine)) => selection.transform_shape(&affine, transformed),
            _ => selection.set_pixmap(transformed),
        }

        let new_rect = selection.bounding_rect();
        document.selection_changed(Some(old_rect), Some(new_rect));
        document.mark_modified();
        Ok(())
    }

    pub fn unexecute(&mut self, document: &mut Document) -> CommandResult {
        if !self.executed {
            log::warn!("Undo of \"{}\" before it was executed", self.name());
            return Err(CommandError::NotExecuted(self.name()));
        }

        if self.is_invertible() {
            self.execute(document)?;
        } else {
            match self.before.take() {
                Some(TransformBefore::Document(buffer)) => {
                    document.set_buffer(buffer);
                }
                Some(TransformBefore::Selection(selection)) => {
                    document.set_selection(Some(selection));
                    document.mark_modified();
                }
                None => return Err(CommandError::NotExecuted(self.name())),
            }
        }
        self.executed = false;
        Ok(())
    }
}

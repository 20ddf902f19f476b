use crate::geometry::{PixelPoint, PixelRect};
use thiserror::Error;

/// Errors raised by pixel buffer access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PixelError {
    #[error("Rectangle {rect} lies outside the {width}x{height} buffer")]
    OutOfBounds { rect: PixelRect, width: u32, height: u32 },

    #[error("Pixel buffer is empty")]
    EmptyBuffer,

    #[error("Invalid buffer dimensions {width}x{height} (max {max})")]
    InvalidDimensions { width: u32, height: u32, max: u32 },

    #[error("Pixel data length {actual} does not match {width}x{height}")]
    SizeMismatch { width: u32, height: u32, actual: usize },
}

/// Errors raised by the flood fill engine. Both are recoverable: the fill becomes a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FillError {
    #[error("Fill seed {seed} lies outside the {width}x{height} buffer")]
    SeedOutOfBounds { seed: PixelPoint, width: u32, height: u32 },

    #[error("Cannot fill an empty pixel buffer")]
    EmptyBuffer,
}

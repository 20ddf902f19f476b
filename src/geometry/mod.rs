mod affine;
mod rect;

pub use affine::Affine;
pub use rect::{PixelPoint, PixelRect};

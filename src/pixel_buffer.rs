use crate::color::Color;
use crate::error::PixelError;
use crate::geometry::{PixelPoint, PixelRect};

/// Largest width or height a document may have.
pub const MAX_DIMENSION: u32 = 4000;

/// An owned grid of [`Color`]s, stored row-major.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("pixels", &format!("<{} pixels>", self.pixels.len()))
            .finish()
    }
}

impl PixelBuffer {
    /// Creates a `width` x `height` buffer filled with `fill`.
    pub fn new(width: u32, height: u32, fill: Color) -> Result<Self, PixelError> {
        validate_dimensions(width, height)?;
        Ok(Self {
            width,
            height,
            pixels: vec![fill; width as usize * height as usize],
        })
    }

    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Color>) -> Result<Self, PixelError> {
        validate_dimensions(width, height)?;
        if pixels.len() != width as usize * height as usize {
            return Err(PixelError::SizeMismatch {
                width,
                height,
                actual: pixels.len(),
            });
        }
        Ok(Self { width, height, pixels })
    }

    /// Builds a buffer from a generator called once per pixel.
    pub fn from_fn(
        width: u32,
        height: u32,
        mut f: impl FnMut(u32, u32) -> Color,
    ) -> Result<Self, PixelError> {
        validate_dimensions(width, height)?;
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Ok(Self { width, height, pixels })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// The rectangle covered by this buffer, anchored at the origin.
    pub fn rect(&self) -> PixelRect {
        PixelRect::new(0, 0, self.width as i32, self.height as i32)
    }

    pub fn contains(&self, point: PixelPoint) -> bool {
        self.rect().contains(point)
    }

    /// Approximate heap footprint of the pixel data.
    pub fn size_bytes(&self) -> usize {
        self.pixels.len() * std::mem::size_of::<Color>()
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Color> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// Writes one pixel. Writes outside the buffer are dropped.
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Color) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color;
        }
    }

    /// Mutable access to one row.
    pub fn row_mut(&mut self, y: u32) -> &mut [Color] {
        let start = y as usize * self.width as usize;
        &mut self.pixels[start..start + self.width as usize]
    }

    pub fn row(&self, y: u32) -> &[Color] {
        let start = y as usize * self.width as usize;
        &self.pixels[start..start + self.width as usize]
    }

    pub fn fill(&mut self, color: Color) {
        self.pixels.fill(color);
    }

    /// Fills the part of `rect` that lies inside the buffer.
    pub fn fill_rect(&mut self, rect: PixelRect, color: Color) {
        let clipped = rect.intersect(&self.rect());
        if clipped.is_empty() {
            return;
        }
        for y in clipped.top()..=clipped.bottom() {
            let row = self.row_mut(y as u32);
            row[clipped.left() as usize..=clipped.right() as usize].fill(color);
        }
    }

    /// Fills one horizontal run `x1..=x2` of row `y`, clipped to the buffer.
    pub fn fill_span(&mut self, y: i32, x1: i32, x2: i32, color: Color) {
        self.fill_rect(PixelRect::new(x1, y, x2 - x1 + 1, 1), color);
    }

    /// Copies out `rect`, which must lie fully inside the buffer.
    pub fn region(&self, rect: PixelRect) -> Result<PixelBuffer, PixelError> {
        if rect.is_empty() || !self.rect().contains_rect(&rect) {
            return Err(PixelError::OutOfBounds {
                rect,
                width: self.width,
                height: self.height,
            });
        }

        let mut pixels = Vec::with_capacity(rect.area());
        for y in rect.top()..=rect.bottom() {
            let row = self.row(y as u32);
            pixels.extend_from_slice(&row[rect.left() as usize..=rect.right() as usize]);
        }
        Ok(PixelBuffer {
            width: rect.width as u32,
            height: rect.height as u32,
            pixels,
        })
    }

    /// Pastes `source` with its top-left at `top_left`. Parts outside the buffer are clipped.
    pub fn set_region(&mut self, source: &PixelBuffer, top_left: PixelPoint) {
        self.blit(source, top_left, |_| true);
    }

    /// Like [`PixelBuffer::set_region`] but only copies pixels accepted by `keep`.
    pub fn blit(&mut self, source: &PixelBuffer, top_left: PixelPoint, keep: impl Fn(Color) -> bool) {
        let target = PixelRect::new(
            top_left.x,
            top_left.y,
            source.width as i32,
            source.height as i32,
        )
        .intersect(&self.rect());
        if target.is_empty() {
            return;
        }

        for y in target.top()..=target.bottom() {
            let src_y = (y - top_left.y) as u32;
            for x in target.left()..=target.right() {
                let src_x = x - top_left.x;
                let color = source.pixels[src_y as usize * source.width as usize + src_x as usize];
                if keep(color) {
                    self.set_pixel(x, y, color);
                }
            }
        }
    }

    /// Exchanges the pixels of `other` with the region of `self` at `top_left`.
    ///
    /// `other` must fit inside `self` at that position.
    pub fn swap_region(&mut self, other: &mut PixelBuffer, top_left: PixelPoint) -> Result<(), PixelError> {
        let rect = PixelRect::new(top_left.x, top_left.y, other.width as i32, other.height as i32);
        if rect.is_empty() || !self.rect().contains_rect(&rect) {
            return Err(PixelError::OutOfBounds {
                rect,
                width: self.width,
                height: self.height,
            });
        }

        let other_width = other.width as usize;
        for (row_index, y) in (rect.top()..=rect.bottom()).enumerate() {
            let start = row_index * other_width;
            let theirs = &mut other.pixels[start..start + other_width];
            let ours = &mut self.row_mut(y as u32)[rect.left() as usize..=rect.right() as usize];
            ours.swap_with_slice(theirs);
        }
        Ok(())
    }

    pub fn from_rgba_image(image: &image::RgbaImage) -> Result<Self, PixelError> {
        let (width, height) = image.dimensions();
        Self::from_fn(width, height, |x, y| Color::from(*image.get_pixel(x, y)))
    }

    pub fn to_rgba_image(&self) -> image::RgbaImage {
        image::RgbaImage::from_fn(self.width, self.height, |x, y| {
            self.pixels[y as usize * self.width as usize + x as usize].into()
        })
    }

    /// Pixel data in the layout the host UI uploads as a texture.
    pub fn to_color_image(&self) -> egui::ColorImage {
        egui::ColorImage {
            size: [self.width as usize, self.height as usize],
            pixels: self.pixels.iter().map(|&c| egui::Color32::from(c)).collect(),
        }
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            None
        } else {
            Some(y as usize * self.width as usize + x as usize)
        }
    }
}

fn validate_dimensions(width: u32, height: u32) -> Result<(), PixelError> {
    if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
        Err(PixelError::InvalidDimensions {
            width,
            height,
            max: MAX_DIMENSION,
        })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(width: u32, height: u32) -> PixelBuffer {
        PixelBuffer::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                Color::BLACK
            } else {
                Color::WHITE
            }
        })
        .unwrap()
    }

    #[test]
    fn rejects_bad_dimensions() {
        assert!(PixelBuffer::new(0, 5, Color::WHITE).is_err());
        assert!(PixelBuffer::new(MAX_DIMENSION + 1, 5, Color::WHITE).is_err());
        assert!(PixelBuffer::from_pixels(2, 2, vec![Color::WHITE; 3]).is_err());
    }

    #[test]
    fn region_round_trips_through_set_region() {
        let source = checker(8, 6);
        let rect = PixelRect::new(2, 1, 3, 4);
        let region = source.region(rect).unwrap();
        assert_eq!(region.width(), 3);
        assert_eq!(region.pixel(0, 0), source.pixel(2, 1));

        let mut target = PixelBuffer::new(8, 6, Color::RED).unwrap();
        target.set_region(&region, rect.top_left());
        assert_eq!(target.pixel(4, 4), source.pixel(4, 4));
        assert_eq!(target.pixel(5, 4), Some(Color::RED));
    }

    #[test]
    fn region_outside_is_an_error() {
        let buffer = checker(4, 4);
        assert!(matches!(
            buffer.region(PixelRect::new(2, 2, 3, 1)),
            Err(PixelError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn set_region_clips() {
        let mut target = PixelBuffer::new(4, 4, Color::WHITE).unwrap();
        let patch = PixelBuffer::new(3, 3, Color::BLACK).unwrap();
        target.set_region(&patch, PixelPoint::new(-1, 2));
        assert_eq!(target.pixel(0, 2), Some(Color::BLACK));
        assert_eq!(target.pixel(1, 3), Some(Color::BLACK));
        assert_eq!(target.pixel(2, 3), Some(Color::WHITE));
    }

    #[test]
    fn swap_region_exchanges_pixels() {
        let mut target = PixelBuffer::new(4, 4, Color::WHITE).unwrap();
        let mut patch = PixelBuffer::new(2, 2, Color::BLACK).unwrap();
        target.swap_region(&mut patch, PixelPoint::new(1, 1)).unwrap();
        assert_eq!(target.pixel(1, 1), Some(Color::BLACK));
        assert_eq!(patch.pixel(0, 0), Some(Color::WHITE));
        target.swap_region(&mut patch, PixelPoint::new(1, 1)).unwrap();
        assert_eq!(target, PixelBuffer::new(4, 4, Color::WHITE).unwrap());
    }

    #[test]
    fn image_conversion_quantizes_alpha() {
        let mut image = image::RgbaImage::new(2, 1);
        image.put_pixel(0, 0, image::Rgba([10, 20, 30, 200]));
        image.put_pixel(1, 0, image::Rgba([10, 20, 30, 40]));
        let buffer = PixelBuffer::from_rgba_image(&image).unwrap();
        assert_eq!(buffer.pixel(0, 0), Some(Color::rgb(10, 20, 30)));
        assert_eq!(buffer.pixel(1, 0), Some(Color::Transparent));
        assert_eq!(buffer.to_rgba_image().get_pixel(1, 0).0[3], 0);
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// A pixel value. Either fully opaque RGB or fully transparent; partial alpha does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    Opaque { r: u8, g: u8, b: u8 },
    Transparent,
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 255, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color::Opaque { r, g, b }
    }

    pub fn is_opaque(&self) -> bool {
        matches!(self, Color::Opaque { .. })
    }

    pub fn is_transparent(&self) -> bool {
        matches!(self, Color::Transparent)
    }

    /// RGB channels, `None` when transparent.
    pub fn channels(&self) -> Option<(u8, u8, u8)> {
        match *self {
            Color::Opaque { r, g, b } => Some((r, g, b)),
            Color::Transparent => None,
        }
    }

    /// Applies `f` to the RGB channels of an opaque color; transparent stays transparent.
    pub fn map_rgb(self, f: impl FnOnce(u8, u8, u8) -> (u8, u8, u8)) -> Color {
        match self {
            Color::Opaque { r, g, b } => {
                let (r, g, b) = f(r, g, b);
                Color::rgb(r, g, b)
            }
            Color::Transparent => Color::Transparent,
        }
    }

    /// Perceptual gray level (0-255) of an opaque color.
    pub fn gray(&self) -> Option<u8> {
        self.channels()
            .map(|(r, g, b)| ((r as u32 * 11 + g as u32 * 16 + b as u32 * 5) / 32) as u8)
    }

    /// `processed` is a cube distance from [`ColorSimilarity::processed`].
    ///
    /// Transparency only ever matches transparency. Zero means exact equality.
    pub fn is_similar(&self, other: &Color, processed: i32) -> bool {
        match (self.channels(), other.channels()) {
            (None, None) => true,
            (Some(_), None) | (None, Some(_)) => false,
            (Some(a), Some(b)) => {
                if processed <= 0 {
                    return a == b;
                }
                let dr = a.0 as i32 - b.0 as i32;
                let dg = a.1 as i32 - b.1 as i32;
                let db = a.2 as i32 - b.2 as i32;
                dr * dr + dg * dg + db * db <= processed * processed
            }
        }
    }
}

impl From<egui::Color32> for Color {
    fn from(color: egui::Color32) -> Self {
        if color.a() < 128 {
            Color::Transparent
        } else {
            let [r, g, b, _] = color.to_srgba_unmultiplied();
            Color::rgb(r, g, b)
        }
    }
}

impl From<Color> for egui::Color32 {
    fn from(color: Color) -> Self {
        match color {
            Color::Opaque { r, g, b } => egui::Color32::from_rgb(r, g, b),
            Color::Transparent => egui::Color32::TRANSPARENT,
        }
    }
}

impl From<image::Rgba<u8>> for Color {
    fn from(pixel: image::Rgba<u8>) -> Self {
        let [r, g, b, a] = pixel.0;
        if a < 128 {
            Color::Transparent
        } else {
            Color::rgb(r, g, b)
        }
    }
}

impl From<Color> for image::Rgba<u8> {
    fn from(color: Color) -> Self {
        match color {
            Color::Opaque { r, g, b } => image::Rgba([r, g, b, 255]),
            Color::Transparent => image::Rgba([0, 0, 0, 0]),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Opaque { r, g, b } => write!(f, "#{r:02x}{g:02x}{b:02x}"),
            Color::Transparent => write!(f, "transparent"),
        }
    }
}

/// Length of the diagonal of the RGB color cube, `sqrt(3 * 255^2)`.
const COLOR_CUBE_DIAGONAL: f64 = 441.672_955_930_063_7;

/// A color tolerance as a fraction of the RGB cube diagonal, in `0.0..=0.30`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(from = "f64")]
pub struct ColorSimilarity(f64);

impl From<f64> for ColorSimilarity {
    fn from(similarity: f64) -> Self {
        Self::new(similarity)
    }
}

impl ColorSimilarity {
    pub const EXACT: ColorSimilarity = ColorSimilarity(0.0);
    pub const MAX: ColorSimilarity = ColorSimilarity(0.30);

    /// Clamps into the supported range.
    pub fn new(similarity: f64) -> Self {
        if similarity.is_nan() {
            return Self::EXACT;
        }
        Self(similarity.clamp(Self::EXACT.0, Self::MAX.0))
    }

    /// From a whole percentage, e.g. `5` for 5%.
    pub fn from_percent(percent: u32) -> Self {
        Self::new(percent as f64 / 100.0)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn is_exact(&self) -> bool {
        self.processed() == 0
    }

    /// The tolerance expressed as an RGB cube distance.
    pub fn processed(&self) -> i32 {
        (self.0 * COLOR_CUBE_DIAGONAL + 0.5) as i32
    }
}

impl fmt::Display for ColorSimilarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_exact() {
            write!(f, "Exact")
        } else {
            write!(f, "{}%", (self.0 * 100.0).round() as i32)
        }
    }
}

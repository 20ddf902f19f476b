use serde::{Deserialize, Serialize};
use crate::color::Color;
use crate::document::Document;
use crate::pixel_buffer::PixelBuffer;
use super::{CommandError, CommandResult, PixelSnapshot, selection_prefixed, target_buffer, target_changed};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ReduceColorsMode {
    #[default]
    Monochrome,
    MonochromeDithered,
    /// 3-3-2 bit palette.
    Colors256,
}

/// A per-pixel color transformation. Transparent pixels stay transparent (except `Clear`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ColorEffect {
    Invert { red: bool, green: bool, blue: bool },
    Grayscale,
    /// Negative blurs, positive sharpens, `-10..=10`.
    BlurSharpen { strength: i32 },
    /// Each in `-50..=50`.
    Balance { brightness: i32, contrast: i32, gamma: i32 },
    /// Maps gray levels onto the gradient `first` (black) -> `second` (white).
    Flatten { first: Color, second: Color },
    /// Hue in degrees, saturation and value in percent (`-100..=100`).
    HsvAdjust { hue: i32, saturation: i32, value: i32 },
    ReduceColors(ReduceColorsMode),
    Clear(Color),
}

impl ColorEffect {
    pub const INVERT_ALL: ColorEffect = ColorEffect::Invert {
        red: true,
        green: true,
        blue: true,
    };

    pub fn name(&self) -> &'static str {
        match self {
            ColorEffect::Invert { red: true, green: true, blue: true } => "Invert Colors",
            ColorEffect::Invert { .. } => "Invert",
            ColorEffect::Grayscale => "Reduce to Grayscale",
            ColorEffect::BlurSharpen { strength } if *strength < 0 => "Soften",
            ColorEffect::BlurSharpen { .. } => "Sharpen",
            ColorEffect::Balance { .. } => "Balance",
            ColorEffect::Flatten { .. } => "Flatten",
            ColorEffect::HsvAdjust { .. } => "Hue, Saturation, Value",
            ColorEffect::ReduceColors(ReduceColorsMode::Monochrome) => "Reduce to Monochrome",
            ColorEffect::ReduceColors(ReduceColorsMode::MonochromeDithered) => "Reduce to Monochrome (Dithered)",
            ColorEffect::ReduceColors(ReduceColorsMode::Colors256) => "Reduce to 256 Colors",
            ColorEffect::Clear(_) => "Clear",
        }
    }

    /// `true` when applying the effect twice yields the original (`f(f(x)) == x`).
    pub fn is_invertible(&self) -> bool {
        matches!(self, ColorEffect::Invert { .. })
    }

    pub fn apply(&self, buffer: &mut PixelBuffer) {
        match *self {
            ColorEffect::Invert { red, green, blue } => map_pixels(buffer, |c| {
                c.map_rgb(|r, g, b| {
                    (
                        if red { 255 - r } else { r },
                        if green { 255 - g } else { g },
                        if blue { 255 - b } else { b },
                    )
                })
            }),
            ColorEffect::Grayscale => map_pixels(buffer, |c| match c.gray() {
                Some(gray) => Color::rgb(gray, gray, gray),
                None => c,
            }),
            ColorEffect::BlurSharpen { strength } => blur_sharpen(buffer, strength),
            ColorEffect::Balance { brightness, contrast, gamma } => {
                let table = balance_table(brightness, contrast, gamma);
                map_pixels(buffer, |c| {
                    c.map_rgb(|r, g, b| (table[r as usize], table[g as usize], table[b as usize]))
                });
            }
            ColorEffect::Flatten { first, second } => {
                let from = first.channels().unwrap_or((0, 0, 0));
                let to = second.channels().unwrap_or((255, 255, 255));
                map_pixels(buffer, |c| match c.gray() {
                    Some(gray) => Color::rgb(
                        lerp(from.0, to.0, gray),
                        lerp(from.1, to.1, gray),
                        lerp(from.2, to.2, gray),
                    ),
                    None => c,
                });
            }
            ColorEffect::HsvAdjust { hue, saturation, value } => {
                map_pixels(buffer, |c| c.map_rgb(|r, g, b| adjust_hsv(r, g, b, hue, saturation, value)));
            }
            ColorEffect::ReduceColors(mode) => reduce_colors(buffer, mode),
            ColorEffect::Clear(color) => buffer.fill(color),
        }
    }
}

/// Applies a [`ColorEffect`] to the document or to the selection's content.
#[derive(Debug)]
pub struct EffectCommand {
    effect: ColorEffect,
    act_on_selection: bool,
    before: Option<PixelSnapshot>,
    executed: bool,
}

impl EffectCommand {
    pub fn new(effect: ColorEffect, act_on_selection: bool) -> Self {
        Self {
            effect,
            act_on_selection,
            before: None,
            executed: false,
        }
    }

    pub fn effect(&self) -> &ColorEffect {
        &self.effect
    }

    pub fn name(&self) -> String {
        selection_prefixed(self.effect.name(), self.act_on_selection)
    }

    pub fn is_invertible(&self) -> bool {
        self.effect.is_invertible()
    }

    pub fn acts_on_selection(&self) -> bool {
        self.act_on_selection
    }

    pub fn size_bytes(&self) -> usize {
        self.before.as_ref().map_or(0, PixelSnapshot::size_bytes)
    }

    pub fn execute(&mut self, document: &mut Document) -> CommandResult {
        let buffer = target_buffer(document, self.act_on_selection)?;
        if !self.effect.is_invertible() {
            self.before = Some(PixelSnapshot::capture_all(buffer));
        }
        self.effect.apply(buffer);
        let rect = buffer.rect();

        self.executed = true;
        target_changed(document, self.act_on_selection, rect);
        Ok(())
    }

    pub fn unexecute(&mut self, document: &mut Document) -> CommandResult {
        if !self.executed {
            log::warn!("Undo of \"{}\" before it was executed", self.name());
            return Err(CommandError::NotExecuted(self.name()));
        }

        let buffer = target_buffer(document, self.act_on_selection)?;
        if self.effect.is_invertible() {
            self.effect.apply(buffer);
        } else {
            let Some(before) = self.before.take() else {
                return Err(CommandError::NotExecuted(self.name()));
            };
            before.restore_into(buffer);
        }
        let rect = buffer.rect();

        self.executed = false;
        target_changed(document, self.act_on_selection, rect);
        Ok(())
    }
}

fn map_pixels(buffer: &mut PixelBuffer, f: impl Fn(Color) -> Color) {
    for y in 0..buffer.height() {
        for pixel in buffer.row_mut(y) {
            *pixel = f(*pixel);
        }
    }
}

fn lerp(from: u8, to: u8, t: u8) -> u8 {
    (from as i32 + (to as i32 - from as i32) * t as i32 / 255) as u8
}

fn blur_sharpen(buffer: &mut PixelBuffer, strength: i32) {
    let strength = strength.clamp(-10, 10);
    if strength == 0 {
        return;
    }

    let sigma = strength.abs() as f32 * 0.5;
    let source = buffer.to_rgba_image();
    let processed = if strength < 0 {
        image::imageops::blur(&source, sigma)
    } else {
        image::imageops::unsharpen(&source, sigma, 0)
    };

    for y in 0..buffer.height() {
        let row = buffer.row_mut(y);
        for (x, pixel) in row.iter_mut().enumerate() {
            if pixel.is_opaque() {
                let [r, g, b, _] = processed.get_pixel(x as u32, y).0;
                *pixel = Color::rgb(r, g, b);
            }
        }
    }
}

/// Lookup table for brightness, then contrast around mid-gray, then gamma.
fn balance_table(brightness: i32, contrast: i32, gamma: i32) -> [u8; 256] {
    let brightness = brightness.clamp(-50, 50) as f64 * 255.0 / 100.0;
    let contrast = (100.0 + contrast.clamp(-50, 50) as f64 * 2.0) / 100.0;
    let gamma = 10f64.powf(gamma.clamp(-50, 50) as f64 / 50.0);

    let mut table = [0u8; 256];
    for (i, entry) in table.iter_mut().enumerate() {
        let mut v = i as f64 + brightness;
        v = (v - 127.5) * contrast + 127.5;
        v = v.clamp(0.0, 255.0);
        v = 255.0 * (v / 255.0).powf(1.0 / gamma);
        *entry = v.round().clamp(0.0, 255.0) as u8;
    }
    table
}

fn adjust_hsv(r: u8, g: u8, b: u8, hue: i32, saturation: i32, value: i32) -> (u8, u8, u8) {
    let (h, s, v) = rgb_to_hsv(r, g, b);
    let h = (h + hue as f32).rem_euclid(360.0);
    let s = (s * (1.0 + saturation.clamp(-100, 100) as f32 / 100.0)).clamp(0.0, 1.0);
    let v = (v * (1.0 + value.clamp(-100, 100) as f32 / 100.0)).clamp(0.0, 1.0);
    hsv_to_rgb(h, s, v)
}

fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let (r, g, b) = (r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let s = if max == 0.0 { 0.0 } else { delta / max };
    (h, s, max)
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (u8, u8, u8) {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0).rem_euclid(2.0) - 1.0).abs());
    let m = v - c;
    let (r, g, b) = match (h / 60.0) as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let to_byte = |f: f32| ((f + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    (to_byte(r), to_byte(g), to_byte(b))
}

fn reduce_colors(buffer: &mut PixelBuffer, mode: ReduceColorsMode) {
    match mode {
        ReduceColorsMode::Monochrome => map_pixels(buffer, |c| match c.gray() {
            Some(gray) if gray >= 128 => Color::WHITE,
            Some(_) => Color::BLACK,
            None => c,
        }),
        ReduceColorsMode::MonochromeDithered => dither_monochrome(buffer),
        ReduceColorsMode::Colors256 => map_pixels(buffer, |c| {
            c.map_rgb(|r, g, b| (quantize(r, 7), quantize(g, 7), quantize(b, 3)))
        }),
    }
}

fn quantize(channel: u8, levels: u32) -> u8 {
    let level = (channel as u32 * levels + 127) / 255;
    (level * 255 / levels) as u8
}

/// Floyd-Steinberg error diffusion on the gray level. Transparent pixels neither receive
/// nor spread error.
fn dither_monochrome(buffer: &mut PixelBuffer) {
    let width = buffer.width() as usize;
    let mut errors = vec![0i32; width + 2];
    let mut next_errors = vec![0i32; width + 2];

    for y in 0..buffer.height() {
        let row = buffer.row_mut(y);
        for (x, pixel) in row.iter_mut().enumerate() {
            let Some(gray) = pixel.gray() else {
                continue;
            };
            let wanted = gray as i32 + errors[x + 1] / 16;
            let (out, actual) = if wanted >= 128 {
                (Color::WHITE, 255)
            } else {
                (Color::BLACK, 0)
            };
            let error = wanted - actual;
            *pixel = out;

            errors[x + 2] += error * 7;
            next_errors[x] += error * 3;
            next_errors[x + 1] += error * 5;
            next_errors[x + 2] += error;
        }
        std::mem::swap(&mut errors, &mut next_errors);
        next_errors.fill(0);
    }
}

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use crate::color::{Color, ColorSimilarity};
use crate::command::{
    BrushShape, ColorEffect, FlowTool, HistoryLimits, ReduceColorsMode, ResizeScaleMode, Transform,
};
use crate::selection::SelectionTransparency;

/// Errors that can occur while loading, saving or validating settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to (de)serialize settings: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to access settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid setting: {0}")]
    InvalidValue(String),
}

/// Result type for settings operations
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Caller-owned preferences and the "last used" values of every dialog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub history: HistoryLimits,

    pub foreground: Color,
    pub background: Color,
    pub fill_similarity: ColorSimilarity,
    pub selection_transparency: SelectionTransparency,

    pub brush_width: u32,
    pub brush_shape: BrushShape,
    pub eraser_width: u32,
    pub color_washer_width: u32,
    pub airbrush_diameter: u32,
    pub airbrush_dots_per_spray: u32,

    pub last_flip: (bool, bool),
    pub last_rotate_degrees: f32,
    pub last_skew_degrees: (f32, f32),
    pub last_resize_mode: ResizeScaleMode,
    pub last_resize_keep_aspect: bool,
    pub last_flatten: (Color, Color),
    pub last_reduce_colors: ReduceColorsMode,
    /// Brightness, contrast, gamma
    pub last_balance: (i32, i32, i32),
    /// Hue, saturation, value
    pub last_hsv: (i32, i32, i32),
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            history: HistoryLimits::default(),
            foreground: Color::BLACK,
            background: Color::WHITE,
            fill_similarity: ColorSimilarity::EXACT,
            selection_transparency: SelectionTransparency::default(),
            brush_width: 4,
            brush_shape: BrushShape::Circle,
            eraser_width: 9,
            color_washer_width: 9,
            airbrush_diameter: 9,
            airbrush_dots_per_spray: 10,
            last_flip: (true, false),
            last_rotate_degrees: 90.0,
            last_skew_degrees: (0.0, 0.0),
            last_resize_mode: ResizeScaleMode::Resize,
            last_resize_keep_aspect: false,
            last_flatten: (Color::BLACK, Color::WHITE),
            last_reduce_colors: ReduceColorsMode::Monochrome,
            last_balance: (0, 0, 0),
            last_hsv: (0, 0, 0),
        }
    }
}

const MAX_TOOL_WIDTH: u32 = 256;

impl Settings {
    /// Loads settings from a JSON file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> SettingsResult<Self> {
        let path = path.as_ref();
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No settings at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(err) => return Err(err.into()),
        };

        let mut settings: Settings = serde_json::from_str(&json)?;
        settings.validate()?;
        log::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Saves settings as pretty-printed JSON, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> SettingsResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::debug!("Saved settings to {}", path.display());
        Ok(())
    }

    /// Clamps recoverable values into range; rejects values that have no sensible fix.
    pub fn validate(&mut self) -> SettingsResult<()> {
        if self.history.undo_max_limit == 0 {
            return Err(SettingsError::InvalidValue("undo_max_limit must be at least 1".into()));
        }
        self.history = self.history.normalized();

        let similarity = self.fill_similarity.value();
        self.fill_similarity = ColorSimilarity::new(similarity);
        if self.fill_similarity.value() != similarity {
            log::warn!("Fill similarity {} out of range, using {}", similarity, self.fill_similarity);
        }
        let transparency = &mut self.selection_transparency;
        transparency.similarity = ColorSimilarity::new(transparency.similarity.value());

        for (name, width) in [
            ("brush_width", &mut self.brush_width),
            ("eraser_width", &mut self.eraser_width),
            ("color_washer_width", &mut self.color_washer_width),
            ("airbrush_diameter", &mut self.airbrush_diameter),
        ] {
            if *width == 0 || *width > MAX_TOOL_WIDTH {
                return Err(SettingsError::InvalidValue(format!(
                    "{name} must be in 1..={MAX_TOOL_WIDTH}, got {width}"
                )));
            }
        }
        self.airbrush_dots_per_spray = self.airbrush_dots_per_spray.max(1);
        Ok(())
    }

    pub fn brush(&self) -> FlowTool {
        FlowTool::Brush {
            width: self.brush_width,
            shape: self.brush_shape,
        }
    }

    pub fn eraser(&self) -> FlowTool {
        FlowTool::Eraser {
            width: self.eraser_width,
        }
    }

    /// Replaces the foreground color with the background color.
    pub fn color_washer(&self) -> FlowTool {
        FlowTool::ColorWasher {
            width: self.color_washer_width,
            color_to_replace: self.foreground,
            similarity: self.fill_similarity,
        }
    }

    pub fn airbrush(&self) -> FlowTool {
        FlowTool::Airbrush {
            diameter: self.airbrush_diameter,
            dots_per_spray: self.airbrush_dots_per_spray,
        }
    }

    pub fn last_flip_transform(&self) -> Transform {
        Transform::Flip {
            horizontal: self.last_flip.0,
            vertical: self.last_flip.1,
        }
    }

    pub fn last_rotate_transform(&self) -> Transform {
        Transform::Rotate {
            degrees: self.last_rotate_degrees,
        }
    }

    pub fn last_skew_transform(&self) -> Transform {
        Transform::Skew {
            horizontal_degrees: self.last_skew_degrees.0,
            vertical_degrees: self.last_skew_degrees.1,
        }
    }

    pub fn last_flatten_effect(&self) -> ColorEffect {
        ColorEffect::Flatten {
            first: self.last_flatten.0,
            second: self.last_flatten.1,
        }
    }

    pub fn last_balance_effect(&self) -> ColorEffect {
        let (brightness, contrast, gamma) = self.last_balance;
        ColorEffect::Balance {
            brightness,
            contrast,
            gamma,
        }
    }

    pub fn last_hsv_effect(&self) -> ColorEffect {
        let (hue, saturation, value) = self.last_hsv;
        ColorEffect::HsvAdjust { hue, saturation, value }
    }

    /// Remembers the parameters of an applied transform for the next time its dialog opens.
    pub fn remember_transform(&mut self, transform: &Transform) {
        match *transform {
            Transform::Flip { horizontal, vertical } => self.last_flip = (horizontal, vertical),
            Transform::Rotate { degrees } => self.last_rotate_degrees = degrees,
            Transform::Skew {
                horizontal_degrees,
                vertical_degrees,
            } => self.last_skew_degrees = (horizontal_degrees, vertical_degrees),
            Transform::ResizeScale { mode, .. } => self.last_resize_mode = mode,
        }
    }

    /// Remembers the parameters of an applied effect for the next time its dialog opens.
    pub fn remember_effect(&mut self, effect: &ColorEffect) {
        match *effect {
            ColorEffect::Flatten { first, second } => self.last_flatten = (first, second),
            ColorEffect::ReduceColors(mode) => self.last_reduce_colors = mode,
            ColorEffect::Balance {
                brightness,
                contrast,
                gamma,
            } => self.last_balance = (brightness, contrast, gamma),
            ColorEffect::HsvAdjust { hue, saturation, value } => self.last_hsv = (hue, saturation, value),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("raster_paint_{}_{}.json", name, uuid::Uuid::new_v4()))
    }

    #[test]
    fn missing_file_gives_defaults() {
        let settings = Settings::load(temp_path("missing")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn save_then_load() {
        let path = temp_path("roundtrip");
        let mut settings = Settings::default();
        settings.foreground = Color::RED;
        settings.remember_effect(&ColorEffect::ReduceColors(ReduceColorsMode::Colors256));
        settings.save(&path).unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded.foreground, Color::RED);
        assert_eq!(loaded.last_reduce_colors, ReduceColorsMode::Colors256);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let settings: Settings = serde_json::from_str(r#"{ "brush_width": 12 }"#).unwrap();
        assert_eq!(settings.brush_width, 12);
        assert_eq!(settings.history, HistoryLimits::default());
    }

    #[test]
    fn validate_clamps_similarity_and_rejects_zero_width() {
        let mut settings = Settings {
            fill_similarity: serde_json::from_str("0.9").unwrap(),
            ..Settings::default()
        };
        settings.validate().unwrap();
        assert_eq!(settings.fill_similarity, ColorSimilarity::MAX);

        settings.eraser_width = 0;
        assert!(matches!(settings.validate(), Err(SettingsError::InvalidValue(_))));
    }

    #[test]
    fn zero_undo_limit_is_rejected() {
        let mut settings = Settings::default();
        settings.history.undo_max_limit = 0;
        assert!(settings.validate().is_err());
    }
}

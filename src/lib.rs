#![warn(clippy::all, rust_2018_idioms)]

pub mod color;
pub mod command;
pub mod document;
pub mod error;
pub mod event;
pub mod flood_fill;
pub mod geometry;
pub mod pixel_buffer;
pub mod selection;
pub mod state;
pub mod tools;

pub use color::{Color, ColorSimilarity};
pub use command::{Command, CommandError, CommandHistory, CommandResult};
pub use document::Document;
pub use error::{FillError, PixelError};
pub use flood_fill::FloodFill;
pub use geometry::{PixelPoint, PixelRect};
pub use pixel_buffer::PixelBuffer;
pub use selection::Selection;
pub use state::{Editor, EditorState, Settings};
pub use tools::{Tool, ToolType};

/// Installs `env_logger` (configured through `RUST_LOG`). A second call is a no-op.
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging() {
    if env_logger::try_init().is_err() {
        log::debug!("Logger already initialized");
    }
}

/// Logging is left to the host on the web.
#[cfg(target_arch = "wasm32")]
pub fn init_logging() {}

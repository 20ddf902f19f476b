mod editor;
mod editor_state;
mod settings;

pub use editor::{Editor, ToolKind};
pub use editor_state::EditorState;
pub use settings::{Settings, SettingsError, SettingsResult};

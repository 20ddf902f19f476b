/// Whether a tool gesture is between pointer down and pointer up.
///
/// ```text
///  ┌──────┐  pointer down   ┌────────────────────┐
///  │ Idle ├────────────────►│ CommandInProgress  │
///  │      │◄────────────────┤                    │
///  └──────┘  up / cancel    └────────────────────┘
/// ```
///
/// Undo, redo, tool switches and menu commands issued while a command is in progress cancel
/// it first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorState {
    /// No active operation
    #[default]
    Idle,
    /// A tool is drawing live; nothing is in the history for it yet
    CommandInProgress { tool: &'static str },
}

impl EditorState {
    /// Returns true if the editor is currently in an idle state
    pub fn is_idle(&self) -> bool {
        matches!(self, EditorState::Idle)
    }

    /// Name of the tool whose gesture is in progress
    pub fn tool_in_progress(&self) -> Option<&'static str> {
        match self {
            EditorState::CommandInProgress { tool } => Some(tool),
            EditorState::Idle => None,
        }
    }
}

use crate::document::Document;
use crate::tools::Tool;

/// What undo/redo needs to see: the document, and the active tool in case it is mid-shape.
pub struct CommandContext<'a> {
    /// The document being edited
    pub document: &'a mut Document,
    /// The current tool, if any
    pub active_tool: Option<&'a mut dyn Tool>,
}

impl<'a> CommandContext<'a> {
    pub fn new(document: &'a mut Document) -> Self {
        Self {
            document,
            active_tool: None,
        }
    }

    pub fn with_tool(document: &'a mut Document, tool: &'a mut dyn Tool) -> Self {
        Self {
            document,
            active_tool: Some(tool),
        }
    }

    /// Cancels the tool's in-progress shape. Returns `true` if there was one.
    pub(crate) fn cancel_shape_in_progress(&mut self) -> bool {
        match self.active_tool.as_deref_mut() {
            Some(tool) if tool.has_begun_shape() => {
                log::info!("Cancelling {} shape in progress", tool.name());
                tool.cancel_shape(self.document);
                true
            }
            _ => false,
        }
    }
}

impl std::fmt::Debug for CommandContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandContext")
            .field("document", &self.document.id())
            .field("active_tool", &self.active_tool.as_ref().map(|t| t.name()))
            .finish()
    }
}

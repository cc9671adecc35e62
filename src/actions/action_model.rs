use serde::{Deserialize, Serialize};

pub const DEFAULT_ACTION_COLOR: &str = "primary";

/// A submit, cancel or custom button, normalized from any of the accepted
/// encodings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDescriptor {
    pub id: String,

    /// `None` only for object entries that omit `label`.
    pub label: Option<String>,

    pub color: String,

    /// Only object entries can carry this; primitive and pair entries
    /// always leave it unset.
    pub cancel: Option<bool>,
}

impl ActionDescriptor {
    /// Text for the button, falling back to the id.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }

    pub fn is_cancel(&self) -> bool {
        self.cancel == Some(true)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ActionError {
    #[error("actions must be a list")]
    NotAList,

    #[error("action #{index} has no id")]
    MissingActionId { index: usize },
}

/// Failures while turning a layout description into a control tree.
///
/// Any of these aborts the whole compilation pass; no partial tree is
/// ever handed back.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    /// A leaf declared a `type` with no matching control.
    #[error("no control for type '{type_name}' at {path}")]
    UnsupportedControlType { type_name: String, path: String },

    /// A leaf has no usable string id.
    #[error("missing field id at {path}")]
    MissingFieldId { path: String },

    /// Two nodes of the same tree would share an id.
    #[error("duplicate field id '{id}'")]
    DuplicateFieldId { id: String },

    /// A radio or choice leaf without a `choices` list.
    #[error("field '{id}' at {path} has no choices")]
    MissingChoices { id: String, path: String },

    /// Input that matches none of the permitted encodings.
    #[error("invalid layout at {path}: {reason}")]
    InvalidLayout { path: String, reason: String },
}

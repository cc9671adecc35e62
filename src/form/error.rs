use crate::{
    actions::action_model::ActionError, data::flatten::FlattenError, layout::error::CompileError,
    transport::error::TransportError,
};

#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Flatten(#[from] FlattenError),

    #[error(transparent)]
    Actions(#[from] ActionError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("form has no compiled layout yet")]
    NotCompiled,

    #[error("no transport to load the {0} from")]
    NoTransport(&'static str),
}

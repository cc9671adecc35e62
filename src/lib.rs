//! Server-described forms: compile a declarative layout into a control
//! tree, flatten edited values back into the flat record the server
//! expects, and route the server's per-field errors onto the right
//! controls exactly once.

pub mod actions;
pub mod cli;
pub mod control;
pub mod data;
pub mod form;
pub mod layout;
pub mod trace;
pub mod transport;

pub use crate::{
    actions::{action_model::ActionDescriptor, normalize::normalize_actions},
    control::{
        control_model::{ControlNode, ControlTree},
        correlator::ExternalErrorMap,
    },
    data::{
        flatten::{SubmissionRecord, flatten},
        initial_data::{push_initial_data, unflatten},
    },
    form::{error::FormError, form_model::FormConfig, session::FormSession},
    layout::{compiler::compile_layout, error::CompileError},
};

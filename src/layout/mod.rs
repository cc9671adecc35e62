pub mod compiler;
pub mod error;
pub mod layout_model;
pub mod normalize;

pub mod flatten;
pub mod initial_data;
